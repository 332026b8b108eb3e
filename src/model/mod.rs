//! Narrative data model.
//!
//! This module contains:
//! - The percentage-weighted outline (acts and sub-acts)
//! - Scene-sequel units with their derived timing
//! - Story, character and location records

mod outline;
mod story;
mod unit;

pub use outline::{Act, ActBody, Outline, PERCENT_TOLERANCE};
pub use story::{Character, Location, Manuscript, StoryMetadata};
pub use unit::{Beat, ChapterHints, SceneBeat, SceneSequel, SequelBeat, TimeOfDay};
