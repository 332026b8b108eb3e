//! # novelpress
//!
//! Chapter planning and EPUB 3 packaging for machine-drafted novels.
//!
//! ## Features
//!
//! - Narrative model: percentage-weighted outlines and scene/sequel units
//! - Greedy chapter-break planning from story signals and word targets
//! - Inline Markdown emphasis to XHTML
//! - EPUB 3 packages with NCX fallback, landmarks and accessibility metadata
//! - A structural validator for finished packages
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::collections::HashSet;
//!
//! use novelpress::{
//!     ChapterDecider, ChapterStyle, Manuscript, MemoryStore, OutputTarget, PackageFormatter,
//!     PressConfig, SceneBeat, SceneSequel, StoryMetadata, validate,
//! };
//!
//! let story = StoryMetadata::default();
//! let units = vec![
//!     SceneSequel::scene("u1", "Act One", SceneBeat::new("escape", "the guard", "caught"))
//!         .with_content("She ran."),
//! ];
//!
//! let config = PressConfig::default();
//! let breaks = ChapterDecider::new(config.chapters.policy).decide(
//!     &units,
//!     ChapterStyle::Numbered,
//!     &HashSet::new(),
//! );
//!
//! let path = PackageFormatter::from_config(&config)
//!     .format(
//!         &Manuscript::new(&story, &units),
//!         &breaks,
//!         &OutputTarget::new("out"),
//!         Some("The Run"),
//!         &mut MemoryStore::new(),
//!     )
//!     .unwrap();
//!
//! assert!(validate(&path).valid);
//! ```

pub mod chapter;
pub mod config;
pub mod epub;
pub mod error;
pub mod format;
pub mod markdown;
pub mod model;
pub mod store;
pub mod title;

pub use chapter::{ChapterBreak, ChapterDecider, ChapterPolicy, ChapterStyle, break_score};
pub use config::{ChaptersConfig, PackageConfig, PressConfig};
pub use epub::{PublicationInfo, SceneBreakStyle, ValidationReport, validate};
pub use error::{Error, Result};
pub use format::{OutputTarget, PackageFormatter};
pub use model::{
    Act, ActBody, Beat, Character, Location, Manuscript, Outline, SceneBeat, SceneSequel,
    SequelBeat, StoryMetadata,
};
pub use store::{JsonFileStore, MemoryStore, StoreKey, TitleStore};
pub use title::{TitleGenerator, TitleSource};
