//! Chapter-break planning.
//!
//! [`ChapterDecider`] walks the units once, front to back, keeping a running
//! word count for the chapter being built. Each unit is scored against the
//! unit immediately before it; the score and the running count decide
//! whether the unit opens a new chapter. There is no backtracking, so a good
//! break point that arrives before the minimum length is reached is simply
//! passed over.
//!
//! ## Scoring
//!
//! | Signal (relative to the previous unit) | Points |
//! |---|---|
//! | Different act | 5 |
//! | Previous unit was a sequel | 3 |
//! | Gap of 12 hours or more | 4 |
//! | Gap of more than 6 hours | 2 |
//! | Different point of view | 3 |
//! | Different location | 2 |
//! | Different story day | 2 |

mod title;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::SceneSequel;

pub use title::title_from_act;

/// Score at which a break is taken once the minimum length is reached.
pub const STRONG_BREAK_SCORE: u32 = 8;

/// Score at which a break is taken once the chapter nears its target.
pub const GOOD_BREAK_SCORE: u32 = 5;

/// Fraction of the target length after which good break points are taken.
const TARGET_FRACTION: f64 = 0.8;

pub const REASON_STORY_START: &str = "story_start";
pub const REASON_MANUAL: &str = "manual_break";

/// How chapters are presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStyle {
    /// "Chapter 1", "Chapter 2", ...
    #[default]
    Numbered,
    /// Numbered, with a title taken from the owning act.
    Titled,
    /// Bare section numerals.
    Sections,
    /// One continuous text with no chapters.
    None,
}

/// Length targets, in words.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterPolicy {
    pub target_chapter_length: usize,
    pub min_chapter_length: usize,
    pub max_chapter_length: usize,
}

impl Default for ChapterPolicy {
    fn default() -> Self {
        Self {
            target_chapter_length: 3000,
            min_chapter_length: 1500,
            max_chapter_length: 5000,
        }
    }
}

impl ChapterPolicy {
    pub fn new(target: usize, min: usize, max: usize) -> Self {
        Self {
            target_chapter_length: target,
            min_chapter_length: min,
            max_chapter_length: max,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chapter_length == 0 {
            return Err(Error::InvalidPolicy(
                "max_chapter_length must be positive".to_string(),
            ));
        }
        if self.min_chapter_length > self.max_chapter_length {
            return Err(Error::InvalidPolicy(format!(
                "min_chapter_length {} exceeds max_chapter_length {}",
                self.min_chapter_length, self.max_chapter_length
            )));
        }
        Ok(())
    }
}

/// A decision that a new chapter starts at `unit_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterBreak {
    pub unit_id: String,
    /// 1-based.
    pub chapter: u32,
    pub title: Option<String>,
    pub reason: String,
}

/// Plans chapter breaks over an ordered list of units.
#[derive(Debug, Clone, Default)]
pub struct ChapterDecider {
    policy: ChapterPolicy,
}

impl ChapterDecider {
    pub fn new(policy: ChapterPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ChapterPolicy {
        &self.policy
    }

    /// Decide where chapters start.
    ///
    /// Returns one [`ChapterBreak`] per chapter, in order. `ChapterStyle::None`
    /// and empty input both yield an empty list. Units listed in
    /// `forced_breaks`, or whose hints request it, always open a chapter.
    pub fn decide(
        &self,
        units: &[SceneSequel],
        style: ChapterStyle,
        forced_breaks: &HashSet<String>,
    ) -> Vec<ChapterBreak> {
        if style == ChapterStyle::None {
            return Vec::new();
        }
        let Some(first) = units.first() else {
            return Vec::new();
        };

        let mut breaks = vec![ChapterBreak {
            unit_id: first.id.clone(),
            chapter: 1,
            title: chapter_title(first, style),
            reason: REASON_STORY_START.to_string(),
        }];
        let mut running = first.effective_word_count();

        let good_threshold = self.policy.target_chapter_length as f64 * TARGET_FRACTION;

        for pair in units.windows(2) {
            let (prev, unit) = (&pair[0], &pair[1]);
            let words = unit.effective_word_count();

            let reason = if unit.hints.force_break || forced_breaks.contains(&unit.id) {
                Some(REASON_MANUAL.to_string())
            } else {
                let score = break_score(prev, unit);
                if running + words > self.policy.max_chapter_length {
                    Some(format!(
                        "max length exceeded ({} words)",
                        running + words
                    ))
                } else if running >= self.policy.min_chapter_length
                    && score >= STRONG_BREAK_SCORE
                {
                    Some(format!("strong break point (score {score})"))
                } else if running as f64 >= good_threshold && score >= GOOD_BREAK_SCORE {
                    Some(format!("good break point (score {score})"))
                } else {
                    None
                }
            };

            match reason {
                Some(reason) => {
                    let chapter = breaks.len() as u32 + 1;
                    tracing::debug!(unit = %unit.id, chapter, %reason, "chapter break");
                    breaks.push(ChapterBreak {
                        unit_id: unit.id.clone(),
                        chapter,
                        title: chapter_title(unit, style),
                        reason,
                    });
                    running = words;
                }
                None => running += words,
            }
        }

        breaks
    }
}

/// How strongly the story shifts between `prev` and `unit`.
pub fn break_score(prev: &SceneSequel, unit: &SceneSequel) -> u32 {
    let mut score = 0;

    if prev.act != unit.act {
        score += 5;
    }
    if prev.is_sequel() {
        score += 3;
    }

    let gap = unit.start_hours - prev.end_hours();
    if gap >= 12.0 {
        score += 4;
    } else if gap > 6.0 {
        score += 2;
    }

    if changed(&prev.pov, &unit.pov) {
        score += 3;
    }
    if changed(&prev.location, &unit.location) {
        score += 2;
    }
    if prev.day_number() != unit.day_number() {
        score += 2;
    }

    score
}

/// Both sides specified and different.
pub(crate) fn changed(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    !a.is_empty() && !b.is_empty() && a != b
}

fn chapter_title(unit: &SceneSequel, style: ChapterStyle) -> Option<String> {
    if style != ChapterStyle::Titled {
        return None;
    }
    if let Some(title) = unit.hints.title.as_deref().map(str::trim)
        && !title.is_empty()
    {
        return Some(title.to_string());
    }
    let title = title_from_act(&unit.act);
    if title.is_empty() { None } else { Some(title) }
}
