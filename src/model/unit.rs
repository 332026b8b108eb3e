//! Scene-sequel units: the atomic, timestamped records a story is written in.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One scene or sequel, with point of view, place and timing.
///
/// `start_hours` and `duration_hours` are authoritative; end time, day number
/// and time of day are always derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSequel {
    pub id: String,
    /// Title of the owning act.
    #[serde(default)]
    pub act: String,
    /// Point-of-view character.
    #[serde(default)]
    pub pov: String,
    /// Empty when unspecified.
    #[serde(default)]
    pub location: String,
    pub start_hours: f64,
    pub duration_hours: f64,
    #[serde(flatten)]
    pub beat: Beat,
    #[serde(default)]
    pub hints: ChapterHints,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub word_count: usize,
}

/// Type-specific payload, selected by the `type` discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Beat {
    Scene(SceneBeat),
    Sequel(SequelBeat),
}

/// Action beat: every field is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneBeat {
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub conflict: String,
    #[serde(default)]
    pub disaster: String,
}

/// Reflection beat: at least one field is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequelBeat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dilemma: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
}

/// Planner hints about chapter placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChapterHints {
    /// Always start a new chapter at this unit.
    #[serde(default)]
    pub force_break: bool,
    /// Preferred chapter title when this unit opens a chapter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Coarse time-of-day bucket derived from the hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeOfDay {
    Dawn,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Bucket for an hour of the day in `[0, 24)`.
    pub fn from_hour(hour: f64) -> Self {
        match hour {
            h if (5.0..8.0).contains(&h) => TimeOfDay::Dawn,
            h if (8.0..12.0).contains(&h) => TimeOfDay::Morning,
            h if (12.0..17.0).contains(&h) => TimeOfDay::Afternoon,
            h if (17.0..21.0).contains(&h) => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Dawn => "dawn",
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SceneSequel {
    /// Create a scene skeleton with empty content.
    pub fn scene(id: impl Into<String>, act: impl Into<String>, beat: SceneBeat) -> Self {
        Self::skeleton(id.into(), act.into(), Beat::Scene(beat))
    }

    /// Create a sequel skeleton with empty content.
    pub fn sequel(id: impl Into<String>, act: impl Into<String>, beat: SequelBeat) -> Self {
        Self::skeleton(id.into(), act.into(), Beat::Sequel(beat))
    }

    fn skeleton(id: String, act: String, beat: Beat) -> Self {
        Self {
            id,
            act,
            pov: String::new(),
            location: String::new(),
            start_hours: 0.0,
            duration_hours: 1.0,
            beat,
            hints: ChapterHints::default(),
            summary: String::new(),
            content: String::new(),
            word_count: 0,
        }
    }

    pub fn with_pov(mut self, pov: impl Into<String>) -> Self {
        self.pov = pov.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_timing(mut self, start_hours: f64, duration_hours: f64) -> Self {
        self.start_hours = start_hours;
        self.duration_hours = duration_hours;
        self
    }

    /// Fill in prose. The word count is taken from the text.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self.word_count = self.content.split_whitespace().count();
        self
    }

    pub fn with_word_count(mut self, word_count: usize) -> Self {
        self.word_count = word_count;
        self
    }

    pub fn with_forced_break(mut self) -> Self {
        self.hints.force_break = true;
        self
    }

    pub fn is_sequel(&self) -> bool {
        matches!(self.beat, Beat::Sequel(_))
    }

    pub fn end_hours(&self) -> f64 {
        self.start_hours + self.duration_hours
    }

    /// 1-based story day the unit starts on.
    pub fn day_number(&self) -> u32 {
        (self.start_hours / 24.0).floor() as u32 + 1
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_hour(self.start_hours.rem_euclid(24.0))
    }

    /// Stored word count, or a count of the content when none was recorded.
    pub fn effective_word_count(&self) -> usize {
        if self.word_count > 0 {
            self.word_count
        } else {
            self.content.split_whitespace().count()
        }
    }

    /// Reject units whose shape would produce a broken package.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::invalid_unit(&self.id, "missing id"));
        }
        if !self.start_hours.is_finite() || self.start_hours < 0.0 {
            return Err(Error::invalid_unit(
                &self.id,
                format!("impossible start_hours {}", self.start_hours),
            ));
        }
        if !self.duration_hours.is_finite() || self.duration_hours < 0.0 {
            return Err(Error::invalid_unit(
                &self.id,
                format!("impossible duration_hours {}", self.duration_hours),
            ));
        }

        match &self.beat {
            Beat::Scene(scene) => {
                for (name, value) in [
                    ("goal", &scene.goal),
                    ("conflict", &scene.conflict),
                    ("disaster", &scene.disaster),
                ] {
                    if value.trim().is_empty() {
                        return Err(Error::invalid_unit(
                            &self.id,
                            format!("scene is missing {name}"),
                        ));
                    }
                }
            }
            Beat::Sequel(sequel) => {
                let present = [&sequel.reaction, &sequel.dilemma, &sequel.decision]
                    .into_iter()
                    .flatten()
                    .any(|v| !v.trim().is_empty());
                if !present {
                    return Err(Error::invalid_unit(
                        &self.id,
                        "sequel needs a reaction, dilemma or decision",
                    ));
                }
            }
        }

        Ok(())
    }
}

impl SceneBeat {
    pub fn new(
        goal: impl Into<String>,
        conflict: impl Into<String>,
        disaster: impl Into<String>,
    ) -> Self {
        Self {
            goal: goal.into(),
            conflict: conflict.into(),
            disaster: disaster.into(),
        }
    }
}

impl SequelBeat {
    pub fn reaction(reaction: impl Into<String>) -> Self {
        Self {
            reaction: Some(reaction.into()),
            ..Default::default()
        }
    }
}
