//! Story-level records produced by the content-generation stage.

use serde::{Deserialize, Serialize};

use super::SceneSequel;

/// Story idea and framing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryMetadata {
    /// One-line hook pitched for the story.
    #[serde(default)]
    pub title_hook: String,
    /// Title used while drafting, if the planner chose one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_title: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub setting: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub biography: String,
    #[serde(default)]
    pub significance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub atmosphere: String,
    #[serde(default)]
    pub significance: String,
}

/// Everything the formatter reads about a finished draft.
#[derive(Debug, Clone, Copy)]
pub struct Manuscript<'a> {
    pub story: &'a StoryMetadata,
    pub characters: &'a [Character],
    pub locations: &'a [Location],
    pub units: &'a [SceneSequel],
}

impl<'a> Manuscript<'a> {
    pub fn new(story: &'a StoryMetadata, units: &'a [SceneSequel]) -> Self {
        Self {
            story,
            characters: &[],
            locations: &[],
            units,
        }
    }

    pub fn with_characters(mut self, characters: &'a [Character]) -> Self {
        self.characters = characters;
        self
    }

    pub fn with_locations(mut self, locations: &'a [Location]) -> Self {
        self.locations = locations;
        self
    }

    pub fn total_words(&self) -> usize {
        self.units.iter().map(SceneSequel::effective_word_count).sum()
    }

    /// Subjects for the package metadata: genres then themes, without repeats.
    pub fn subjects(&self) -> Vec<&str> {
        let mut subjects: Vec<&str> = Vec::new();
        for s in self.story.genres.iter().chain(&self.story.themes) {
            let s = s.trim();
            if !s.is_empty() && !subjects.iter().any(|seen| seen.eq_ignore_ascii_case(s)) {
                subjects.push(s);
            }
        }
        subjects
    }
}

impl Character {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            ..Default::default()
        }
    }
}

impl Location {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }
}
