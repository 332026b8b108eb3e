//! Configuration for chapter planning and packaging.
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file
//! at all) yields a working configuration:
//!
//! ```toml
//! [chapters]
//! style = "titled"
//! target_chapter_length = 2500
//!
//! [package]
//! author = "A. Writer"
//! scene_break = "fleuron"
//!
//! [package.series]
//! name = "The Long Road"
//! position = 2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chapter::{ChapterPolicy, ChapterStyle};
use crate::epub::{PublicationInfo, SceneBreakStyle};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressConfig {
    pub chapters: ChaptersConfig,
    pub package: PackageConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaptersConfig {
    pub style: ChapterStyle,
    #[serde(flatten)]
    pub policy: ChapterPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    #[serde(flatten)]
    pub publication: PublicationInfo,
    pub scene_break: SceneBreakStyle,
    pub include_copyright: bool,
    /// Note printed on the copyright page about machine-assisted writing.
    pub ai_disclosure: Option<String>,
    /// Fail instead of warning when the spine and TOC disagree.
    pub strict_consistency: bool,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            publication: PublicationInfo::default(),
            scene_break: SceneBreakStyle::default(),
            include_copyright: true,
            ai_disclosure: None,
            strict_consistency: false,
        }
    }
}

impl PressConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: PressConfig = toml::from_str(s)?;
        config.chapters.policy.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded configuration");
        Ok(config)
    }
}
