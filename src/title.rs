//! Title resolution.
//!
//! Titles come from, in order: an explicit override, the cached value in the
//! [`TitleStore`], a fresh [`TitleGenerator`] call, and finally a safe
//! default. Only a fresh, successful generation is written back to the store.

use crate::error::Result;
use crate::model::Manuscript;
use crate::store::{StoreKey, TitleStore};

/// Title used when nothing better is available.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Produces a title for a finished manuscript (typically a model call).
pub trait TitleGenerator {
    fn generate(&self, manuscript: &Manuscript<'_>) -> Result<String>;
}

impl<F> TitleGenerator for F
where
    F: Fn(&Manuscript<'_>) -> Result<String>,
{
    fn generate(&self, manuscript: &Manuscript<'_>) -> Result<String> {
        self(manuscript)
    }
}

/// Where a resolved title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    Override,
    Cached,
    Generated,
    Fallback,
}

pub(crate) fn resolve_title(
    manuscript: &Manuscript<'_>,
    title_override: Option<&str>,
    generator: Option<&dyn TitleGenerator>,
    store: &mut dyn TitleStore,
) -> (String, TitleSource) {
    if let Some(title) = title_override.map(str::trim)
        && !title.is_empty()
    {
        return (title.to_string(), TitleSource::Override);
    }

    if let Some(title) = store.get(StoreKey::GeneratedTitle) {
        return (title, TitleSource::Cached);
    }

    if let Some(generator) = generator {
        match generator.generate(manuscript) {
            Ok(title) if !title.trim().is_empty() => {
                let title = clean_title(&title);
                if let Err(e) = store.set(StoreKey::GeneratedTitle, &title) {
                    tracing::warn!(error = %e, "failed to cache generated title");
                }
                return (title, TitleSource::Generated);
            }
            Ok(_) => tracing::warn!("title generator returned an empty title"),
            Err(e) => tracing::warn!(error = %e, "title generation failed, using fallback"),
        }
    }

    (fallback_title(manuscript), TitleSource::Fallback)
}

fn fallback_title(manuscript: &Manuscript<'_>) -> String {
    manuscript
        .story
        .working_title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string()
}

/// Models like to wrap titles in quotes or prefix them with "Title:".
fn clean_title(raw: &str) -> String {
    let mut title = raw.lines().next().unwrap_or("").trim();
    if let Some(rest) = title.strip_prefix("Title:") {
        title = rest.trim();
    }
    title
        .trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”' | '*'))
        .trim()
        .to_string()
}
