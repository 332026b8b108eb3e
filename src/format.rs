//! Turning a manuscript and its chapter plan into an EPUB file.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::chapter::{ChapterBreak, ChapterStyle};
use crate::config::{PackageConfig, PressConfig};
use crate::epub::{
    Document, NavEntry, NavKind, Package, PackageMetadata, STYLESHEET, chapter_label,
    render_chapter, render_copyright, render_glossary, render_title_page, write_package,
    xhtml_document,
};
use crate::error::{Error, Result};
use crate::markdown::slugify;
use crate::model::{Manuscript, SceneSequel};
use crate::store::{StoreKey, TitleStore};
use crate::title::{TitleGenerator, resolve_title};

/// File name used when the title slugifies to nothing.
const FALLBACK_FILENAME: &str = "book.epub";

/// Where a package is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub dir: PathBuf,
    /// Explicit file name; derived from the title when absent.
    pub filename: Option<String>,
}

impl OutputTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Units belonging to one chapter, in story order.
#[derive(Debug)]
struct ChapterGroup<'a> {
    number: u32,
    title: Option<&'a str>,
    units: Vec<&'a SceneSequel>,
}

/// Assembles and writes EPUB packages.
pub struct PackageFormatter {
    config: PackageConfig,
    chapter_style: ChapterStyle,
    generator: Option<Box<dyn TitleGenerator>>,
}

impl PackageFormatter {
    pub fn new(config: PackageConfig) -> Self {
        Self {
            config,
            chapter_style: ChapterStyle::default(),
            generator: None,
        }
    }

    pub fn from_config(config: &PressConfig) -> Self {
        Self::new(config.package.clone()).with_chapter_style(config.chapters.style)
    }

    pub fn with_chapter_style(mut self, style: ChapterStyle) -> Self {
        self.chapter_style = style;
        self
    }

    pub fn with_title_generator(mut self, generator: impl TitleGenerator + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    pub fn config(&self) -> &PackageConfig {
        &self.config
    }

    /// Build the package and write it under `target`.
    ///
    /// Returns the path of the written file. The resolved title and file
    /// name are recorded in `store` when possible; a store that cannot be
    /// written never fails the build.
    pub fn format(
        &self,
        manuscript: &Manuscript<'_>,
        breaks: &[ChapterBreak],
        target: &OutputTarget,
        title_override: Option<&str>,
        store: &mut dyn TitleStore,
    ) -> Result<PathBuf> {
        for unit in manuscript.units {
            unit.validate()?;
        }
        validate_breaks(manuscript.units, breaks)?;

        let (title, source) =
            resolve_title(manuscript, title_override, self.generator.as_deref(), store);
        tracing::debug!(%title, ?source, "resolved title");

        let metadata = PackageMetadata::assemble(&self.config.publication, &title, manuscript);
        let package = self.build_package(manuscript, breaks, metadata);

        let issues = package.consistency_issues();
        if !issues.is_empty() {
            if self.config.strict_consistency {
                return Err(Error::Inconsistent(issues.join("; ")));
            }
            for issue in &issues {
                tracing::warn!(%issue, "spine and table of contents disagree");
            }
        }

        let filename = output_filename(target.filename.as_deref(), &title);
        let path = target.dir.join(&filename);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        write_package(&package, &path)?;

        if let Err(e) = store.set(StoreKey::OutputFilename, &filename) {
            tracing::warn!(error = %e, "failed to record output file name");
        }

        tracing::info!(
            path = %path.display(),
            chapters = breaks.len(),
            words = manuscript.total_words(),
            "wrote EPUB"
        );
        Ok(path)
    }

    /// Assemble every document of the package without writing anything.
    pub fn build_package(
        &self,
        manuscript: &Manuscript<'_>,
        breaks: &[ChapterBreak],
        metadata: PackageMetadata,
    ) -> Package {
        let lang = metadata.language.clone();
        let mut documents = Vec::new();

        documents.push(Document {
            entry: entry("title-page", "title.xhtml", "Title Page", NavKind::TitlePage),
            xhtml: xhtml_document(&metadata.title, &lang, &render_title_page(&metadata)),
        });

        if self.config.include_copyright {
            let body = render_copyright(&metadata, self.config.ai_disclosure.as_deref());
            documents.push(Document {
                entry: entry("copyright", "copyright.xhtml", "Copyright", NavKind::Copyright),
                xhtml: xhtml_document("Copyright", &lang, &body),
            });
        }

        let groups = group_chapters(manuscript.units, breaks);
        if groups.is_empty() {
            if !manuscript.units.is_empty() {
                let units: Vec<&SceneSequel> = manuscript.units.iter().collect();
                let body = render_chapter(
                    &units,
                    None,
                    None,
                    self.chapter_style,
                    self.config.scene_break,
                );
                documents.push(Document {
                    entry: entry("text", "text.xhtml", &metadata.title, NavKind::Body),
                    xhtml: xhtml_document(&metadata.title, &lang, &body),
                });
            }
        } else {
            for group in &groups {
                let label = chapter_label(self.chapter_style, group.number, group.title);
                let body = render_chapter(
                    &group.units,
                    Some(group.number),
                    group.title,
                    self.chapter_style,
                    self.config.scene_break,
                );
                documents.push(Document {
                    entry: entry(
                        &format!("chapter-{:03}", group.number),
                        &format!("chapter_{:03}.xhtml", group.number),
                        &label,
                        NavKind::Chapter(group.number),
                    ),
                    xhtml: xhtml_document(&label, &lang, &body),
                });
            }
        }

        if !manuscript.characters.is_empty() {
            let body = render_glossary(manuscript.characters, manuscript.locations);
            documents.push(Document {
                entry: entry("glossary", "glossary.xhtml", "Glossary", NavKind::Glossary),
                xhtml: xhtml_document("Glossary", &lang, &body),
            });
        }

        Package {
            metadata,
            documents,
            stylesheet: STYLESHEET.to_string(),
        }
    }
}

fn entry(id: &str, href: &str, label: &str, kind: NavKind) -> NavEntry {
    NavEntry {
        id: id.to_string(),
        href: href.to_string(),
        label: label.to_string(),
        kind,
    }
}

/// Breaks must name known units, in story order, with rising chapter
/// numbers, and the first one must open the story.
fn validate_breaks(units: &[SceneSequel], breaks: &[ChapterBreak]) -> Result<()> {
    let Some(first) = breaks.first() else {
        return Ok(());
    };
    if units.first().map(|u| u.id.as_str()) != Some(first.unit_id.as_str()) {
        return Err(Error::InvalidBreaks(format!(
            "first chapter starts at '{}' instead of the first unit",
            first.unit_id
        )));
    }

    let positions: HashMap<&str, usize> = units
        .iter()
        .enumerate()
        .map(|(i, u)| (u.id.as_str(), i))
        .collect();

    let mut last: Option<(usize, u32)> = None;
    for b in breaks {
        let Some(&position) = positions.get(b.unit_id.as_str()) else {
            return Err(Error::InvalidBreaks(format!(
                "chapter {} starts at unknown unit '{}'",
                b.chapter, b.unit_id
            )));
        };
        if b.chapter == 0 {
            return Err(Error::InvalidBreaks(format!(
                "chapter at '{}' is numbered 0",
                b.unit_id
            )));
        }
        if let Some((prev_position, prev_chapter)) = last
            && (position <= prev_position || b.chapter <= prev_chapter)
        {
            return Err(Error::InvalidBreaks(format!(
                "chapter {} at '{}' is out of order",
                b.chapter, b.unit_id
            )));
        }
        last = Some((position, b.chapter));
    }
    Ok(())
}

/// Split units into contiguous chapters. Assumes validated breaks.
fn group_chapters<'a>(units: &'a [SceneSequel], breaks: &'a [ChapterBreak]) -> Vec<ChapterGroup<'a>> {
    let mut groups: Vec<ChapterGroup<'a>> = Vec::new();
    let mut next = breaks.iter().peekable();

    for unit in units {
        if let Some(b) = next.next_if(|b| b.unit_id == unit.id) {
            groups.push(ChapterGroup {
                number: b.chapter,
                title: b.title.as_deref(),
                units: Vec::new(),
            });
        }
        if let Some(group) = groups.last_mut() {
            group.units.push(unit);
        }
    }
    groups
}

fn output_filename(explicit: Option<&str>, title: &str) -> String {
    if let Some(name) = explicit.map(str::trim)
        && !name.is_empty()
    {
        return name.to_string();
    }
    let slug = slugify(title);
    if slug.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        format!("{slug}.epub")
    }
}
