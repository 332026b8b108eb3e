//! EPUB 3 package assembly and validation.
//!
//! Packages carry an NCX alongside the EPUB 3 navigation document so that
//! older reading systems still get a table of contents.

mod metadata;
mod nav;
mod render;
mod validator;
mod writer;

pub use metadata::{
    Accessibility, Contributor, LayoutHints, PackageMetadata, PublicationInfo, Series,
};
pub use nav::{
    NAV_HREF, NAV_ID, NavEntry, NavKind, TocEntry, check_consistency, generate_nav, generate_ncx,
    spine_refs, toc_entries,
};
pub use render::{
    STYLESHEET, SceneBreakStyle, Separator, chapter_label, paragraphs, render_chapter,
    render_copyright, render_glossary, render_title_page, separator_between, xhtml_document,
};
pub use validator::{StructureSummary, ValidationReport, validate, validate_reader};
pub use writer::{Document, MIMETYPE, Package, write_package, write_package_to_writer};
