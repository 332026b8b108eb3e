//! Navigation documents and the spine/TOC cross-check.
//!
//! Spine, EPUB 3 nav and NCX all derive from one ordered list of
//! [`NavEntry`]s, one per content document.

use std::collections::HashMap;

use crate::markdown::escape_xml;

use super::metadata::PackageMetadata;

/// Manifest id and file name of the navigation document.
pub const NAV_ID: &str = "nav";
pub const NAV_HREF: &str = "nav.xhtml";

/// What a content document is, for landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKind {
    TitlePage,
    Copyright,
    Chapter(u32),
    /// Single continuous text when chapters are disabled.
    Body,
    Glossary,
}

/// One content document in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub id: String,
    pub href: String,
    pub label: String,
    pub kind: NavKind,
}

/// A table-of-contents link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub label: String,
    pub href: String,
}

/// TOC links derived from the canonical list.
pub fn toc_entries(entries: &[NavEntry]) -> Vec<TocEntry> {
    entries
        .iter()
        .map(|e| TocEntry {
            label: e.label.clone(),
            href: e.href.clone(),
        })
        .collect()
}

/// Spine idrefs derived from the canonical list.
pub fn spine_refs(entries: &[NavEntry]) -> Vec<String> {
    entries.iter().map(|e| e.id.clone()).collect()
}

/// Compare the spine with the TOC.
///
/// `manifest` maps href to manifest id. Every spine idref must be reachable
/// from the TOC and every TOC link must be in the spine, in the same order.
/// The navigation document itself is skipped on both sides. Returns one
/// message per problem; an empty list means they agree.
pub fn check_consistency(
    spine: &[String],
    toc: &[TocEntry],
    manifest: &HashMap<String, String>,
) -> Vec<String> {
    let mut issues = Vec::new();

    let spine: Vec<&str> = spine
        .iter()
        .map(String::as_str)
        .filter(|id| *id != NAV_ID)
        .collect();

    let mut toc_ids = Vec::new();
    for entry in toc {
        let href = entry.href.split('#').next().unwrap_or(&entry.href);
        if href == NAV_HREF {
            continue;
        }
        match manifest.get(href) {
            Some(id) => toc_ids.push(id.as_str()),
            None => issues.push(format!(
                "TOC entry '{}' ({}) is not in the manifest",
                entry.label, entry.href
            )),
        }
    }

    for id in &spine {
        if !toc_ids.contains(id) {
            issues.push(format!("spine item '{}' has no TOC entry", id));
        }
    }
    for id in &toc_ids {
        if !spine.contains(id) {
            issues.push(format!("TOC entry '{}' is not in the spine", id));
        }
    }

    if issues.is_empty() && spine != toc_ids {
        issues.push(format!(
            "spine order [{}] differs from TOC order [{}]",
            spine.join(", "),
            toc_ids.join(", ")
        ));
    }

    issues
}

/// Generate the EPUB 3 navigation document (TOC plus landmarks).
pub fn generate_nav(metadata: &PackageMetadata, entries: &[NavEntry]) -> String {
    let lang = escape_xml(&metadata.language);
    let mut nav = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="{lang}" lang="{lang}">
<head>
  <meta charset="UTF-8"/>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="style.css"/>
</head>
<body>
<nav epub:type="toc" role="doc-toc" id="toc">
<h1>Contents</h1>
<ol>
"#,
        lang = lang,
        title = escape_xml(&metadata.title)
    );

    for entry in toc_entries(entries) {
        nav.push_str(&format!(
            "  <li><a href=\"{}\">{}</a></li>\n",
            escape_xml(&entry.href),
            escape_xml(&entry.label)
        ));
    }
    nav.push_str("</ol>\n</nav>\n");

    nav.push_str("<nav epub:type=\"landmarks\" id=\"landmarks\" hidden=\"hidden\">\n<h2>Landmarks</h2>\n<ol>\n");
    nav.push_str(&format!(
        "  <li><a epub:type=\"toc\" href=\"{}\">Table of Contents</a></li>\n",
        NAV_HREF
    ));
    for entry in entries {
        let landmark = match entry.kind {
            NavKind::TitlePage => Some(("titlepage", "Title Page")),
            NavKind::Copyright => Some(("copyright-page", "Copyright")),
            NavKind::Glossary => Some(("glossary", "Glossary")),
            _ => None,
        };
        if let Some((epub_type, label)) = landmark {
            nav.push_str(&format!(
                "  <li><a epub:type=\"{}\" href=\"{}\">{}</a></li>\n",
                epub_type,
                escape_xml(&entry.href),
                label
            ));
        }
    }
    if let Some(first) = entries
        .iter()
        .find(|e| matches!(e.kind, NavKind::Chapter(_) | NavKind::Body))
    {
        nav.push_str(&format!(
            "  <li><a epub:type=\"bodymatter\" href=\"{}\">Start of Content</a></li>\n",
            escape_xml(&first.href)
        ));
    }
    nav.push_str("</ol>\n</nav>\n</body>\n</html>\n");
    nav
}

/// Generate toc.ncx for EPUB 2 reading systems.
pub fn generate_ncx(metadata: &PackageMetadata, entries: &[NavEntry]) -> String {
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content=""#,
    );
    ncx.push_str(&escape_xml(&metadata.identifier));
    ncx.push_str(
        r#""/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>"#,
    );
    ncx.push_str(&escape_xml(&metadata.title));
    ncx.push_str(
        r#"</text>
  </docTitle>
  <docAuthor>
    <text>"#,
    );
    ncx.push_str(&escape_xml(&metadata.author));
    ncx.push_str(
        r#"</text>
  </docAuthor>
  <navMap>
"#,
    );

    for (i, entry) in toc_entries(entries).iter().enumerate() {
        let play_order = i + 1;
        ncx.push_str(&format!(
            "    <navPoint id=\"navPoint-{}\" playOrder=\"{}\">\n",
            play_order, play_order
        ));
        ncx.push_str(&format!(
            "      <navLabel><text>{}</text></navLabel>\n",
            escape_xml(&entry.label)
        ));
        ncx.push_str(&format!(
            "      <content src=\"{}\"/>\n",
            escape_xml(&entry.href)
        ));
        ncx.push_str("    </navPoint>\n");
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}
