//! Structural checks on a finished EPUB.
//!
//! This is a diagnostic, not part of generation: it never fails, and every
//! finding is reported as data in a [`ValidationReport`].

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::{CompressionMethod, ZipArchive};

use super::writer::MIMETYPE;

/// Metadata elements every package must carry with non-empty text.
const REQUIRED_METADATA: &[&str] = &["title", "identifier", "language", "creator"];

/// Elements that must open and close exactly once per content document.
const STRUCTURAL_TAGS: &[&str] = &["html", "head", "body"];

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<String>,
    /// Set when the file could not be opened as an archive at all.
    pub error: Option<String>,
    pub structure: StructureSummary,
}

/// What the validator found inside the archive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureSummary {
    pub entry_count: usize,
    pub package_path: Option<String>,
    pub title: Option<String>,
    pub manifest_items: usize,
    pub spine_length: usize,
    pub content_documents: usize,
    pub has_nav: bool,
    pub has_ncx: bool,
}

#[derive(Default)]
struct PackageInfo {
    metadata: HashMap<String, String>,
    /// (href, media type, properties)
    manifest: Vec<(String, String, String)>,
    spine: Vec<String>,
}

/// Validate the EPUB at `path`.
pub fn validate<P: AsRef<Path>>(path: P) -> ValidationReport {
    let file = match File::open(path.as_ref()) {
        Ok(file) => file,
        Err(e) => return failed(format!("cannot open {}: {}", path.as_ref().display(), e)),
    };
    validate_reader(file)
}

/// Validate an EPUB held in any seekable reader.
pub fn validate_reader<R: Read + Seek>(reader: R) -> ValidationReport {
    let mut archive = match ZipArchive::new(reader) {
        Ok(archive) => archive,
        Err(e) => return failed(format!("not a ZIP archive: {}", e)),
    };

    let mut report = ValidationReport {
        structure: StructureSummary {
            entry_count: archive.len(),
            ..Default::default()
        },
        ..Default::default()
    };

    check_mimetype(&mut archive, &mut report.issues);

    match read_entry(&mut archive, "META-INF/container.xml") {
        Ok(container) => match rootfile_path(&container) {
            Some(opf_path) => {
                report.structure.package_path = Some(opf_path.clone());
                check_package(&mut archive, &opf_path, &mut report);
            }
            None => report
                .issues
                .push("container.xml does not reference a package document".to_string()),
        },
        Err(_) => report
            .issues
            .push("missing META-INF/container.xml".to_string()),
    }

    report.valid = report.issues.is_empty();
    report
}

fn failed(error: String) -> ValidationReport {
    ValidationReport {
        valid: false,
        issues: vec![error.clone()],
        error: Some(error),
        structure: StructureSummary::default(),
    }
}

fn check_mimetype<R: Read + Seek>(archive: &mut ZipArchive<R>, issues: &mut Vec<String>) {
    if archive.is_empty() {
        issues.push("archive is empty".to_string());
        return;
    }
    let mut first = match archive.by_index(0) {
        Ok(file) => file,
        Err(e) => {
            issues.push(format!("cannot read first entry: {}", e));
            return;
        }
    };
    if first.name() != "mimetype" {
        issues.push(format!("first entry is '{}', expected 'mimetype'", first.name()));
        return;
    }
    if first.compression() != CompressionMethod::Stored {
        issues.push("mimetype entry is compressed".to_string());
    }
    let mut content = Vec::new();
    if first.read_to_end(&mut content).is_err() || content != MIMETYPE {
        issues.push(format!(
            "mimetype content is '{}'",
            String::from_utf8_lossy(&content)
        ));
    }
}

fn check_package<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    opf_path: &str,
    report: &mut ValidationReport,
) {
    let opf = match read_entry(archive, opf_path) {
        Ok(opf) => opf,
        Err(_) => {
            report
                .issues
                .push(format!("package document '{}' is missing", opf_path));
            return;
        }
    };
    let info = match parse_package(&opf) {
        Ok(info) => info,
        Err(e) => {
            report
                .issues
                .push(format!("package document is malformed: {}", e));
            return;
        }
    };

    for field in REQUIRED_METADATA {
        let present = info.metadata.get(*field).is_some_and(|v| !v.trim().is_empty());
        if !present {
            report
                .issues
                .push(format!("metadata is missing dc:{}", field));
        }
    }

    let base = opf_path
        .rsplit_once('/')
        .map(|(dir, _)| format!("{}/", dir))
        .unwrap_or_default();

    let nav = info
        .manifest
        .iter()
        .find(|(_, _, props)| props.split_whitespace().any(|p| p == "nav"));
    let ncx = info
        .manifest
        .iter()
        .find(|(_, media_type, _)| media_type == "application/x-dtbncx+xml");
    let has_nav =
        nav.is_some_and(|(href, _, _)| archive.index_for_name(&format!("{base}{href}")).is_some());
    let has_ncx =
        ncx.is_some_and(|(href, _, _)| archive.index_for_name(&format!("{base}{href}")).is_some());
    if !has_nav {
        report
            .issues
            .push("missing EPUB 3 navigation document".to_string());
    }
    if !has_ncx {
        report.issues.push("missing NCX navigation document".to_string());
    }

    report.structure.title = info.metadata.get("title").cloned();
    report.structure.manifest_items = info.manifest.len();
    report.structure.spine_length = info.spine.len();
    report.structure.has_nav = has_nav;
    report.structure.has_ncx = has_ncx;

    for (href, media_type, _) in &info.manifest {
        if media_type != "application/xhtml+xml" {
            continue;
        }
        let path = format!("{base}{href}");
        match read_entry(archive, &path) {
            Ok(xhtml) => {
                report.structure.content_documents += 1;
                check_content_document(&path, &xhtml, &mut report.issues);
            }
            Err(_) => report
                .issues
                .push(format!("manifest item '{}' is missing from the archive", path)),
        }
    }
}

fn check_content_document(path: &str, xhtml: &str, issues: &mut Vec<String>) {
    let text = xhtml.trim_start_matches('\u{feff}').trim_start();
    if !text.starts_with("<?xml") {
        issues.push(format!("{} does not start with an XML declaration", path));
    }

    let mut reader = Reader::from_str(text);
    let mut opened: HashMap<&str, i32> = HashMap::new();
    let mut closed: HashMap<&str, i32> = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if let Some(tag) = structural(e.local_name().as_ref()) {
                    *opened.entry(tag).or_default() += 1;
                }
            }
            Ok(Event::End(e)) => {
                if let Some(tag) = structural(e.local_name().as_ref()) {
                    *closed.entry(tag).or_default() += 1;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                issues.push(format!(
                    "{} is not well-formed at byte {}: {}",
                    path,
                    reader.buffer_position(),
                    e
                ));
                return;
            }
            _ => {}
        }
    }

    for tag in STRUCTURAL_TAGS {
        let open = opened.get(tag).copied().unwrap_or(0);
        let close = closed.get(tag).copied().unwrap_or(0);
        if open != 1 || close != 1 {
            issues.push(format!(
                "{} has {} <{}> and {} </{}>",
                path, open, tag, close, tag
            ));
        }
    }
}

fn structural(name: &[u8]) -> Option<&'static str> {
    STRUCTURAL_TAGS
        .iter()
        .copied()
        .find(|tag| tag.as_bytes() == name)
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> io::Result<String> {
    let mut file = archive.by_name(name).map_err(io::Error::other)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

fn rootfile_path(container: &str) -> Option<String> {
    let mut reader = Reader::from_str(container);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"rootfile" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"full-path" {
                        return String::from_utf8(attr.value.to_vec()).ok();
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn parse_package(content: &str) -> Result<PackageInfo, quick_xml::Error> {
    // Untrimmed, so text around entity references keeps its spaces.
    let mut reader = Reader::from_str(content);

    let mut info = PackageInfo::default();
    let mut in_metadata = false;
    let mut current: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"metadata" => in_metadata = true,
                    name if in_metadata && e.name().as_ref().starts_with(b"dc:") => {
                        let name = String::from_utf8_lossy(name).into_owned();
                        if !info.metadata.contains_key(&name) {
                            current = Some(name);
                            text.clear();
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => match e.local_name().as_ref() {
                b"item" => {
                    let mut href = String::new();
                    let mut media_type = String::new();
                    let mut properties = String::new();
                    for attr in e.attributes().flatten() {
                        let value = String::from_utf8_lossy(&attr.value).into_owned();
                        match attr.key.as_ref() {
                            b"href" => href = value,
                            b"media-type" => media_type = value,
                            b"properties" => properties = value,
                            _ => {}
                        }
                    }
                    info.manifest.push((href, media_type, properties));
                }
                b"itemref" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"idref" {
                            info.spine
                                .push(String::from_utf8_lossy(&attr.value).into_owned());
                        }
                    }
                }
                _ => {}
            },
            Event::Text(e) => {
                if current.is_some() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if current.is_some() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    match resolve_entity(&entity) {
                        Some(c) => text.push(c),
                        None => {
                            text.push('&');
                            text.push_str(&entity);
                            text.push(';');
                        }
                    }
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"metadata" {
                    in_metadata = false;
                }
                if let Some(name) = current.take() {
                    info.metadata.insert(name, text.trim().to_string());
                    text.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(info)
}

/// Predefined XML entities and numeric character references.
fn resolve_entity(entity: &str) -> Option<char> {
    match entity {
        "apos" => return Some('\''),
        "quot" => return Some('"'),
        "lt" => return Some('<'),
        "gt" => return Some('>'),
        "amp" => return Some('&'),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code)
}
