use std::collections::HashMap;
use std::io::{self, Seek, Write};
use std::path::Path;

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::markdown::escape_xml;

use super::metadata::PackageMetadata;
use super::nav::{self, NAV_HREF, NAV_ID, NavEntry, TocEntry};

/// Declaration stored uncompressed as the first archive entry.
pub const MIMETYPE: &[u8] = b"application/epub+zip";

/// Directory holding the package document and all content.
const CONTENT_DIR: &str = "OEBPS";

const NCX_ID: &str = "ncx";
const NCX_HREF: &str = "toc.ncx";
const STYLE_ID: &str = "style";
const STYLE_HREF: &str = "style.css";

/// A rendered content document.
#[derive(Debug, Clone)]
pub struct Document {
    pub entry: NavEntry,
    pub xhtml: String,
}

/// Everything that goes into one EPUB file.
#[derive(Debug, Clone)]
pub struct Package {
    pub metadata: PackageMetadata,
    /// Content documents in reading order; the canonical navigation list.
    pub documents: Vec<Document>,
    pub stylesheet: String,
}

struct ManifestItem<'a> {
    id: &'a str,
    href: &'a str,
    media_type: &'a str,
    properties: Option<&'a str>,
}

impl Package {
    pub fn nav_entries(&self) -> Vec<NavEntry> {
        self.documents.iter().map(|d| d.entry.clone()).collect()
    }

    pub fn spine(&self) -> Vec<String> {
        nav::spine_refs(&self.nav_entries())
    }

    pub fn toc(&self) -> Vec<TocEntry> {
        nav::toc_entries(&self.nav_entries())
    }

    /// Map of manifest href to manifest id.
    pub fn manifest_ids(&self) -> HashMap<String, String> {
        self.manifest()
            .iter()
            .map(|item| (item.href.to_string(), item.id.to_string()))
            .collect()
    }

    /// Spine/TOC disagreements; empty when the package is consistent.
    pub fn consistency_issues(&self) -> Vec<String> {
        nav::check_consistency(&self.spine(), &self.toc(), &self.manifest_ids())
    }

    fn manifest(&self) -> Vec<ManifestItem<'_>> {
        let mut items = vec![
            ManifestItem {
                id: NAV_ID,
                href: NAV_HREF,
                media_type: "application/xhtml+xml",
                properties: Some("nav"),
            },
            ManifestItem {
                id: NCX_ID,
                href: NCX_HREF,
                media_type: "application/x-dtbncx+xml",
                properties: None,
            },
            ManifestItem {
                id: STYLE_ID,
                href: STYLE_HREF,
                media_type: "text/css",
                properties: None,
            },
        ];
        for doc in &self.documents {
            items.push(ManifestItem {
                id: &doc.entry.id,
                href: &doc.entry.href,
                media_type: "application/xhtml+xml",
                properties: None,
            });
        }
        items
    }
}

/// Write a [`Package`] to an EPUB file on disk.
pub fn write_package<P: AsRef<Path>>(package: &Package, path: P) -> io::Result<()> {
    let file = std::fs::File::create(path)?;
    write_package_to_writer(package, file)
}

/// Write a [`Package`] to any [`Write`] + [`Seek`] destination.
pub fn write_package_to_writer<W: Write + Seek>(package: &Package, writer: W) -> io::Result<()> {
    let mut zip = ZipWriter::new(writer);

    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    // 1. Write mimetype (must be first, uncompressed)
    zip.start_file("mimetype", stored).map_err(io_error)?;
    zip.write_all(MIMETYPE)?;

    // 2. Write container.xml
    zip.start_file("META-INF/container.xml", deflated)
        .map_err(io_error)?;
    zip.write_all(CONTAINER_XML)?;

    // 3. Write content.opf
    let opf = generate_opf(package);
    zip.start_file(format!("{CONTENT_DIR}/content.opf"), deflated)
        .map_err(io_error)?;
    zip.write_all(opf.as_bytes())?;

    // 4. Write navigation documents
    let entries = package.nav_entries();
    zip.start_file(format!("{CONTENT_DIR}/{NAV_HREF}"), deflated)
        .map_err(io_error)?;
    zip.write_all(nav::generate_nav(&package.metadata, &entries).as_bytes())?;

    zip.start_file(format!("{CONTENT_DIR}/{NCX_HREF}"), deflated)
        .map_err(io_error)?;
    zip.write_all(nav::generate_ncx(&package.metadata, &entries).as_bytes())?;

    // 5. Write stylesheet
    zip.start_file(format!("{CONTENT_DIR}/{STYLE_HREF}"), deflated)
        .map_err(io_error)?;
    zip.write_all(package.stylesheet.as_bytes())?;

    // 6. Write content documents
    for doc in &package.documents {
        zip.start_file(format!("{CONTENT_DIR}/{}", doc.entry.href), deflated)
            .map_err(io_error)?;
        zip.write_all(doc.xhtml.as_bytes())?;
        tracing::debug!(href = %doc.entry.href, bytes = doc.xhtml.len(), "wrote document");
    }

    zip.finish().map_err(io_error)?;
    Ok(())
}

/// Convert zip error to io error.
fn io_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> io::Error {
    io::Error::other(e)
}

/// Container.xml template.
const CONTAINER_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// Generate content.opf from metadata, manifest and spine.
fn generate_opf(package: &Package) -> String {
    let mut opf = String::new();

    opf.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId" xml:lang="{}">
"#,
        escape_xml(&package.metadata.language)
    ));

    package.metadata.write_opf_metadata(&mut opf);

    opf.push_str("  <manifest>\n");
    for item in package.manifest() {
        let properties = item
            .properties
            .map(|p| format!(" properties=\"{}\"", p))
            .unwrap_or_default();
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{}/>\n",
            escape_xml(item.id),
            escape_xml(item.href),
            escape_xml(item.media_type),
            properties
        ));
    }
    opf.push_str("  </manifest>\n");

    opf.push_str(&format!("  <spine toc=\"{}\">\n", NCX_ID));
    for id in package.spine() {
        opf.push_str(&format!("    <itemref idref=\"{}\"/>\n", escape_xml(&id)));
    }
    opf.push_str("  </spine>\n");

    opf.push_str("</package>\n");
    opf
}
