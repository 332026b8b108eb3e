//! Package metadata: Dublin Core plus EPUB 3 refinements.

use serde::{Deserialize, Serialize};

use crate::markdown::escape_xml;
use crate::model::Manuscript;

/// Publication details supplied by configuration rather than the story.
///
/// Every optional field that is absent (or blank) is left out of the
/// package entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicationInfo {
    pub language: String,
    pub author: String,
    pub publisher: Option<String>,
    pub rights: Option<String>,
    /// Overrides the story hook as the package description.
    pub description: Option<String>,
    pub contributors: Vec<Contributor>,
    pub series: Option<Series>,
    pub accessibility: Accessibility,
    pub layout: LayoutHints,
}

impl Default for PublicationInfo {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            author: "Anonymous".to_string(),
            publisher: None,
            rights: None,
            description: None,
            contributors: Vec::new(),
            series: None,
            accessibility: Accessibility::default(),
            layout: LayoutHints::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    /// MARC relator code, e.g. "edt" or "ill".
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    #[serde(default)]
    pub position: Option<f64>,
}

/// schema.org accessibility properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Accessibility {
    pub access_modes: Vec<String>,
    pub features: Vec<String>,
    pub hazards: Vec<String>,
    pub summary: Option<String>,
}

/// Rendition hints. Layout itself is always reflowable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutHints {
    /// "none", "landscape", "both" or "auto".
    pub spread: Option<String>,
    /// "auto", "portrait" or "landscape".
    pub orientation: Option<String>,
}

/// Metadata for one generated package.
#[derive(Debug, Clone)]
pub struct PackageMetadata {
    /// `urn:uuid:` identifier, fresh for every generation.
    pub identifier: String,
    pub title: String,
    pub language: String,
    pub author: String,
    /// `dcterms:modified` timestamp (`YYYY-MM-DDThh:mm:ssZ`).
    pub modified: String,
    pub subjects: Vec<String>,
    pub description: Option<String>,
    pub info: PublicationInfo,
}

impl PackageMetadata {
    /// Assemble metadata for a new package.
    pub fn assemble(info: &PublicationInfo, title: &str, manuscript: &Manuscript<'_>) -> Self {
        let now = chrono::Utc::now();
        let description = present(info.description.as_deref())
            .or_else(|| present(Some(manuscript.story.title_hook.as_str())))
            .map(str::to_string);

        Self {
            identifier: format!("urn:uuid:{}", uuid::Uuid::new_v4()),
            title: title.to_string(),
            language: present(Some(info.language.as_str()))
                .unwrap_or("en")
                .to_string(),
            author: present(Some(info.author.as_str()))
                .unwrap_or("Anonymous")
                .to_string(),
            modified: now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            subjects: manuscript
                .subjects()
                .into_iter()
                .map(str::to_string)
                .collect(),
            description,
            info: info.clone(),
        }
    }

    /// Year of `modified`, for the copyright line.
    pub fn year(&self) -> &str {
        self.modified.get(..4).unwrap_or("")
    }

    /// Write the `<metadata>` element of the package document.
    pub fn write_opf_metadata(&self, opf: &mut String) {
        opf.push_str("  <metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n");

        opf.push_str(&format!(
            "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
            escape_xml(&self.identifier)
        ));
        opf.push_str(&format!(
            "    <dc:title id=\"title\">{}</dc:title>\n",
            escape_xml(&self.title)
        ));
        opf.push_str("    <meta refines=\"#title\" property=\"title-type\">main</meta>\n");
        opf.push_str(&format!(
            "    <dc:language>{}</dc:language>\n",
            escape_xml(&self.language)
        ));
        opf.push_str(&format!(
            "    <dc:creator id=\"creator\">{}</dc:creator>\n",
            escape_xml(&self.author)
        ));
        opf.push_str("    <meta refines=\"#creator\" property=\"role\" scheme=\"marc:relators\">aut</meta>\n");
        opf.push_str(&format!(
            "    <dc:date>{}</dc:date>\n",
            escape_xml(&self.modified)
        ));
        opf.push_str(&format!(
            "    <meta property=\"dcterms:modified\">{}</meta>\n",
            escape_xml(&self.modified)
        ));

        if let Some(description) = present(self.description.as_deref()) {
            opf.push_str(&format!(
                "    <dc:description>{}</dc:description>\n",
                escape_xml(description)
            ));
        }
        for subject in &self.subjects {
            opf.push_str(&format!(
                "    <dc:subject>{}</dc:subject>\n",
                escape_xml(subject)
            ));
        }
        if let Some(publisher) = present(self.info.publisher.as_deref()) {
            opf.push_str(&format!(
                "    <dc:publisher>{}</dc:publisher>\n",
                escape_xml(publisher)
            ));
        }
        if let Some(rights) = present(self.info.rights.as_deref()) {
            opf.push_str(&format!(
                "    <dc:rights>{}</dc:rights>\n",
                escape_xml(rights)
            ));
        }

        let mut next_id = 1;
        for contrib in &self.info.contributors {
            let Some(name) = present(Some(contrib.name.as_str())) else {
                continue;
            };
            let contrib_id = format!("contrib{}", next_id);
            next_id += 1;
            opf.push_str(&format!(
                "    <dc:contributor id=\"{}\">{}</dc:contributor>\n",
                contrib_id,
                escape_xml(name)
            ));
            if let Some(role) = present(contrib.role.as_deref()) {
                opf.push_str(&format!(
                    "    <meta refines=\"#{}\" property=\"role\" scheme=\"marc:relators\">{}</meta>\n",
                    contrib_id,
                    escape_xml(role)
                ));
            }
        }

        if let Some(series) = &self.info.series
            && let Some(name) = present(Some(series.name.as_str()))
        {
            opf.push_str(&format!(
                "    <meta property=\"belongs-to-collection\" id=\"series\">{}</meta>\n",
                escape_xml(name)
            ));
            opf.push_str("    <meta refines=\"#series\" property=\"collection-type\">series</meta>\n");
            if let Some(pos) = series.position {
                opf.push_str(&format!(
                    "    <meta refines=\"#series\" property=\"group-position\">{}</meta>\n",
                    format_position(pos)
                ));
            }
        }

        let a11y = &self.info.accessibility;
        for (property, values) in [
            ("schema:accessMode", &a11y.access_modes),
            ("schema:accessibilityFeature", &a11y.features),
            ("schema:accessibilityHazard", &a11y.hazards),
        ] {
            for value in values.iter().filter_map(|v| present(Some(v.as_str()))) {
                opf.push_str(&format!(
                    "    <meta property=\"{}\">{}</meta>\n",
                    property,
                    escape_xml(value)
                ));
            }
        }
        if let Some(summary) = present(a11y.summary.as_deref()) {
            opf.push_str(&format!(
                "    <meta property=\"schema:accessibilitySummary\">{}</meta>\n",
                escape_xml(summary)
            ));
        }

        opf.push_str("    <meta property=\"rendition:layout\">reflowable</meta>\n");
        if let Some(spread) = present(self.info.layout.spread.as_deref()) {
            opf.push_str(&format!(
                "    <meta property=\"rendition:spread\">{}</meta>\n",
                escape_xml(spread)
            ));
        }
        if let Some(orientation) = present(self.info.layout.orientation.as_deref()) {
            opf.push_str(&format!(
                "    <meta property=\"rendition:orientation\">{}</meta>\n",
                escape_xml(orientation)
            ));
        }

        opf.push_str("  </metadata>\n");
    }
}

/// `Some` only for non-blank text.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn format_position(pos: f64) -> String {
    if pos.fract() == 0.0 {
        format!("{}", pos as i64)
    } else {
        format!("{}", pos)
    }
}
