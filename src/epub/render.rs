//! XHTML rendering of package pages.
//!
//! Units are rendered as flat prose: Markdown headings and horizontal rules
//! the model may have emitted are dropped, and only inline emphasis survives.

use serde::{Deserialize, Serialize};

use crate::chapter::{ChapterStyle, changed};
use crate::markdown::{convert, escape_xml};
use crate::model::{Character, Location, SceneSequel};

use super::metadata::{PackageMetadata, present};

/// Gap in hours above which a soft break separates two units.
const SOFT_BREAK_GAP_HOURS: f64 = 2.0;

/// Ornament used where the point of view changes inside a chapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneBreakStyle {
    /// `* * *`
    #[default]
    Asterisks,
    /// `⁂`
    Dinkus,
    /// `❦`
    Fleuron,
    /// `◇ ◆ ◇`
    Diamonds,
    /// A short centered rule.
    Rule,
}

impl SceneBreakStyle {
    fn markup(&self) -> &'static str {
        match self {
            SceneBreakStyle::Asterisks => {
                "<p class=\"scene-break\" role=\"separator\" aria-label=\"Scene break\">* * *</p>"
            }
            SceneBreakStyle::Dinkus => {
                "<p class=\"scene-break\" role=\"separator\" aria-label=\"Scene break\">\u{2042}</p>"
            }
            SceneBreakStyle::Fleuron => {
                "<p class=\"scene-break\" role=\"separator\" aria-label=\"Scene break\">\u{2766}</p>"
            }
            SceneBreakStyle::Diamonds => {
                "<p class=\"scene-break\" role=\"separator\" aria-label=\"Scene break\">\u{25C7} \u{25C6} \u{25C7}</p>"
            }
            SceneBreakStyle::Rule => "<hr class=\"scene-break\"/>",
        }
    }
}

/// Visual separation between two consecutive units of one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    None,
    /// Extra whitespace, no ornament.
    Soft,
    Ornament,
}

/// Choose the separator placed before `unit`.
pub fn separator_between(prev: &SceneSequel, unit: &SceneSequel) -> Separator {
    if changed(&prev.pov, &unit.pov) {
        Separator::Ornament
    } else if unit.start_hours - prev.end_hours() > SOFT_BREAK_GAP_HOURS
        || changed(&prev.location, &unit.location)
    {
        Separator::Soft
    } else {
        Separator::None
    }
}

/// Split unit prose into paragraphs of escaped, emphasis-converted XHTML.
pub fn paragraphs(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_heading(trimmed) || is_rule(trimmed) {
            flush(&mut current, &mut out);
            continue;
        }
        current.push(trimmed);
    }
    flush(&mut current, &mut out);
    out
}

fn flush(current: &mut Vec<&str>, out: &mut Vec<String>) {
    if !current.is_empty() {
        out.push(convert(&escape_xml(&current.join(" "))));
        current.clear();
    }
}

fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    (1..=6).contains(&hashes) && line[hashes..].starts_with(' ')
}

fn is_rule(line: &str) -> bool {
    let markers = line.chars().filter(|c| !c.is_whitespace()).count();
    markers >= 3
        && ['*', '-', '_']
            .iter()
            .any(|&m| line.chars().all(|c| c == m || c == ' '))
}

/// Heading text and TOC label for a chapter.
pub fn chapter_label(style: ChapterStyle, number: u32, title: Option<&str>) -> String {
    match (style, title) {
        (ChapterStyle::Titled, Some(title)) => format!("Chapter {}: {}", number, title),
        (ChapterStyle::Sections, _) => format!("Section {}", number),
        _ => format!("Chapter {}", number),
    }
}

/// Render the body of one chapter, or of the single untitled text when
/// `number` is `None`.
pub fn render_chapter(
    units: &[&SceneSequel],
    number: Option<u32>,
    title: Option<&str>,
    style: ChapterStyle,
    scene_break: SceneBreakStyle,
) -> String {
    let mut body = String::new();
    let mut no_indent_next = true;

    match number {
        Some(n) => {
            body.push_str(&format!(
                "<section epub:type=\"chapter\" role=\"doc-chapter\" id=\"chapter-{}\">\n",
                n
            ));
            match style {
                ChapterStyle::Sections => body.push_str(&format!(
                    "<h1 class=\"section-number\" title=\"Section {n}\">{n}</h1>\n"
                )),
                _ => body.push_str(&format!("<h1 class=\"chapter-number\">Chapter {}</h1>\n", n)),
            }
            if style == ChapterStyle::Titled
                && let Some(title) = title
            {
                body.push_str(&format!(
                    "<p class=\"chapter-title\">{}</p>\n",
                    escape_xml(title)
                ));
            }
        }
        None => body.push_str("<section epub:type=\"bodymatter\" id=\"text\">\n"),
    }

    for (i, unit) in units.iter().enumerate() {
        if i > 0 {
            match separator_between(units[i - 1], unit) {
                Separator::Ornament => {
                    body.push_str(scene_break.markup());
                    body.push('\n');
                    no_indent_next = true;
                }
                Separator::Soft => {
                    body.push_str("<div class=\"soft-break\"></div>\n");
                }
                Separator::None => {}
            }
        }

        for para in paragraphs(&unit.content) {
            if no_indent_next {
                body.push_str(&format!("<p class=\"no-indent\">{}</p>\n", para));
                no_indent_next = false;
            } else {
                body.push_str(&format!("<p>{}</p>\n", para));
            }
        }
    }

    body.push_str("</section>\n");
    body
}

/// Render the title page body.
pub fn render_title_page(metadata: &PackageMetadata) -> String {
    let mut body = String::from("<section epub:type=\"titlepage\" class=\"title-page\">\n");
    body.push_str(&format!(
        "<h1 class=\"book-title\">{}</h1>\n",
        escape_xml(&metadata.title)
    ));
    if let Some(series) = &metadata.info.series
        && let Some(name) = present(Some(series.name.as_str()))
    {
        let line = match series.position {
            Some(pos) if pos.fract() == 0.0 => format!("Book {} of {}", pos as i64, name),
            _ => name.to_string(),
        };
        body.push_str(&format!(
            "<p class=\"series\">{}</p>\n",
            escape_xml(&line)
        ));
    }
    body.push_str(&format!(
        "<p class=\"author\">{}</p>\n",
        escape_xml(&metadata.author)
    ));
    if let Some(publisher) = present(metadata.info.publisher.as_deref()) {
        body.push_str(&format!(
            "<p class=\"publisher\">{}</p>\n",
            escape_xml(publisher)
        ));
    }
    body.push_str("</section>\n");
    body
}

/// Render the copyright page body.
pub fn render_copyright(metadata: &PackageMetadata, ai_disclosure: Option<&str>) -> String {
    let mut body = String::from("<section epub:type=\"copyright-page\" class=\"copyright\">\n");
    body.push_str(&format!(
        "<p class=\"no-indent\">{}</p>\n",
        escape_xml(&metadata.title)
    ));
    body.push_str(&format!(
        "<p class=\"no-indent\">Copyright \u{00A9} {} {}</p>\n",
        metadata.year(),
        escape_xml(&metadata.author)
    ));
    if let Some(rights) = present(metadata.info.rights.as_deref()) {
        body.push_str(&format!(
            "<p class=\"no-indent\">{}</p>\n",
            escape_xml(rights)
        ));
    }
    if let Some(publisher) = present(metadata.info.publisher.as_deref()) {
        body.push_str(&format!(
            "<p class=\"no-indent\">Published by {}</p>\n",
            escape_xml(publisher)
        ));
    }
    if let Some(note) = present(ai_disclosure) {
        body.push_str(&format!(
            "<p class=\"no-indent disclosure\">{}</p>\n",
            escape_xml(note)
        ));
    }
    body.push_str(&format!(
        "<p class=\"no-indent identifier\">{}</p>\n",
        escape_xml(&metadata.identifier)
    ));
    body.push_str("</section>\n");
    body
}

/// Render the character glossary, with places listed after the cast.
pub fn render_glossary(characters: &[Character], locations: &[Location]) -> String {
    let mut body =
        String::from("<section epub:type=\"glossary\" role=\"doc-glossary\" class=\"glossary\">\n");
    body.push_str("<h1>Characters</h1>\n<dl>\n");
    for character in characters {
        body.push_str(&format!("<dt>{}</dt>\n", escape_xml(&character.name)));
        let mut parts = Vec::new();
        if let Some(role) = present(Some(character.role.as_str())) {
            parts.push(format!("<em>{}</em>", escape_xml(role)));
        }
        if let Some(bio) = present(Some(character.biography.as_str())) {
            parts.push(escape_xml(bio));
        }
        if !parts.is_empty() {
            body.push_str(&format!("<dd>{}</dd>\n", parts.join(" \u{2014} ")));
        }
    }
    body.push_str("</dl>\n");

    let places: Vec<&Location> = locations
        .iter()
        .filter(|l| !l.name.trim().is_empty())
        .collect();
    if !places.is_empty() {
        body.push_str("<h2>Places</h2>\n<dl>\n");
        for place in places {
            body.push_str(&format!("<dt>{}</dt>\n", escape_xml(&place.name)));
            if let Some(desc) = present(Some(place.description.as_str())) {
                body.push_str(&format!("<dd>{}</dd>\n", escape_xml(desc)));
            }
        }
        body.push_str("</dl>\n");
    }

    body.push_str("</section>\n");
    body
}

/// Wrap a body in a complete XHTML 5 document.
pub fn xhtml_document(title: &str, language: &str, body: &str) -> String {
    let lang = escape_xml(language);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="{lang}" lang="{lang}">
<head>
  <meta charset="UTF-8"/>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="style.css"/>
</head>
<body>
{body}</body>
</html>
"#,
        lang = lang,
        title = escape_xml(title),
        body = body
    )
}

/// Shared stylesheet.
pub const STYLESHEET: &str = r#"body {
  margin: 0 5%;
  font-family: serif;
  line-height: 1.5;
}
p {
  margin: 0;
  text-indent: 1.5em;
}
p.no-indent {
  text-indent: 0;
}
h1.chapter-number, h1.section-number {
  margin: 3em 0 0.5em;
  text-align: center;
  font-weight: normal;
}
p.chapter-title {
  margin-bottom: 2em;
  text-align: center;
  text-indent: 0;
  font-style: italic;
}
.scene-break {
  margin: 1.5em 0;
  text-align: center;
  text-indent: 0;
}
hr.scene-break {
  width: 25%;
  margin: 1.5em auto;
  border: 0;
  border-top: 1px solid currentColor;
}
div.soft-break {
  height: 1.5em;
}
.title-page {
  margin-top: 30%;
  text-align: center;
}
.title-page p {
  text-indent: 0;
}
.book-title {
  font-size: 2em;
}
.copyright {
  margin-top: 50%;
  font-size: 0.85em;
}
.glossary dt {
  margin-top: 1em;
  font-weight: bold;
}
.glossary dd {
  margin-left: 1.5em;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SceneBeat;

    fn unit(id: &str, pov: &str, start: f64, content: &str) -> SceneSequel {
        SceneSequel::scene(id, "Act 1", SceneBeat::new("g", "c", "d"))
            .with_pov(pov)
            .with_timing(start, 1.0)
            .with_content(content)
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let paras = paragraphs("First line\ncontinues.\n\nSecond *one*.\n\n\n");
        assert_eq!(
            paras,
            vec!["First line continues.", "Second <em>one</em>."]
        );
    }

    #[test]
    fn test_paragraphs_drop_headings_and_rules() {
        let paras = paragraphs("## Scene 3\nShe ran.\n\n***\n\n#hashtag stays\n---");
        assert_eq!(paras, vec!["She ran.", "#hashtag stays"]);
    }

    #[test]
    fn test_paragraphs_escape_before_convert() {
        let paras = paragraphs("Tom & <Jerry> said **no**");
        assert_eq!(
            paras,
            vec!["Tom &amp; &lt;Jerry&gt; said <strong>no</strong>"]
        );
    }

    #[test]
    fn test_separator_rules() {
        let a = unit("a", "Maya", 0.0, "x").with_location("Dock");
        assert_eq!(separator_between(&a, &unit("b", "Bob", 1.0, "x")), Separator::Ornament);
        assert_eq!(separator_between(&a, &unit("b", "Maya", 3.5, "x")), Separator::Soft);
        assert_eq!(
            separator_between(&a, &unit("b", "Maya", 1.0, "x").with_location("Tower")),
            Separator::Soft
        );
        assert_eq!(separator_between(&a, &unit("b", "Maya", 3.0, "x")), Separator::None);
    }

    #[test]
    fn test_chapter_first_paragraph_not_indented() {
        let a = unit("a", "Maya", 0.0, "One.\n\nTwo.");
        let b = unit("b", "Bob", 1.0, "Three.");
        let c = unit("c", "Bob", 10.0, "Four.");
        let body = render_chapter(
            &[&a, &b, &c],
            Some(2),
            None,
            ChapterStyle::Numbered,
            SceneBreakStyle::Asterisks,
        );

        assert!(body.contains("<h1 class=\"chapter-number\">Chapter 2</h1>"));
        assert!(body.contains("<p class=\"no-indent\">One.</p>\n<p>Two.</p>"));
        assert!(body.contains("* * *</p>\n<p class=\"no-indent\">Three.</p>"));
        assert!(body.contains("<div class=\"soft-break\"></div>\n<p>Four.</p>"));
    }

    #[test]
    fn test_titled_heading() {
        let a = unit("a", "Maya", 0.0, "One.");
        let body = render_chapter(
            &[&a],
            Some(1),
            Some("Salt & Iron"),
            ChapterStyle::Titled,
            SceneBreakStyle::Rule,
        );
        assert!(body.contains("<p class=\"chapter-title\">Salt &amp; Iron</p>"));
        assert_eq!(
            chapter_label(ChapterStyle::Titled, 1, Some("Salt")),
            "Chapter 1: Salt"
        );
        assert_eq!(chapter_label(ChapterStyle::Sections, 4, None), "Section 4");
    }

    #[test]
    fn test_glossary_lists_places() {
        let characters = vec![Character::new("Maya", "courier")];
        let locations = vec![Location::new("The Dock", "Wet planks.")];
        let body = render_glossary(&characters, &locations);
        assert!(body.contains("<dt>Maya</dt>"));
        assert!(body.contains("<dd><em>courier</em></dd>"));
        assert!(body.contains("<h2>Places</h2>"));

        let without = render_glossary(&characters, &[]);
        assert!(!without.contains("Places"));
    }

    #[test]
    fn test_xhtml_document_preamble() {
        let doc = xhtml_document("A & B", "en", "<p>x</p>\n");
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(doc.contains("<title>A &amp; B</title>"));
        assert!(doc.trim_end().ends_with("</html>"));
    }
}
