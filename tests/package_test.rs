use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;
use tempfile::TempDir;
use zip::ZipArchive;

use novelpress::epub::{Contributor, Series};
use novelpress::{
    Character, ChapterBreak, ChapterDecider, ChapterPolicy, ChapterStyle, Error, JsonFileStore,
    Location, Manuscript, MemoryStore, Outline, OutputTarget, PackageConfig, PackageFormatter,
    SceneBeat, SceneSequel, StoreKey, StoryMetadata, TitleStore, validate,
};

const PROJECT: &str = include_str!("fixtures/project.json");

#[derive(Deserialize)]
struct Project {
    story: StoryMetadata,
    characters: Vec<Character>,
    locations: Vec<Location>,
    outline: Outline,
    units: Vec<SceneSequel>,
}

fn load_project() -> Project {
    let mut project: Project = serde_json::from_str(PROJECT).unwrap();
    project.outline.validate().unwrap();
    for unit in &mut project.units {
        if unit.act.is_empty() {
            unit.act = project.outline.act_for_unit(&unit.id).unwrap().to_string();
        }
    }
    project
}

fn small_policy() -> ChapterPolicy {
    ChapterPolicy::new(10, 5, 40)
}

fn read_entry(path: &Path, name: &str) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

fn entry_names(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let archive = ZipArchive::new(file).unwrap();
    archive.file_names().map(str::to_string).collect()
}

fn manual_breaks(ids: &[&str]) -> Vec<ChapterBreak> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| ChapterBreak {
            unit_id: id.to_string(),
            chapter: i as u32 + 1,
            title: None,
            reason: "manual_break".to_string(),
        })
        .collect()
}

#[test]
fn test_fixture_units_deserialize() {
    let project = load_project();
    assert_eq!(project.units.len(), 3);
    assert!(!project.units[0].is_sequel());
    assert!(project.units[1].is_sequel());
    assert_eq!(project.units[2].act, "Part 1 - Fog");
    assert_eq!(project.units[2].hints.title.as_deref(), Some("Aground"));
    assert_eq!(project.units[2].day_number(), 2);
    for unit in &project.units {
        unit.validate().unwrap();
    }
}

#[test]
fn test_build_and_validate() {
    let project = load_project();
    let breaks = ChapterDecider::new(small_policy()).decide(
        &project.units,
        ChapterStyle::Numbered,
        &HashSet::new(),
    );
    let ids: Vec<&str> = breaks.iter().map(|b| b.unit_id.as_str()).collect();
    assert_eq!(ids, vec!["u1", "u3"]);
    assert_eq!(breaks[0].reason, "story_start");
    assert!(breaks[1].reason.starts_with("strong break point"));

    let manuscript = Manuscript::new(&project.story, &project.units)
        .with_characters(&project.characters)
        .with_locations(&project.locations);
    let dir = TempDir::new().unwrap();
    let path = PackageFormatter::new(PackageConfig::default())
        .format(
            &manuscript,
            &breaks,
            &OutputTarget::new(dir.path()),
            None,
            &mut MemoryStore::new(),
        )
        .unwrap();

    // Falls back to the working title without a generator.
    assert_eq!(path.file_name().unwrap(), "the-shifting-strait.epub");

    let report = validate(&path);
    assert!(report.valid, "{:?}", report.issues);
    assert_eq!(report.structure.title.as_deref(), Some("The Shifting Strait"));
    assert!(report.structure.has_nav && report.structure.has_ncx);

    let names = entry_names(&path);
    assert_eq!(names[0], "mimetype");
    let chapters = names
        .iter()
        .filter(|n| n.starts_with("OEBPS/chapter_"))
        .count();
    assert_eq!(chapters, breaks.len());

    // title, copyright, two chapters, glossary
    assert_eq!(report.structure.spine_length, 5);

    let opf = read_entry(&path, "OEBPS/content.opf");
    let spine_chapters = opf.matches("<itemref idref=\"chapter-").count();
    assert_eq!(spine_chapters, breaks.len());
    assert!(opf.contains("<dc:subject>Fantasy</dc:subject>"));
    assert_eq!(opf.matches("<dc:subject>").count(), 3);
}

#[test]
fn test_chapter_content() {
    let project = load_project();
    let manuscript = Manuscript::new(&project.story, &project.units);
    let dir = TempDir::new().unwrap();
    let path = PackageFormatter::new(PackageConfig::default())
        .format(
            &manuscript,
            &manual_breaks(&["u1"]),
            &OutputTarget::new(dir.path()).with_filename("one.epub"),
            None,
            &mut MemoryStore::new(),
        )
        .unwrap();

    let chapter = read_entry(&path, "OEBPS/chapter_001.xhtml");
    assert!(chapter.starts_with("<?xml"));
    assert!(chapter.contains("<p class=\"no-indent\">Mara ran for the <em>last</em> ferry.</p>"));
    assert!(chapter.contains("<p>The gate was already shut.</p>"));
    assert!(chapter.contains("<strong>swore</strong>"));
    // Mara -> Tomas
    assert_eq!(chapter.matches("class=\"scene-break\"").count(), 1);
}

#[test]
fn test_titled_chapters() {
    let project = load_project();
    let breaks = ChapterDecider::new(small_policy()).decide(
        &project.units,
        ChapterStyle::Titled,
        &HashSet::new(),
    );
    assert_eq!(breaks[0].title.as_deref(), Some("The Crossing"));
    assert_eq!(breaks[1].title.as_deref(), Some("Aground"));

    let manuscript = Manuscript::new(&project.story, &project.units);
    let dir = TempDir::new().unwrap();
    let path = PackageFormatter::new(PackageConfig::default())
        .with_chapter_style(ChapterStyle::Titled)
        .format(
            &manuscript,
            &breaks,
            &OutputTarget::new(dir.path()),
            None,
            &mut MemoryStore::new(),
        )
        .unwrap();

    let nav = read_entry(&path, "OEBPS/nav.xhtml");
    assert!(nav.contains(">Chapter 2: Aground</a>"));
    let chapter = read_entry(&path, "OEBPS/chapter_002.xhtml");
    assert!(chapter.contains("<p class=\"chapter-title\">Aground</p>"));
}

#[test]
fn test_glossary_only_with_characters() {
    let project = load_project();
    let dir = TempDir::new().unwrap();
    let formatter = PackageFormatter::new(PackageConfig::default());

    let with = formatter
        .format(
            &Manuscript::new(&project.story, &project.units)
                .with_characters(&project.characters)
                .with_locations(&project.locations),
            &manual_breaks(&["u1"]),
            &OutputTarget::new(dir.path()).with_filename("with.epub"),
            None,
            &mut MemoryStore::new(),
        )
        .unwrap();
    let glossary = read_entry(&with, "OEBPS/glossary.xhtml");
    assert!(glossary.contains("<dt>Mara Vell</dt>"));
    assert!(glossary.contains("<dt>Harrow Quay</dt>"));

    // Locations alone do not make a glossary.
    let without = formatter
        .format(
            &Manuscript::new(&project.story, &project.units).with_locations(&project.locations),
            &manual_breaks(&["u1"]),
            &OutputTarget::new(dir.path()).with_filename("without.epub"),
            None,
            &mut MemoryStore::new(),
        )
        .unwrap();
    assert!(!entry_names(&without).iter().any(|n| n.contains("glossary")));
    assert!(validate(&without).valid);
}

#[test]
fn test_optional_metadata_omitted() {
    let story = StoryMetadata::default();
    let units = vec![
        SceneSequel::scene("a", "Act", SceneBeat::new("g", "c", "d")).with_content("Text."),
    ];
    let dir = TempDir::new().unwrap();
    let path = PackageFormatter::new(PackageConfig::default())
        .format(
            &Manuscript::new(&story, &units),
            &manual_breaks(&["a"]),
            &OutputTarget::new(dir.path()),
            Some("Bare"),
            &mut MemoryStore::new(),
        )
        .unwrap();

    let opf = read_entry(&path, "OEBPS/content.opf");
    for absent in [
        "dc:publisher",
        "dc:rights",
        "dc:description",
        "dc:subject",
        "dc:contributor",
        "belongs-to-collection",
        "schema:accessMode",
        "schema:accessibilityHazard",
        "rendition:spread",
        "rendition:orientation",
    ] {
        assert!(!opf.contains(absent), "unexpected {absent}");
    }
    assert!(opf.contains("<dc:creator id=\"creator\">Anonymous</dc:creator>"));
    assert!(opf.contains("rendition:layout\">reflowable"));
    assert!(opf.contains("dcterms:modified"));
}

#[test]
fn test_optional_metadata_present() {
    let story = StoryMetadata::default();
    let units = vec![
        SceneSequel::scene("a", "Act", SceneBeat::new("g", "c", "d")).with_content("Text."),
    ];
    let mut config = PackageConfig::default();
    config.publication.publisher = Some("Fogbound Press".to_string());
    config.publication.contributors = vec![Contributor {
        name: "Ed Itor".to_string(),
        role: Some("edt".to_string()),
    }];
    config.publication.series = Some(Series {
        name: "Strait Tales".to_string(),
        position: Some(2.0),
    });
    config.publication.accessibility.access_modes = vec!["textual".to_string()];
    config.publication.layout.spread = Some("none".to_string());

    let dir = TempDir::new().unwrap();
    let path = PackageFormatter::new(config)
        .format(
            &Manuscript::new(&story, &units),
            &manual_breaks(&["a"]),
            &OutputTarget::new(dir.path()),
            Some("Full"),
            &mut MemoryStore::new(),
        )
        .unwrap();

    let opf = read_entry(&path, "OEBPS/content.opf");
    assert!(opf.contains(">Fogbound Press</dc:publisher>"));
    assert!(opf.contains(">Ed Itor</dc:contributor>"));
    assert!(opf.contains(">edt</meta>"));
    assert!(opf.contains(">Strait Tales</meta>"));
    assert!(opf.contains(">2</meta>"));
    assert!(opf.contains(">textual</meta>"));
    assert!(opf.contains("rendition:spread\">none</meta>"));

    let title_page = read_entry(&path, "OEBPS/title.xhtml");
    assert!(title_page.contains("Book 2 of Strait Tales"));
}

#[test]
fn test_identifier_unique_per_generation() {
    let project = load_project();
    let manuscript = Manuscript::new(&project.story, &project.units);
    let dir = TempDir::new().unwrap();
    let formatter = PackageFormatter::new(PackageConfig::default());

    let mut ids = Vec::new();
    for name in ["one.epub", "two.epub"] {
        let path = formatter
            .format(
                &manuscript,
                &manual_breaks(&["u1"]),
                &OutputTarget::new(dir.path()).with_filename(name),
                None,
                &mut MemoryStore::new(),
            )
            .unwrap();
        let opf = read_entry(&path, "OEBPS/content.opf");
        let start = opf.find("urn:uuid:").unwrap();
        ids.push(opf[start..start + 45].to_string());
    }
    assert_ne!(ids[0], ids[1]);
}

#[test]
fn test_generated_title_is_cached() {
    let project = load_project();
    let manuscript = Manuscript::new(&project.story, &project.units);
    let dir = TempDir::new().unwrap();
    let status = dir.path().join("status.json");
    std::fs::write(&status, r#"{"stage": "drafted"}"#).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let formatter = PackageFormatter::new(PackageConfig::default()).with_title_generator(
        move |_: &Manuscript<'_>| -> novelpress::Result<String> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("Title: \"Salt and Fog\"".to_string())
        },
    );

    let mut store = JsonFileStore::new(&status);
    let first = formatter
        .format(
            &manuscript,
            &manual_breaks(&["u1"]),
            &OutputTarget::new(dir.path()),
            None,
            &mut store,
        )
        .unwrap();
    assert_eq!(first.file_name().unwrap(), "salt-and-fog.epub");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A fresh store over the same file sees the cached title.
    let mut store = JsonFileStore::new(&status);
    assert_eq!(
        store.get(StoreKey::GeneratedTitle).as_deref(),
        Some("Salt and Fog")
    );
    assert_eq!(
        store.get(StoreKey::OutputFilename).as_deref(),
        Some("salt-and-fog.epub")
    );
    formatter
        .format(
            &manuscript,
            &manual_breaks(&["u1"]),
            &OutputTarget::new(dir.path()).with_filename("again.epub"),
            None,
            &mut store,
        )
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&status).unwrap()).unwrap();
    assert_eq!(raw["stage"], "drafted");
}

#[test]
fn test_failing_generator_falls_back() {
    let project = load_project();
    let manuscript = Manuscript::new(&project.story, &project.units);
    let dir = TempDir::new().unwrap();
    let mut store = MemoryStore::new();

    let path = PackageFormatter::new(PackageConfig::default())
        .with_title_generator(|_: &Manuscript<'_>| -> novelpress::Result<String> {
            Err(Error::TitleGeneration("model unavailable".to_string()))
        })
        .format(
            &manuscript,
            &manual_breaks(&["u1"]),
            &OutputTarget::new(dir.path()),
            None,
            &mut store,
        )
        .unwrap();

    assert_eq!(path.file_name().unwrap(), "the-shifting-strait.epub");
    assert_eq!(store.get(StoreKey::GeneratedTitle), None);
}

#[test]
fn test_no_chapters_single_text() {
    let project = load_project();
    let breaks = ChapterDecider::new(small_policy()).decide(
        &project.units,
        ChapterStyle::None,
        &HashSet::new(),
    );
    assert!(breaks.is_empty());

    let dir = TempDir::new().unwrap();
    let path = PackageFormatter::new(PackageConfig::default())
        .with_chapter_style(ChapterStyle::None)
        .format(
            &Manuscript::new(&project.story, &project.units),
            &breaks,
            &OutputTarget::new(dir.path()),
            Some("Continuous"),
            &mut MemoryStore::new(),
        )
        .unwrap();

    let names = entry_names(&path);
    assert!(names.contains(&"OEBPS/text.xhtml".to_string()));
    assert!(!names.iter().any(|n| n.starts_with("OEBPS/chapter_")));
    assert!(validate(&path).valid);
}

#[test]
fn test_invalid_breaks_rejected() {
    let project = load_project();
    let dir = TempDir::new().unwrap();
    let err = PackageFormatter::new(PackageConfig::default())
        .format(
            &Manuscript::new(&project.story, &project.units),
            &manual_breaks(&["u2"]),
            &OutputTarget::new(dir.path()),
            None,
            &mut MemoryStore::new(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidBreaks(_)));
}
