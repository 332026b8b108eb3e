//! novelpress - plan chapters and package a drafted novel as EPUB

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Deserialize;

use novelpress::{
    Character, ChapterDecider, JsonFileStore, Location, Manuscript, Outline, OutputTarget,
    PackageFormatter, PressConfig, SceneSequel, StoryMetadata, validate,
};

/// Name of the key-value file kept next to a project file.
const STATUS_FILE: &str = "status.json";

#[derive(Parser)]
#[command(name = "novelpress")]
#[command(version, about = "Chapter planning and EPUB packaging for drafted novels", long_about = None)]
#[command(after_help = "EXAMPLES:
    novelpress build story.json -o out      Package a project
    novelpress validate out/the-story.epub  Check a finished package")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan chapters and write an EPUB
    Build {
        /// Project file (JSON)
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Output file name (defaults to the slugified title)
        #[arg(long)]
        filename: Option<String>,

        /// Use this title instead of the cached or generated one
        #[arg(long)]
        title: Option<String>,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Check the structure of an EPUB
    Validate {
        #[arg(value_name = "EPUB")]
        epub: PathBuf,
    },
}

/// Everything the content-generation stage hands over.
#[derive(Deserialize)]
struct Project {
    story: StoryMetadata,
    #[serde(default)]
    characters: Vec<Character>,
    #[serde(default)]
    locations: Vec<Location>,
    units: Vec<SceneSequel>,
    #[serde(default)]
    outline: Option<Outline>,
    /// Unit ids that must open a chapter.
    #[serde(default)]
    forced_breaks: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Build {
            project,
            output,
            filename,
            title,
            config,
        } => build(
            &project,
            OutputTarget {
                dir: output,
                filename,
            },
            title.as_deref(),
            config.as_deref(),
        ),
        Command::Validate { epub } => {
            return if check(&epub) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build(
    project_path: &Path,
    target: OutputTarget,
    title: Option<&str>,
    config_path: Option<&Path>,
) -> novelpress::Result<()> {
    let config = match config_path {
        Some(path) => PressConfig::load(path)?,
        None => PressConfig::default(),
    };

    let text = std::fs::read_to_string(project_path)?;
    let mut project: Project = serde_json::from_str(&text)?;

    if let Some(outline) = &project.outline {
        outline.validate()?;
        for unit in &mut project.units {
            if unit.act.trim().is_empty()
                && let Some(act) = outline.act_for_unit(&unit.id)
            {
                unit.act = act.to_string();
            }
        }
    }

    let forced: HashSet<String> = project.forced_breaks.iter().cloned().collect();
    let breaks = ChapterDecider::new(config.chapters.policy).decide(
        &project.units,
        config.chapters.style,
        &forced,
    );
    for b in &breaks {
        println!("Chapter {:>3}  {:<12} {}", b.chapter, b.unit_id, b.reason);
    }

    let manuscript = Manuscript::new(&project.story, &project.units)
        .with_characters(&project.characters)
        .with_locations(&project.locations);

    let status = project_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(STATUS_FILE);
    let mut store = JsonFileStore::new(status);

    let path = PackageFormatter::from_config(&config).format(
        &manuscript,
        &breaks,
        &target,
        title,
        &mut store,
    )?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn check(path: &Path) -> bool {
    let report = validate(path);
    let s = &report.structure;

    println!("File: {}", path.display());
    if let Some(title) = &s.title {
        println!("Title: {title}");
    }
    if let Some(package) = &s.package_path {
        println!("Package: {package}");
    }
    println!("Entries: {}", s.entry_count);
    println!("Manifest items: {}", s.manifest_items);
    println!("Spine: {}", s.spine_length);
    println!("Content documents: {}", s.content_documents);
    println!("Navigation: nav={} ncx={}", s.has_nav, s.has_ncx);

    if report.valid {
        println!("Valid");
    } else {
        println!("{} issue(s):", report.issues.len());
        for issue in &report.issues {
            println!("  - {issue}");
        }
    }
    report.valid
}
