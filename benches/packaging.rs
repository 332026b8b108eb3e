//! Benchmarks for chapter planning and packaging.
//!
//! Run with: cargo bench

use std::collections::HashSet;
use std::io::Cursor;

use criterion::{Criterion, criterion_group, criterion_main};

use novelpress::epub::{PackageMetadata, write_package_to_writer};
use novelpress::markdown::convert;
use novelpress::{
    ChapterDecider, ChapterPolicy, ChapterStyle, Manuscript, PackageConfig, PackageFormatter,
    SceneBeat, SceneSequel, SequelBeat, StoryMetadata,
};

const PARAGRAPH: &str = "The tide came in *fast* that night, and the pilot \
    watched it from the quay with **nothing** left to lose. ";

/// A novel-sized run of alternating scenes and sequels.
fn sample_units(count: usize) -> Vec<SceneSequel> {
    let povs = ["Mara", "Tomas", "Ilse"];
    let places = ["Harrow Quay", "The Strait", "Lantern Rock"];
    (0..count)
        .map(|i| {
            let id = format!("u{i}");
            let act = format!("Act {}", i * 3 / count + 1);
            let unit = if i % 2 == 0 {
                SceneSequel::scene(id, act, SceneBeat::new("goal", "conflict", "disaster"))
            } else {
                SceneSequel::sequel(id, act, SequelBeat::reaction("reaction"))
            };
            let content = vec![PARAGRAPH.repeat(8); 6].join("\n\n");
            unit.with_pov(povs[i / 4 % povs.len()])
                .with_location(places[i / 3 % places.len()])
                .with_timing(i as f64 * 5.0, 2.0)
                .with_content(content)
        })
        .collect()
}

// ============================================================================
// Planning
// ============================================================================

fn bench_decide(c: &mut Criterion) {
    let units = sample_units(200);
    let decider = ChapterDecider::new(ChapterPolicy::default());
    let forced = HashSet::new();

    c.bench_function("decide_200_units", |b| {
        b.iter(|| decider.decide(&units, ChapterStyle::Numbered, &forced));
    });
}

fn bench_convert_emphasis(c: &mut Criterion) {
    let text = PARAGRAPH.repeat(50);

    c.bench_function("convert_emphasis", |b| {
        b.iter(|| convert(&text));
    });
}

// ============================================================================
// Packaging
// ============================================================================

fn bench_package(c: &mut Criterion) {
    let story = StoryMetadata::default();
    let units = sample_units(200);
    let manuscript = Manuscript::new(&story, &units);
    let breaks = ChapterDecider::new(ChapterPolicy::default()).decide(
        &units,
        ChapterStyle::Numbered,
        &HashSet::new(),
    );
    let formatter = PackageFormatter::new(PackageConfig::default());

    c.bench_function("package_200_units", |b| {
        b.iter(|| {
            let metadata = PackageMetadata::assemble(
                &formatter.config().publication,
                "Benchmark",
                &manuscript,
            );
            let package = formatter.build_package(&manuscript, &breaks, metadata);
            let mut output = Cursor::new(Vec::new());
            write_package_to_writer(&package, &mut output).unwrap();
        });
    });
}

criterion_group!(benches, bench_decide, bench_convert_emphasis, bench_package);
criterion_main!(benches);
