use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anime_stats::loader::{self, CleanedTable, LoadOptions};
use anime_stats::params::{Metric, ParameterSet};
use anime_stats::pipeline::{self, default_genres, default_sources};
use criterion::{Criterion, criterion_group, criterion_main};
use tempfile::TempDir;

const SOURCES: &[&str] = &["Manga", "Light novel", "Novel", "Other", "Original", "Game"];
const GENRES: &[&str] = &["Action, Drama", "Comedy", "Romance, Comedy", "Sci-Fi", "Hentai"];
const MONTHS: &[&str] = &["Jan", "Apr", "Jul", "Oct"];

fn generate_anime(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("anime.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(
        file,
        "anime_id,Name,Score,Genres,Source,Aired,Members,Favorites,Popularity"
    )
    .expect("header");
    for i in 0..rows {
        let source = SOURCES[i % SOURCES.len()];
        let genres = GENRES[i % GENRES.len()];
        let month = MONTHS[i % MONTHS.len()];
        let year = 1960 + (i % 66);
        let score = if i % 97 == 0 {
            "UNKNOWN".to_string()
        } else {
            format!("{:.2}", 5.0 + (i % 50) as f64 / 10.0)
        };
        let aired = if i % 2 == 0 {
            format!("{month} {}, {year}", (i % 28) + 1)
        } else {
            format!("{month} 1, {year} to Dec 20, {}", year + 1)
        };
        writeln!(
            file,
            "{i},Show {i},{score},\"{genres}\",{source},\"{aired}\",{},{},{}",
            (i * 37) % 3_000_000,
            (i * 7) % 50_000,
            (i % 20_000) + 1
        )
        .expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_pipelines(c: &mut Criterion) {
    let (temp_dir, csv_path) = generate_anime(25_000);

    c.bench_function("load_and_clean", |b| {
        b.iter(|| {
            loader::load_cleaned_table(&csv_path, &LoadOptions::default()).expect("load")
        });
    });

    let table: CleanedTable =
        loader::load_cleaned_table(&csv_path, &LoadOptions::default()).expect("load");
    let params = ParameterSet {
        year: 2010,
        timeline_axis: Metric::Popularity,
        genre_axis: Metric::Favorites,
    };
    let sources = default_sources();
    let genres = default_genres();

    let mut group = c.benchmark_group("pipelines");
    group.bench_function("timeline", |b| {
        b.iter(|| pipeline::timeline(&table, &params, &sources));
    });
    group.bench_function("score_vs_members", |b| {
        b.iter(|| pipeline::score_vs_members(&table, &params, &sources));
    });
    group.bench_function("genre_bar", |b| {
        b.iter(|| pipeline::genre_bar(&table, &params, &genres));
    });
    group.finish();

    drop(temp_dir);
}

criterion_group!(benches, bench_pipelines);
criterion_main!(benches);
