//! Aggregation pipelines over the cleaned table.
//!
//! Each pipeline is a pure function of `(&CleanedTable, &ParameterSet)`:
//! filter, group, aggregate one metric, then sort by release year. Groups are
//! collected in ascending key order and the final sort is stable, so rows
//! sharing a release year keep their grouping-key order.

use std::{cmp::Ordering, collections::BTreeMap};

use log::debug;
use serde::Serialize;

use crate::{
    loader::{AnimeRecord, CleanedTable},
    params::{Metric, ParameterSet},
};

pub const DEFAULT_SOURCES: &[&str] = &["Manga", "Light novel", "Novel", "Other"];

pub const DEFAULT_GENRES: &[&str] = &[
    "Action",
    "Adventure",
    "Comedy",
    "Drama",
    "Sports",
    "Award Winning",
    "Sci-Fi",
    "Horror",
    "Boys Love",
    "Ecchi",
    "Slice of Life",
    "Fantasy",
    "Avant Garde",
    "Mystery",
    "Supernatural",
    "Suspense",
    "Romance",
    "Gourmet",
    "Girls Love",
];

/// A row that can be laid out as text cells under fixed headers.
pub trait TableRow {
    fn cells(&self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedTable<R> {
    pub headers: Vec<String>,
    pub rows: Vec<R>,
}

impl<R: TableRow> AggregatedTable<R> {
    fn new(headers: &[&str], rows: Vec<R>) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell_rows(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(TableRow::cells).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRow {
    pub source: String,
    pub release: i32,
    pub value: f64,
}

impl TableRow for TimelineRow {
    fn cells(&self) -> Vec<String> {
        vec![
            self.source.clone(),
            self.release.to_string(),
            format_number(self.value),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MembersRow {
    pub source: String,
    pub release: i32,
    pub score: f64,
    pub members_mean: f64,
    pub members: String,
}

impl TableRow for MembersRow {
    fn cells(&self) -> Vec<String> {
        vec![
            self.source.clone(),
            self.release.to_string(),
            format_number(self.score),
            self.members.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreRow {
    pub release: i32,
    pub genre: String,
    pub value: f64,
}

impl TableRow for GenreRow {
    fn cells(&self) -> Vec<String> {
        vec![
            self.release.to_string(),
            self.genre.clone(),
            format_number(self.value),
        ]
    }
}

pub type TimelineTable = AggregatedTable<TimelineRow>;
pub type MembersTable = AggregatedTable<MembersRow>;
pub type GenreTable = AggregatedTable<GenreRow>;

/// Float grouping key ordered with `total_cmp`.
#[derive(Debug, Clone, Copy)]
struct ScoreKey(f64);

impl PartialEq for ScoreKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoreKey {}

impl Ord for ScoreKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for ScoreKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

fn in_sources<'a>(
    table: &'a CleanedTable,
    params: &ParameterSet,
    sources: &'a [String],
) -> impl Iterator<Item = &'a AnimeRecord> {
    let year = params.year;
    table
        .records()
        .filter(move |record| record.release <= year)
        .filter(move |record| sources.iter().any(|source| *source == record.source))
}

/// Mean of the selected axis metric per `(Source, Release)` up to the year bound.
pub fn timeline(table: &CleanedTable, params: &ParameterSet, sources: &[String]) -> TimelineTable {
    let metric = params.timeline_axis;
    let mut groups: BTreeMap<(&str, i32), MeanAccumulator> = BTreeMap::new();
    for record in in_sources(table, params, sources) {
        groups
            .entry((record.source.as_str(), record.release))
            .or_default()
            .push(record.metric(metric));
    }
    let mut rows = groups
        .into_iter()
        .map(|((source, release), acc)| TimelineRow {
            source: source.to_string(),
            release,
            value: acc.mean(),
        })
        .collect::<Vec<_>>();
    rows.sort_by_key(|row| row.release);
    debug!(
        "timeline: {} row(s) for year <= {} by {metric}",
        rows.len(),
        params.year
    );
    AggregatedTable::new(&["Source", "Release", metric.column_name()], rows)
}

/// Mean `Members` per `(Source, Release, Score)` up to the year bound.
pub fn score_vs_members(
    table: &CleanedTable,
    params: &ParameterSet,
    sources: &[String],
) -> MembersTable {
    let mut groups: BTreeMap<(&str, i32, ScoreKey), MeanAccumulator> = BTreeMap::new();
    for record in in_sources(table, params, sources) {
        groups
            .entry((
                record.source.as_str(),
                record.release,
                ScoreKey(record.score),
            ))
            .or_default()
            .push(record.members);
    }
    let mut rows = groups
        .into_iter()
        .map(|((source, release, score), acc)| {
            let members_mean = acc.mean();
            MembersRow {
                source: source.to_string(),
                release,
                score: score.0,
                members_mean,
                members: format_members(members_mean),
            }
        })
        .collect::<Vec<_>>();
    rows.sort_by_key(|row| row.release);
    debug!(
        "score_vs_members: {} row(s) for year <= {}",
        rows.len(),
        params.year
    );
    AggregatedTable::new(&["Source", "Release", "Score", "Members"], rows)
}

/// Sum of the selected axis metric per `(Release, Genres)` for exactly the year bound.
pub fn genre_bar(table: &CleanedTable, params: &ParameterSet, genres: &[String]) -> GenreTable {
    let metric = params.genre_axis;
    let year = params.year;
    let mut groups: BTreeMap<(i32, &str), f64> = BTreeMap::new();
    for record in table
        .records()
        .filter(|record| record.release == year)
        .filter(|record| genres.iter().any(|genre| *genre == record.genre))
    {
        *groups
            .entry((record.release, record.genre.as_str()))
            .or_insert(0.0) += record.metric(metric);
    }
    let mut rows = groups
        .into_iter()
        .map(|((release, genre), value)| GenreRow {
            release,
            genre: genre.to_string(),
            value,
        })
        .collect::<Vec<_>>();
    rows.sort_by_key(|row| row.release);
    debug!("genre_bar: {} row(s) for year == {year} by {metric}", rows.len());
    AggregatedTable::new(&["Release", "Genres", metric.column_name()], rows)
}

/// Human-readable magnitude: `2.3M`, `1.5K`, or the integer part below 1000.
pub fn format_members(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{}", value.trunc() as i64)
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

pub fn default_sources() -> Vec<String> {
    DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()
}

pub fn default_genres() -> Vec<String> {
    DEFAULT_GENRES.iter().map(|s| s.to_string()).collect()
}
