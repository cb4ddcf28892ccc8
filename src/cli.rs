use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::params::Metric;

#[derive(Debug, Parser)]
#[command(author, version, about = "Clean an anime dataset and explore it as a text dashboard", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write the cleaned dataset (UNKNOWN rows dropped, Release derived) as CSV
    Clean(CleanArgs),
    /// Mean Favorites/Popularity per source and release year, up to a year
    Timeline(TimelineArgs),
    /// Mean members per source, release year and score, up to a year
    Members(MembersArgs),
    /// Summed Favorites/Popularity per genre for a single release year
    Genres(GenresArgs),
    /// Render every dashboard view, optionally reacting to commands on stdin
    Dashboard(DashboardArgs),
    /// Write all dashboard tables and the current parameters as JSON
    Export(ExportArgs),
    /// Print the effective dashboard configuration as YAML
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Input anime CSV (defaults to the dataset named in the config)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Dashboard configuration YAML file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Limit number of data rows to scan (useful for prototyping)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct TimelineArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Inclusive upper bound on the release year
    #[arg(long)]
    pub year: Option<i32>,
    /// Metric to average
    #[arg(long, value_enum, ignore_case = true)]
    pub axis: Option<Metric>,
    /// 1-based page of the table to display
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Emit JSON instead of a text table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct MembersArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Inclusive upper bound on the release year
    #[arg(long)]
    pub year: Option<i32>,
    /// Emit JSON instead of a text table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct GenresArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Release year to report
    #[arg(long)]
    pub year: Option<i32>,
    /// Metric to sum
    #[arg(long, value_enum, ignore_case = true)]
    pub axis: Option<Metric>,
    /// Emit JSON instead of a text table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Initial year slider value
    #[arg(long)]
    pub year: Option<i32>,
    /// Initial metric for the time series view
    #[arg(long = "timeline-axis", value_enum, ignore_case = true)]
    pub timeline_axis: Option<Metric>,
    /// Initial metric for the genre view
    #[arg(long = "genre-axis", value_enum, ignore_case = true)]
    pub genre_axis: Option<Metric>,
    /// Read parameter changes from stdin and redraw affected views
    #[arg(long)]
    pub interactive: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output JSON file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Year slider value
    #[arg(long)]
    pub year: Option<i32>,
    /// Metric for the time series view
    #[arg(long = "timeline-axis", value_enum, ignore_case = true)]
    pub timeline_axis: Option<Metric>,
    /// Metric for the genre view
    #[arg(long = "genre-axis", value_enum, ignore_case = true)]
    pub genre_axis: Option<Metric>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Dashboard configuration YAML file (built-in defaults if omitted)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
