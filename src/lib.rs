pub mod aired;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod io_utils;
pub mod loader;
pub mod params;
pub mod pipeline;
pub mod table;

use std::{
    env,
    io::{self, Write},
    path::Path,
    sync::OnceLock,
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info};
use serde::Serialize;

use crate::{
    cli::{Cli, Commands, InputArgs},
    config::DashboardConfig,
    dashboard::Dashboard,
    loader::{CleanedTable, LoadOptions},
    params::{Metric, ParameterSet},
    table::Page,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("anime_stats", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Clean(args) => handle_clean(&args),
        Commands::Timeline(args) => handle_timeline(&args),
        Commands::Members(args) => handle_members(&args),
        Commands::Genres(args) => handle_genres(&args),
        Commands::Dashboard(args) => handle_dashboard(&args),
        Commands::Export(args) => handle_export(&args),
        Commands::Config(args) => handle_config(&args),
    }
}

fn load_inputs(args: &InputArgs) -> Result<(DashboardConfig, CleanedTable)> {
    let config = DashboardConfig::load_or_default(args.config.as_deref())?;
    let input = args
        .input
        .clone()
        .or_else(|| config.dataset.clone())
        .ok_or_else(|| anyhow!("No input given: pass --input or set 'dataset' in the config"))?;
    info!(
        "Loading '{}' with delimiter '{}'",
        input.display(),
        printable_delimiter(io_utils::resolve_input_delimiter(&input, args.delimiter))
    );
    let options = LoadOptions {
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
        limit: args.limit,
    };
    let table = loader::load_cleaned_table(&input, &options)
        .with_context(|| format!("Loading dataset {input:?}"))?;
    Ok((config, table))
}

fn parameters(
    config: &DashboardConfig,
    year: Option<i32>,
    timeline_axis: Option<Metric>,
    genre_axis: Option<Metric>,
) -> ParameterSet {
    let defaults = config.defaults;
    ParameterSet {
        year: year.unwrap_or(defaults.year),
        timeline_axis: timeline_axis.unwrap_or(defaults.timeline_axis),
        genre_axis: genre_axis.unwrap_or(defaults.genre_axis),
    }
}

fn build_dashboard(
    config: DashboardConfig,
    table: CleanedTable,
    params: ParameterSet,
) -> Result<Dashboard> {
    debug!("Building dashboard with {params:?}");
    Dashboard::new(table, config, params).context("Applying dashboard parameters")
}

fn handle_clean(args: &cli::CleanArgs) -> Result<()> {
    let (_, table) = load_inputs(&args.input)?;
    let delimiter = args.input.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
    let rows = loader::write_cleaned_table(&table, args.output.as_deref(), delimiter)?;
    let destination = args
        .output
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    info!("Wrote {rows} cleaned row(s) -> {destination}");
    Ok(())
}

fn handle_timeline(args: &cli::TimelineArgs) -> Result<()> {
    let (config, table) = load_inputs(&args.input)?;
    let params = parameters(&config, args.year, args.axis, None);
    let page_size = config.page_size;
    let dashboard = build_dashboard(config, table, params)?;
    let views = dashboard.views();
    if args.json {
        return print_json(&views.timeline);
    }
    print!(
        "{}",
        table::render_page(
            &views.timeline.headers,
            &views.timeline.cell_rows(),
            Page::new(args.page, page_size),
        )
    );
    Ok(())
}

fn handle_members(args: &cli::MembersArgs) -> Result<()> {
    let (config, table) = load_inputs(&args.input)?;
    let params = parameters(&config, args.year, None, None);
    let dashboard = build_dashboard(config, table, params)?;
    let views = dashboard.views();
    if args.json {
        return print_json(&views.members);
    }
    print!(
        "{}",
        table::render_table(&views.members.headers, &views.members.cell_rows())
    );
    Ok(())
}

fn handle_genres(args: &cli::GenresArgs) -> Result<()> {
    let (config, table) = load_inputs(&args.input)?;
    let params = parameters(&config, args.year, None, args.axis);
    let dashboard = build_dashboard(config, table, params)?;
    let views = dashboard.views();
    if args.json {
        return print_json(&views.genres);
    }
    print!(
        "{}",
        table::render_table(&views.genres.headers, &views.genres.cell_rows())
    );
    Ok(())
}

fn handle_dashboard(args: &cli::DashboardArgs) -> Result<()> {
    let (config, table) = load_inputs(&args.input)?;
    let params = parameters(&config, args.year, args.timeline_axis, args.genre_axis);
    let mut dashboard = build_dashboard(config, table, params)?;
    if args.interactive {
        let stdin = io::stdin();
        dashboard::run_interactive(&mut dashboard, stdin.lock(), io::stdout().lock())
    } else {
        print!("{}", dashboard.render());
        Ok(())
    }
}

fn handle_export(args: &cli::ExportArgs) -> Result<()> {
    let (config, table) = load_inputs(&args.input)?;
    let params = parameters(&config, args.year, args.timeline_axis, args.genre_axis);
    let dashboard = build_dashboard(config, table, params)?;
    let snapshot = dashboard.snapshot();
    let mut writer = io_utils::open_text_writer(args.output.as_deref())?;
    serde_json::to_writer_pretty(&mut writer, &snapshot).context("Writing dashboard JSON")?;
    writeln!(writer).context("Writing dashboard JSON")?;
    writer.flush().context("Flushing dashboard JSON")?;
    info!(
        "Exported {} timeline, {} members and {} genre row(s)",
        snapshot.timeline.len(),
        snapshot.score_vs_members.len(),
        snapshot.genres.len()
    );
    Ok(())
}

fn handle_config(args: &cli::ConfigArgs) -> Result<()> {
    let config = DashboardConfig::load_or_default(args.config.as_deref())?;
    print!("{}", config.to_yaml_string()?);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Serializing JSON output")?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

/// Loads and cleans `path` with default options; a convenience for library callers.
pub fn load_dataset(path: &Path) -> Result<CleanedTable> {
    loader::load_cleaned_table(path, &LoadOptions::default())
        .with_context(|| format!("Loading dataset {path:?}"))
}
