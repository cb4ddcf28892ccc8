//! Dashboard composition and the interactive event loop.
//!
//! A [`Dashboard`] owns the shared cleaned table, the [`ParameterStore`] and
//! the latest aggregated tables. At construction it subscribes one recompute
//! callback per view, each listening only to the parameters its pipeline
//! reads, so a parameter write refreshes exactly the affected views. Views
//! refreshed since the last render are tracked so the interactive loop can
//! redraw only those.

use std::{
    cell::{Ref, RefCell},
    collections::BTreeSet,
    fmt::Write as _,
    io::{BufRead, Write},
    path::PathBuf,
    rc::Rc,
};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;

use crate::{
    config::DashboardConfig,
    loader::CleanedTable,
    params::{Metric, Parameter, ParameterError, ParameterSet, ParameterStore},
    pipeline::{self, GenreTable, MembersTable, TimelineTable},
    table::{self, Page},
};

const SIDEBAR_HEADING: &str = "Stats of Anime";
const SIDEBAR_TEXT: &str = "Anime is a style of animation popular in Japanese films and television series. \
It often combines stark, colorful graphics with action-packed plots. \
Early anime films were intended primarily for a Japanese audience. \
Therefore, they used many cultural references unique to Japan.";

const TIMELINE_TITLE: &str = "Favorites and Popularity over Release year by Sources";
const MEMBERS_TITLE: &str = "Score vs Members by Source";
const GENRES_TITLE: &str = "Popular and favorites anime release by genres";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum View {
    Timeline,
    Members,
    Genres,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardViews {
    pub timeline: TimelineTable,
    pub members: MembersTable,
    pub genres: GenreTable,
}

#[derive(Debug)]
struct ViewState {
    views: DashboardViews,
    dirty: BTreeSet<View>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub title: String,
    pub image: PathBuf,
    pub parameters: ParameterSet,
    pub rows_loaded: usize,
    pub timeline: TimelineTable,
    pub score_vs_members: MembersTable,
    pub genres: GenreTable,
}

pub struct Dashboard {
    config: DashboardConfig,
    table: Rc<CleanedTable>,
    store: ParameterStore,
    state: Rc<RefCell<ViewState>>,
    page: usize,
}

impl Dashboard {
    pub fn new(
        table: CleanedTable,
        config: DashboardConfig,
        initial: ParameterSet,
    ) -> Result<Self, ParameterError> {
        let table = Rc::new(table);
        let mut store = ParameterStore::new(initial, config.year_range.as_range())?;
        let views = DashboardViews {
            timeline: pipeline::timeline(&table, &initial, &config.sources),
            members: pipeline::score_vs_members(&table, &initial, &config.sources),
            genres: pipeline::genre_bar(&table, &initial, &config.genres),
        };
        let state = Rc::new(RefCell::new(ViewState {
            views,
            dirty: BTreeSet::new(),
        }));

        {
            let (table, state, sources) =
                (Rc::clone(&table), Rc::clone(&state), config.sources.clone());
            store.subscribe(&[Parameter::Year, Parameter::TimelineAxis], move |params| {
                let mut state = state.borrow_mut();
                state.views.timeline = pipeline::timeline(&table, params, &sources);
                state.dirty.insert(View::Timeline);
            });
        }
        {
            let (table, state, sources) =
                (Rc::clone(&table), Rc::clone(&state), config.sources.clone());
            store.subscribe(&[Parameter::Year], move |params| {
                let mut state = state.borrow_mut();
                state.views.members = pipeline::score_vs_members(&table, params, &sources);
                state.dirty.insert(View::Members);
            });
        }
        {
            let (table, state, genres) =
                (Rc::clone(&table), Rc::clone(&state), config.genres.clone());
            store.subscribe(&[Parameter::Year, Parameter::GenreAxis], move |params| {
                let mut state = state.borrow_mut();
                state.views.genres = pipeline::genre_bar(&table, params, &genres);
                state.dirty.insert(View::Genres);
            });
        }

        Ok(Self {
            config,
            table,
            store,
            state,
            page: 1,
        })
    }

    pub fn params(&self) -> &ParameterSet {
        self.store.current()
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn views(&self) -> Ref<'_, DashboardViews> {
        Ref::map(self.state.borrow(), |state| &state.views)
    }

    pub fn set_year(&mut self, year: i32) -> Result<usize, ParameterError> {
        self.store.set_year(year)
    }

    pub fn set_timeline_axis(&mut self, metric: Metric) -> usize {
        self.store.set_timeline_axis(metric)
    }

    pub fn set_genre_axis(&mut self, metric: Metric) -> usize {
        self.store.set_genre_axis(metric)
    }

    pub fn page(&self) -> Page {
        Page::new(self.page, self.config.page_size)
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
        self.state.borrow_mut().dirty.insert(View::Timeline);
    }

    /// Views recomputed since the previous call, in display order.
    pub fn take_dirty(&self) -> Vec<View> {
        std::mem::take(&mut self.state.borrow_mut().dirty)
            .into_iter()
            .collect()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let views = self.views();
        DashboardSnapshot {
            title: self.config.title.clone(),
            image: self.config.image.clone(),
            parameters: *self.params(),
            rows_loaded: self.table.len(),
            timeline: views.timeline.clone(),
            score_vs_members: views.members.clone(),
            genres: views.genres.clone(),
        }
    }

    pub fn render_sidebar(&self) -> String {
        let params = self.params();
        let range = self.store.year_range();
        let mut out = String::new();
        let _ = writeln!(out, "# {}", self.config.title);
        let _ = writeln!(out);
        let _ = writeln!(out, "## {SIDEBAR_HEADING}");
        let _ = writeln!(out, "{SIDEBAR_TEXT}");
        let _ = writeln!(out, "[image: {}]", self.config.image.display());
        let _ = writeln!(out);
        let _ = writeln!(out, "## Settings");
        let _ = writeln!(
            out,
            "Year slider: {} ({}..={})",
            params.year,
            range.start(),
            range.end()
        );
        let _ = writeln!(out, "Timeline axis: {}", params.timeline_axis);
        let _ = writeln!(out, "Genre axis: {}", params.genre_axis);
        out
    }

    pub fn render_view(&self, view: View) -> String {
        let views = self.views();
        let mut out = String::new();
        match view {
            View::Timeline => {
                let _ = writeln!(
                    out,
                    "## {TIMELINE_TITLE} [{}]",
                    self.params().timeline_axis
                );
                out.push_str(&table::render_page(
                    &views.timeline.headers,
                    &views.timeline.cell_rows(),
                    self.page(),
                ));
            }
            View::Members => {
                let _ = writeln!(out, "## {MEMBERS_TITLE}");
                out.push_str(&table::render_table(
                    &views.members.headers,
                    &views.members.cell_rows(),
                ));
            }
            View::Genres => {
                let _ = writeln!(out, "## {GENRES_TITLE} [{}]", self.params().genre_axis);
                out.push_str(&table::render_table(
                    &views.genres.headers,
                    &views.genres.cell_rows(),
                ));
            }
        }
        out
    }

    pub fn render(&self) -> String {
        let mut out = self.render_sidebar();
        for view in [View::Timeline, View::Members, View::Genres] {
            out.push('\n');
            out.push_str(&self.render_view(view));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Year(i32),
    TimelineAxis(Metric),
    GenreAxis(Metric),
    Page(usize),
    Show,
    Help,
    Quit,
}

pub const COMMAND_HELP: &str = "commands: year <Y> | timeline-axis <favorites|popularity> | \
genre-axis <favorites|popularity> | page <N> | show | help | quit";

pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Err("empty command".to_string());
    };
    let arg = parts.next();
    if parts.next().is_some() {
        return Err(format!("too many arguments for '{verb}'"));
    }
    let need = |name: &str| arg.ok_or_else(|| format!("'{name}' needs a value"));
    match verb.to_ascii_lowercase().as_str() {
        "year" => need("year")?
            .parse::<i32>()
            .map(Command::Year)
            .map_err(|_| format!("'{}' is not a year", arg.unwrap_or_default())),
        "timeline-axis" => need("timeline-axis")?
            .parse::<Metric>()
            .map(Command::TimelineAxis)
            .map_err(|err| err.to_string()),
        "genre-axis" => need("genre-axis")?
            .parse::<Metric>()
            .map(Command::GenreAxis)
            .map_err(|err| err.to_string()),
        "page" => need("page")?
            .parse::<usize>()
            .ok()
            .filter(|page| *page > 0)
            .map(Command::Page)
            .ok_or_else(|| format!("'{}' is not a page number", arg.unwrap_or_default())),
        "show" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}'")),
    }
}

/// Reads commands line by line and redraws the views each change touches.
pub fn run_interactive<R, W>(dashboard: &mut Dashboard, input: R, mut output: W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{}", dashboard.render()).context("Writing dashboard")?;
    writeln!(output, "{COMMAND_HELP}").context("Writing dashboard")?;
    dashboard.take_dirty();

    for (idx, line) in input.lines().enumerate() {
        let line = line.with_context(|| format!("Reading command line {}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(output, "error: {message}").context("Writing dashboard")?;
                continue;
            }
        };
        debug!("Interactive command: {command:?}");
        match command {
            Command::Year(year) => {
                if let Err(err) = dashboard.set_year(year) {
                    writeln!(output, "error: {err}").context("Writing dashboard")?;
                    continue;
                }
            }
            Command::TimelineAxis(metric) => {
                dashboard.set_timeline_axis(metric);
            }
            Command::GenreAxis(metric) => {
                dashboard.set_genre_axis(metric);
            }
            Command::Page(page) => dashboard.set_page(page),
            Command::Show => {
                write!(output, "{}", dashboard.render()).context("Writing dashboard")?;
                dashboard.take_dirty();
                continue;
            }
            Command::Help => {
                writeln!(output, "{COMMAND_HELP}").context("Writing dashboard")?;
                continue;
            }
            Command::Quit => break,
        }

        let dirty = dashboard.take_dirty();
        if dirty.is_empty() {
            writeln!(output, "(no change)").context("Writing dashboard")?;
            continue;
        }
        for view in dirty {
            writeln!(output).context("Writing dashboard")?;
            write!(output, "{}", dashboard.render_view(view)).context("Writing dashboard")?;
        }
    }
    output.flush().context("Flushing dashboard output")?;
    info!("Interactive session ended at {:?}", dashboard.params());
    Ok(())
}
