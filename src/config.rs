//! Dashboard configuration.
//!
//! An optional YAML file overrides the built-in dashboard settings: the
//! dataset and image paths, the year slider range, the table page size, the
//! source and genre allow-lists, and the initial parameter values. Missing
//! keys keep their defaults; unknown keys are rejected.

use std::{
    fs::File,
    io::BufReader,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    params::{ParameterSet, YEAR_MAX, YEAR_MIN},
    pipeline,
};

pub const DEFAULT_TITLE: &str = "Anime Dashboard";
pub const DEFAULT_DATASET: &str = "anime-dataset-2023.csv";
pub const DEFAULT_IMAGE: &str = "Kakashi.png";
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            min: YEAR_MIN,
            max: YEAR_MAX,
        }
    }
}

impl YearRange {
    pub fn as_range(&self) -> RangeInclusive<i32> {
        self.min..=self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DashboardConfig {
    pub title: String,
    pub dataset: Option<PathBuf>,
    pub image: PathBuf,
    pub year_range: YearRange,
    pub page_size: usize,
    pub sources: Vec<String>,
    pub genres: Vec<String>,
    pub defaults: ParameterSet,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            dataset: Some(PathBuf::from(DEFAULT_DATASET)),
            image: PathBuf::from(DEFAULT_IMAGE),
            year_range: YearRange::default(),
            page_size: DEFAULT_PAGE_SIZE,
            sources: pipeline::default_sources(),
            genres: pipeline::default_genres(),
            defaults: ParameterSet::default(),
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let config: DashboardConfig =
            serde_yaml::from_reader(reader).context("Parsing dashboard config YAML")?;
        config
            .validate()
            .with_context(|| format!("Validating config {path:?}"))?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: DashboardConfig =
            serde_yaml::from_str(raw).context("Parsing dashboard config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.year_range.min <= self.year_range.max,
            "year_range.min ({}) must not exceed year_range.max ({})",
            self.year_range.min,
            self.year_range.max
        );
        ensure!(
            self.year_range.as_range().contains(&self.defaults.year),
            "default year {} is outside year_range {}..={}",
            self.defaults.year,
            self.year_range.min,
            self.year_range.max
        );
        ensure!(self.page_size > 0, "page_size must be at least 1");
        Ok(())
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing dashboard config YAML")
    }
}
