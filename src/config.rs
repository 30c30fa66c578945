// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::assemble::DEFAULT_LATENCY_DAYS;
use crate::feeds::FeedPaths;

/// Where one feed comes from and what it is called locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSpec {
    pub url: String,
    pub file: String,
}

impl FeedSpec {
    fn new(url: &str, file: &str) -> Self {
        Self {
            url: url.to_string(),
            file: file.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feeds {
    pub flux: FeedSpec,
    pub geomagnetic: FeedSpec,
    pub space_weather: FeedSpec,
    pub mgii: FeedSpec,
}

impl Default for Feeds {
    fn default() -> Self {
        Self {
            flux: FeedSpec::new(
                "https://sol.spacenvironment.net/jb2008/indices/SOLFSMY.TXT",
                "SOLFSMY.TXT",
            ),
            geomagnetic: FeedSpec::new(
                "https://sol.spacenvironment.net/jb2008/indices/SOLRESAP.TXT",
                "SOLRESAP.TXT",
            ),
            space_weather: FeedSpec::new(
                "https://celestrak.com/SpaceData/SW-Last5Years.txt",
                "SW-Last5Years.txt",
            ),
            mgii: FeedSpec::new(
                "http://www.iup.uni-bremen.de/gome/solar/GOME2B_Index_classic.dat",
                "GOME2B_Index_classic.dat",
            ),
        }
    }
}

impl Feeds {
    /// All four, in download order.
    pub fn all(&self) -> [&FeedSpec; 4] {
        [&self.flux, &self.geomagnetic, &self.space_weather, &self.mgii]
    }

    /// Local paths of the feeds under `dir`.
    pub fn paths_in(&self, dir: &Path) -> FeedPaths {
        FeedPaths {
            flux: dir.join(&self.flux.file),
            geomagnetic: dir.join(&self.geomagnetic.file),
            space_weather: dir.join(&self.space_weather.file),
            mgii: dir.join(&self.mgii.file),
        }
    }
}

/// Run configuration. Every key is optional in YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feeds: Feeds,
    pub latency_days: i64,
    pub output: PathBuf,
    pub parquet: Option<PathBuf>,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: Feeds::default(),
            latency_days: DEFAULT_LATENCY_DAYS,
            output: PathBuf::from("jb2006_indices.csv"),
            parquet: None,
            retries: 3,
            backoff_ms: 500,
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(text).context("parsing config YAML")?;
        if cfg.latency_days < 1 {
            anyhow::bail!("latency_days must be at least 1, got {}", cfg.latency_days);
        }
        Ok(cfg)
    }

    /// Read `path`, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(p) => {
                let text = fs::read_to_string(p)
                    .with_context(|| format!("reading config {}", p.display()))?;
                Self::from_yaml(&text).with_context(|| format!("in {}", p.display()))
            }
        }
    }
}
