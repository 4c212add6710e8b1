use chrono::NaiveDate;
use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::calendar::CarouselDelays;
use crate::error::Result;
use crate::scroll::TrackMetrics;

const CONFIG_PATH_ENV_VAR: &str = "FITCLUB_CONFIG_FILE";

pub(crate) fn find_configfile_locations() -> io::Result<Vec<PathBuf>> {
    let config_env = env::var(CONFIG_PATH_ENV_VAR).ok().map(PathBuf::from);

    let home = dirs::home_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::Other, "Unable to find home directory")
    })?;

    let home_config = home.join(".fitclub.toml");

    let config_xdg = if let Ok(dir) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(dir)
    } else {
        dirs::config_dir().unwrap_or_else(|| home.join(".config"))
    }
    .join("fitclub")
    .join("config.toml");

    let mut locations = vec![config_xdg, home_config];

    if let Some(path) = config_env {
        locations.insert(0, path);
    }

    Ok(locations)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Delays {
    pub sheet_enter_ms: u64,
    pub calendar_initial_settle_ms: u64,
    pub calendar_nav_settle_ms: u64,
    pub calendar_scroll_debounce_ms: u64,
}

impl Default for Delays {
    fn default() -> Self {
        Delays {
            sheet_enter_ms: 10,
            calendar_initial_settle_ms: 120,
            calendar_nav_settle_ms: 350,
            calendar_scroll_debounce_ms: 100,
        }
    }
}

impl Delays {
    pub fn sheet_enter(&self) -> Duration {
        Duration::from_millis(self.sheet_enter_ms)
    }

    pub fn carousel(&self) -> CarouselDelays {
        CarouselDelays {
            initial_settle: Duration::from_millis(self.calendar_initial_settle_ms),
            nav_settle: Duration::from_millis(self.calendar_nav_settle_ms),
            debounce: Duration::from_millis(self.calendar_scroll_debounce_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub epoch: NaiveDate,
    pub calendar_start: NaiveDate,
    pub lookahead_months: u32,
    pub calendar_page_width: u32,
    pub viewport_width: u32,
    pub track: TrackMetrics,
    pub delays: Delays,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            epoch: NaiveDate::from_ymd_opt(2023, 8, 1).unwrap_or(NaiveDate::MIN),
            calendar_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
            lookahead_months: 3,
            calendar_page_width: 358,
            viewport_width: 390,
            track: TrackMetrics::default(),
            delays: Delays::default(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Config::from_toml(&content).map_err(|e| {
            let msg = format!(
                "{} (in '{}')",
                e.message.as_deref().unwrap_or_default(),
                path.display()
            );
            e.with_msg(&msg)
        })?;
        log::info!("loaded config from '{}'", path.display());
        Ok(config)
    }
}

/// Loads `path` if given, otherwise the first existing file among the
/// default locations, otherwise the built-in defaults.
pub fn load_suitable_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Config::load(path);
    }

    let locations = match find_configfile_locations() {
        Ok(locations) => locations,
        Err(e) => {
            log::warn!("{}", e);
            Vec::new()
        }
    };

    match locations.iter().find(|p| p.is_file()) {
        Some(path) => Config::load(path),
        None => {
            log::debug!("no config file found, using defaults");
            Ok(Config::default())
        }
    }
}
