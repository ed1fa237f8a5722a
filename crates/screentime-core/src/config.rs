use crate::policy::{AgeBracket, BreakPolicy, ThresholdTable, DEFAULT_BREAK_THRESHOLD};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to determine local data directory")]
    NoDataDir,
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Longest accepted `tick_interval_secs`
pub const MAX_TICK_INTERVAL_SECS: u64 = 60 * 60;

/// Get the local data directory for screentime.
///
/// # Errors
///
/// Returns an error if the local data directory cannot be determined.
pub fn get_data_dir() -> Result<PathBuf, ConfigError> {
    let mut path = dirs::data_local_dir().ok_or(ConfigError::NoDataDir)?;
    path.push("screentime");
    Ok(path)
}

/// Default location of `config.toml`
///
/// # Errors
///
/// Returns an error if the local data directory cannot be determined.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(get_data_dir()?.join("config.toml"))
}

/// Per-bracket break thresholds, in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub child_mins: u64,
    pub teen_mins: u64,
    pub adult_mins: u64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        let table = ThresholdTable::default();
        Self {
            child_mins: table.child.as_secs() / 60,
            teen_mins: table.teen.as_secs() / 60,
            adult_mins: table.adult.as_secs() / 60,
        }
    }
}

/// Engine configuration, read from `config.toml`
///
/// ```toml
/// tick_interval_secs = 1
/// break_threshold_mins = 25      # optional, overrides the age table
/// date_of_birth = "2009-04-12"   # optional
///
/// [thresholds]
/// child_mins = 15
/// teen_mins = 20
/// adult_mins = 30
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tick_interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_threshold_mins: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    pub thresholds: ThresholdConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_secs: 1,
            break_threshold_mins: None,
            date_of_birth: None,
            thresholds: ThresholdConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default location
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_path()?)
    }

    /// Load from `path`; a missing file yields the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write to `path`, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(io_err)
    }

    /// Ticker period, between one second and an hour
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.clamp(1, MAX_TICK_INTERVAL_SECS))
    }

    #[must_use]
    pub fn threshold_table(&self) -> ThresholdTable {
        let defaults = ThresholdTable::default();
        ThresholdTable {
            child: minutes("thresholds.child_mins", self.thresholds.child_mins, defaults.child),
            teen: minutes("thresholds.teen_mins", self.thresholds.teen_mins, defaults.teen),
            adult: minutes("thresholds.adult_mins", self.thresholds.adult_mins, defaults.adult),
        }
    }

    #[must_use]
    pub fn age_bracket(&self, today: NaiveDate) -> Option<AgeBracket> {
        self.date_of_birth
            .and_then(|dob| AgeBracket::from_date_of_birth(dob, today))
    }

    /// Resolve the break policy: explicit override, then age bracket, then default
    #[must_use]
    pub fn break_policy(&self, today: NaiveDate) -> BreakPolicy {
        if let Some(mins) = self.break_threshold_mins {
            return BreakPolicy::new(Some(minutes(
                "break_threshold_mins",
                mins,
                DEFAULT_BREAK_THRESHOLD,
            )));
        }
        BreakPolicy::for_profile(self.age_bracket(today), &self.threshold_table())
    }
}

/// Minutes from the config file as a duration; out-of-range values use `fallback`
fn minutes(key: &str, mins: u64, fallback: Duration) -> Duration {
    mins.checked_mul(60).map_or_else(
        || {
            log::warn!(
                "{key} = {mins} is out of range, using {}m",
                fallback.as_secs() / 60
            );
            fallback
        },
        Duration::from_secs,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tick_period(), Duration::from_secs(1));
        assert_eq!(
            config.break_policy(today()).threshold(),
            DEFAULT_BREAK_THRESHOLD
        );
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "date_of_birth = \"2014-02-01\"\n\n[thresholds]\nchild_mins = 10\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.tick_interval_secs, 1);
        assert_eq!(config.thresholds.child_mins, 10);
        assert_eq!(config.thresholds.teen_mins, 20);
        assert_eq!(config.age_bracket(today()), Some(AgeBracket::Child));
        assert_eq!(
            config.break_policy(today()).threshold(),
            Duration::from_secs(10 * 60)
        );
    }

    #[test]
    fn test_explicit_threshold_overrides_age() {
        let config = Config {
            break_threshold_mins: Some(45),
            date_of_birth: NaiveDate::from_ymd_opt(2014, 2, 1),
            ..Config::default()
        };
        assert_eq!(
            config.break_policy(today()).threshold(),
            Duration::from_secs(45 * 60)
        );
    }

    #[test]
    fn test_zero_threshold_falls_back_to_default() {
        let config = Config {
            break_threshold_mins: Some(0),
            ..Config::default()
        };
        assert_eq!(
            config.break_policy(today()).threshold(),
            DEFAULT_BREAK_THRESHOLD
        );
    }

    #[test]
    fn test_huge_threshold_override_falls_back_to_default() {
        let config: Config = toml::from_str("break_threshold_mins = 9223372036854775807").unwrap();
        assert_eq!(
            config.break_policy(today()).threshold(),
            DEFAULT_BREAK_THRESHOLD
        );
    }

    #[test]
    fn test_huge_bracket_threshold_falls_back_to_bracket_default() {
        let config: Config = toml::from_str(
            "date_of_birth = \"2014-02-01\"\n\n[thresholds]\nchild_mins = 9223372036854775807\n",
        )
        .unwrap();
        assert_eq!(config.age_bracket(today()), Some(AgeBracket::Child));
        assert_eq!(
            config.break_policy(today()).threshold(),
            ThresholdTable::default().child
        );
        assert_eq!(config.threshold_table().teen, ThresholdTable::default().teen);
    }

    #[test]
    fn test_large_in_range_threshold_is_kept() {
        let config = Config {
            break_threshold_mins: Some(u64::MAX / 60),
            ..Config::default()
        };
        assert_eq!(
            config.break_policy(today()).threshold(),
            Duration::from_secs((u64::MAX / 60) * 60)
        );
    }

    #[test]
    fn test_zero_tick_interval_is_clamped() {
        let config = Config {
            tick_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.tick_period(), Duration::from_secs(1));

        let config = Config {
            tick_interval_secs: u64::MAX,
            ..Config::default()
        };
        assert_eq!(
            config.tick_period(),
            Duration::from_secs(MAX_TICK_INTERVAL_SECS)
        );
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "tick_interval_secs = \"often\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            tick_interval_secs: 5,
            date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1),
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
