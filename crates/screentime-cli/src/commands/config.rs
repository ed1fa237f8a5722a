//! Configuration management command handlers

use anyhow::Result;
use screentime_core::config::{config_path, Config};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn config_rows(config: &Config, today: chrono::NaiveDate) -> Vec<ConfigRow> {
    let policy = config.break_policy(today);
    vec![
        ConfigRow {
            key: "tick_interval_secs",
            value: config.tick_period().as_secs().to_string(),
        },
        ConfigRow {
            key: "break_threshold_mins",
            value: config
                .break_threshold_mins
                .map_or_else(|| "(unset)".to_string(), |m| m.to_string()),
        },
        ConfigRow {
            key: "date_of_birth",
            value: config
                .date_of_birth
                .map_or_else(|| "(unset)".to_string(), |d| d.to_string()),
        },
        ConfigRow {
            key: "age_profile",
            value: config
                .age_bracket(today)
                .map_or_else(|| "(none)".to_string(), |b| b.description().to_string()),
        },
        ConfigRow {
            key: "thresholds.child_mins",
            value: config.thresholds.child_mins.to_string(),
        },
        ConfigRow {
            key: "thresholds.teen_mins",
            value: config.thresholds.teen_mins.to_string(),
        },
        ConfigRow {
            key: "thresholds.adult_mins",
            value: config.thresholds.adult_mins.to_string(),
        },
        ConfigRow {
            key: "effective threshold",
            value: format!("{}m", policy.threshold().as_secs() / 60),
        },
    ]
}

pub fn handle_config_show() -> Result<()> {
    let path = config_path()?;
    let config = Config::load_from(&path)?;
    let today = chrono::Local::now().date_naive();

    println!("Configuration ({}):", path.display());
    let mut table = Table::new(config_rows(&config, today));
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

pub fn handle_config_init(force: bool) -> Result<()> {
    let path = config_path()?;
    if path.exists() && !force {
        println!("Config already exists at {} (use --force to overwrite)", path.display());
        return Ok(());
    }
    Config::default().save_to(&path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

pub fn handle_config_path() -> Result<()> {
    println!("{}", config_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_config_rows_show_effective_threshold() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let config = Config {
            date_of_birth: NaiveDate::from_ymd_opt(2009, 3, 1),
            ..Config::default()
        };
        let rows = config_rows(&config, today);

        let profile = rows.iter().find(|r| r.key == "age_profile").unwrap();
        assert_eq!(profile.value, "Teen (13-17)");
        let effective = rows.iter().find(|r| r.key == "effective threshold").unwrap();
        assert_eq!(effective.value, "20m");
    }

    #[test]
    fn test_config_rows_defaults() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let rows = config_rows(&Config::default(), today);
        let dob = rows.iter().find(|r| r.key == "date_of_birth").unwrap();
        assert_eq!(dob.value, "(unset)");
        let effective = rows.iter().find(|r| r.key == "effective threshold").unwrap();
        assert_eq!(effective.value, "20m");
    }
}
