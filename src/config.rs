//! Application-level configuration loading: scheduling bounds, advancement rules and seed data.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::tournament::{AdvancementRules, KickoffRules};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TOURNAMENT_BACK_CONFIG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Bounds of the shared kickoff drawn for each generated round.
    pub scheduling: KickoffRules,
    /// How winners are read out of a finished round.
    pub advancement: AdvancementRules,
    /// Reference data written to the store once it is installed.
    pub seed: Option<SeedConfig>,
}

/// Reference data that has no CRUD surface of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Venues, matched by name.
    pub venues: Vec<SeedVenue>,
    /// Goal type labels.
    pub goal_types: Vec<String>,
    /// Seasons with their teams.
    pub seasons: Vec<SeedSeason>,
    /// Permissions, matched by key.
    pub permissions: Vec<SeedPermission>,
}

/// Seeded venue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedVenue {
    /// Unique venue name.
    pub name: String,
    /// Free-form location label.
    #[serde(default)]
    pub location: String,
}

/// Seeded season and its roster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedSeason {
    /// Unique season name.
    pub name: String,
    /// `YYYY-MM-DD`
    pub starts_on: String,
    /// `YYYY-MM-DD`
    pub ends_on: String,
    /// Teams registered for the season.
    #[serde(default)]
    pub teams: Vec<SeedTeam>,
}

/// Seeded team.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedTeam {
    /// Team name, unique across the system.
    pub name: String,
    /// Name of one of the seeded venues.
    #[serde(default)]
    pub home_venue: Option<String>,
    /// Roster size; 11 when absent.
    #[serde(default)]
    pub roster_size: Option<u16>,
    /// Players, matched by name within the team.
    #[serde(default)]
    pub players: Vec<SeedPlayer>,
}

/// Seeded player.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedPlayer {
    /// Player name.
    pub name: String,
    /// Free-form label such as "goalkeeper".
    #[serde(default)]
    pub kind: String,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub born_on: Option<String>,
    /// Free-form remarks.
    #[serde(default)]
    pub note: String,
}

/// Seeded permission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedPermission {
    /// Machine key, e.g. `schedule.create`.
    pub key: String,
    /// Human readable name.
    pub name: String,
    /// Functional area.
    #[serde(default)]
    pub module: String,
    /// Longer explanation.
    #[serde(default)]
    pub description: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        seeded = config.seed.is_some(),
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document; missing sections take their defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(contents)?;
        config.scheduling = config.scheduling.sanitized();
        Ok(config)
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.scheduling.window_days, 30);
        assert!(config.advancement.tie_credits_away);
        assert_eq!(config.advancement.concluded_after_secs, 100);
    }

    #[test]
    fn sections_override_individual_fields() {
        let config = AppConfig::from_json(
            r#"{
                "scheduling": { "latest_hour": 17 },
                "advancement": { "tie_credits_away": false },
                "seed": {
                    "venues": [{ "name": "North Field" }],
                    "seasons": [{
                        "name": "Spring",
                        "starts_on": "2025-04-01",
                        "ends_on": "2025-06-30",
                        "teams": [{ "name": "Rovers", "players": [{ "name": "Kim" }] }]
                    }]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.scheduling.earliest_hour, 9);
        assert_eq!(config.scheduling.latest_hour, 17);
        assert!(!config.advancement.tie_credits_away);
        assert!(config.advancement.skip_already_scheduled);

        let seed = config.seed.unwrap();
        assert_eq!(seed.venues[0].location, "");
        assert_eq!(seed.seasons[0].teams[0].players[0].name, "Kim");
        assert!(seed.permissions.is_empty());
    }

    #[test]
    fn out_of_range_hours_are_clamped() {
        let config =
            AppConfig::from_json(r#"{ "scheduling": { "earliest_hour": 22, "latest_hour": 30 } }"#)
                .unwrap();
        assert_eq!(config.scheduling.latest_hour, 23);
        assert_eq!(config.scheduling.earliest_hour, 22);
    }
}
