//! Application-level configuration loading: round tuning, leaderboard size and the Pokémon roster.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::{board::BoardLimits, game::Pokemon, round::RoundSettings};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "POKEMORY_CONFIG_PATH";
/// Sprite location used by the built-in roster.
const SPRITE_BASE_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Tuning of a single round.
pub struct RoundConfig {
    /// Pairs dealt when the client does not ask for a specific count.
    pub pair_count: usize,
    /// Time cap of a round.
    pub max_allowed_time: Duration,
    /// Delay before a mismatched pair is turned face down.
    pub unreveal_delay: Duration,
    /// Countdown refresh period.
    pub timer_tick: Duration,
    /// How long an ended (or never started) round stays reachable.
    pub ended_round_retention: Duration,
}

impl RoundConfig {
    /// Settings handed to each new round.
    pub fn settings(&self) -> RoundSettings {
        RoundSettings {
            limits: BoardLimits {
                max_allowed: self.max_allowed_time,
                unreveal_delay: self.unreveal_delay,
            },
            tick_interval: self.timer_tick,
        }
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            pair_count: 8,
            max_allowed_time: Duration::from_millis(180_000),
            unreveal_delay: Duration::from_millis(600),
            timer_tick: Duration::from_millis(400),
            ended_round_retention: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    round: RoundConfig,
    leaderboard_limit: usize,
    score_endpoint: Option<String>,
    roster: Vec<Pokemon>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        pairs = app_config.round.pair_count,
                        roster = app_config.roster.len(),
                        "loaded configuration"
                    );
                    app_config
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

    /// Round tuning.
    pub fn round(&self) -> &RoundConfig {
        &self.round
    }

    /// Number of entries returned by the leaderboard by default.
    pub fn leaderboard_limit(&self) -> usize {
        self.leaderboard_limit
    }

    /// Remote `/save-score` URL. Scores are saved in-process when unset.
    pub fn score_endpoint(&self) -> Option<&str> {
        self.score_endpoint.as_deref()
    }

    /// Pokémon used to seed an empty store.
    pub fn roster(&self) -> &[Pokemon] {
        &self.roster
    }

    /// Replace the round tuning, mostly useful in tests.
    pub fn with_round(mut self, round: RoundConfig) -> Self {
        self.round = round;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            round: RoundConfig::default(),
            leaderboard_limit: 5,
            score_endpoint: None,
            roster: default_roster(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    round: RawRoundConfig,
    leaderboard_limit: Option<usize>,
    score_endpoint: Option<String>,
    pokemons: Option<Vec<RawPokemon>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// Every field is optional and falls back to [`RoundConfig::default`].
struct RawRoundConfig {
    pair_count: Option<usize>,
    max_allowed_time_ms: Option<u64>,
    unreveal_delay_ms: Option<u64>,
    timer_tick_ms: Option<u64>,
    ended_round_retention_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        let base = RoundConfig::default();
        let raw = value.round;

        let round = RoundConfig {
            pair_count: raw.pair_count.filter(|&count| count > 0).unwrap_or(base.pair_count),
            max_allowed_time: raw
                .max_allowed_time_ms
                .map(Duration::from_millis)
                .unwrap_or(base.max_allowed_time),
            unreveal_delay: raw
                .unreveal_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(base.unreveal_delay),
            timer_tick: raw
                .timer_tick_ms
                .filter(|&ms| ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(base.timer_tick),
            ended_round_retention: raw
                .ended_round_retention_secs
                .map(Duration::from_secs)
                .unwrap_or(base.ended_round_retention),
        };

        Self {
            round,
            leaderboard_limit: value.leaderboard_limit.unwrap_or(defaults.leaderboard_limit),
            score_endpoint: value.score_endpoint.filter(|url| !url.trim().is_empty()),
            roster: value
                .pokemons
                .map(|list| list.into_iter().map(Into::into).collect())
                .unwrap_or(defaults.roster),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a roster entry.
struct RawPokemon {
    id: u32,
    name: String,
    display_name: String,
    image_url: Option<String>,
}

impl From<RawPokemon> for Pokemon {
    fn from(value: RawPokemon) -> Self {
        let image_url = value.image_url.unwrap_or_else(|| sprite_url(value.id));
        Self {
            id: value.id,
            name: value.name,
            display_name: value.display_name,
            image_url,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn sprite_url(id: u32) -> String {
    format!("{SPRITE_BASE_URL}/{id}.png")
}

/// Built-in roster shipped with the binary.
fn default_roster() -> Vec<Pokemon> {
    [
        (1, "bulbasaur", "Bulbizarre"),
        (4, "charmander", "Salamèche"),
        (7, "squirtle", "Carapuce"),
        (12, "butterfree", "Papilusion"),
        (16, "pidgey", "Roucool"),
        (25, "pikachu", "Pikachu"),
        (35, "clefairy", "Mélofée"),
        (39, "jigglypuff", "Rondoudou"),
        (52, "meowth", "Miaouss"),
        (54, "psyduck", "Psykokwak"),
        (63, "abra", "Abra"),
        (92, "gastly", "Fantominus"),
        (94, "gengar", "Ectoplasma"),
        (129, "magikarp", "Magicarpe"),
        (131, "lapras", "Lokhlass"),
        (133, "eevee", "Évoli"),
        (143, "snorlax", "Ronflex"),
        (147, "dratini", "Minidraco"),
        (150, "mewtwo", "Mewtwo"),
        (151, "mew", "Mew"),
    ]
    .into_iter()
    .map(|(id, name, display_name)| Pokemon {
        id,
        name: name.to_owned(),
        display_name: display_name.to_owned(),
        image_url: sprite_url(id),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.round().pair_count, 8);
        assert_eq!(config.round().max_allowed_time, Duration::from_secs(180));
        assert_eq!(config.round().unreveal_delay, Duration::from_millis(600));
        assert_eq!(config.round().timer_tick, Duration::from_millis(400));
        assert_eq!(config.leaderboard_limit(), 5);
        assert!(config.score_endpoint().is_none());
        assert!(config.roster().len() >= config.round().pair_count);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let raw: RawConfig = serde_json::from_str(
            r#"{ "round": { "pair_count": 6, "max_allowed_time_ms": 90000 }, "score_endpoint": "  " }"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.round().pair_count, 6);
        assert_eq!(config.round().max_allowed_time, Duration::from_secs(90));
        assert_eq!(config.round().timer_tick, Duration::from_millis(400));
        assert!(config.score_endpoint().is_none());
        assert_eq!(config.roster(), AppConfig::default().roster());
    }

    #[test]
    fn roster_entries_get_a_sprite_when_missing() {
        let raw: RawConfig = serde_json::from_str(
            r#"{ "pokemons": [ { "id": 25, "name": "pikachu", "display_name": "Pikachu" } ] }"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.roster().len(), 1);
        assert!(config.roster()[0].image_url.ends_with("/25.png"));
    }

    #[test]
    fn settings_follow_round_config() {
        let settings = RoundConfig::default().settings();
        assert_eq!(settings.limits, BoardLimits::default());
        assert_eq!(settings.tick_interval, Duration::from_millis(400));
    }
}
