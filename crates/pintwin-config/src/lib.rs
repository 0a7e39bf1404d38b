//! Shared configuration for the pintwin console.
//!
//! TOML config file, environment overrides, and translation to
//! `pintwin_core::TwinConfig`. The TUI binary layers CLI-flag overrides
//! on top of what this crate resolves.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pintwin_api::TransportConfig;
use pintwin_core::TwinConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no board address configured (set `board` in config.toml, PINTWIN_BOARD, or --board)")]
    NoBoard,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Board base URL (e.g., "http://192.168.4.1").
    pub board: Option<String>,

    #[serde(default)]
    pub transport: Transport,

    #[serde(default)]
    pub poll: Poll,

    #[serde(default)]
    pub log: Log,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Transport {
    /// Request timeout. The board serves from a cooperative scheduler,
    /// so generous beats snappy here.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Poll {
    /// Snapshot refresh cadence.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Trailing-edge delay for continuous inputs (the PWM duty slider).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for Poll {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_interval_ms() -> u64 {
    2500
}
fn default_debounce_ms() -> u64 {
    300
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Log {
    /// Log file path; defaults to `pintwin.log` in the state directory.
    pub file: Option<PathBuf>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "pintwin", "pintwin").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Resolve the default log file path.
pub fn default_log_path() -> PathBuf {
    ProjectDirs::from("io", "pintwin", "pintwin").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("pintwin.log");
            p
        },
        |dirs| {
            dirs.state_dir()
                .unwrap_or_else(|| dirs.data_dir())
                .join("pintwin.log")
        },
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("pintwin");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full `Config` from file + environment.
///
/// Precedence (lowest to highest): built-in defaults, `config.toml`,
/// `PINTWIN_*` environment variables. Nested keys use a double
/// underscore, e.g. `PINTWIN_POLL__INTERVAL_MS`.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load a `Config` with an explicit file path (tests, `--config` flag).
pub fn load_config_from(path: &std::path::Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PINTWIN_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Twin config resolution ──────────────────────────────────────────

/// Build a `TwinConfig` from loaded config plus an optional board URL
/// override (CLI flag). The override wins.
pub fn to_twin_config(cfg: &Config, board_override: Option<&str>) -> Result<TwinConfig, ConfigError> {
    let board = board_override
        .or(cfg.board.as_deref())
        .ok_or(ConfigError::NoBoard)?;

    let base_url: url::Url = board.parse().map_err(|_| ConfigError::Validation {
        field: "board".into(),
        reason: format!("invalid URL: {board}"),
    })?;

    // Parseable is not enough; `mailto:` and friends cannot carry the
    // path-routed command endpoints.
    if base_url.cannot_be_a_base() {
        return Err(ConfigError::Validation {
            field: "board".into(),
            reason: format!("not a usable HTTP base URL: {board}"),
        });
    }

    if cfg.poll.interval_ms == 0 {
        return Err(ConfigError::Validation {
            field: "poll.interval_ms".into(),
            reason: "must be greater than zero".into(),
        });
    }

    let mut twin = TwinConfig::new(base_url);
    twin.poll_interval = Duration::from_millis(cfg.poll.interval_ms);
    twin.debounce_delay = Duration::from_millis(cfg.poll.debounce_ms);
    twin.transport = TransportConfig {
        timeout: Duration::from_secs(cfg.transport.timeout_secs),
        ..TransportConfig::default()
    };
    Ok(twin)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        figment::Jail::expect_with(|jail| {
            let cfg = load_config_from(&jail.directory().join("config.toml"))
                .map_err(|e| figment::Error::from(e.to_string()))?;
            assert!(cfg.board.is_none());
            assert_eq!(cfg.poll.interval_ms, 2500);
            assert_eq!(cfg.poll.debounce_ms, 300);
            assert_eq!(cfg.transport.timeout_secs, 10);
            Ok(())
        });
    }

    #[test]
    fn toml_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    board = "http://192.168.1.50"

                    [poll]
                    interval_ms = 1000
                "#,
            )?;
            let cfg = load_config_from(&jail.directory().join("config.toml"))
                .map_err(|e| figment::Error::from(e.to_string()))?;
            assert_eq!(cfg.board.as_deref(), Some("http://192.168.1.50"));
            assert_eq!(cfg.poll.interval_ms, 1000);
            assert_eq!(cfg.poll.debounce_ms, 300);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", r#"board = "http://192.168.1.50""#)?;
            jail.set_env("PINTWIN_BOARD", "http://10.0.0.9");
            jail.set_env("PINTWIN_POLL__INTERVAL_MS", "500");
            let cfg = load_config_from(&jail.directory().join("config.toml"))
                .map_err(|e| figment::Error::from(e.to_string()))?;
            assert_eq!(cfg.board.as_deref(), Some("http://10.0.0.9"));
            assert_eq!(cfg.poll.interval_ms, 500);
            Ok(())
        });
    }

    #[test]
    fn twin_config_requires_a_board_address() {
        let cfg = Config::default();
        assert!(matches!(
            to_twin_config(&cfg, None),
            Err(ConfigError::NoBoard)
        ));
    }

    #[test]
    fn board_override_wins() {
        let cfg = Config {
            board: Some("http://192.168.1.50".into()),
            ..Config::default()
        };
        let twin = to_twin_config(&cfg, Some("http://10.0.0.9")).unwrap();
        assert_eq!(twin.base_url.as_str(), "http://10.0.0.9/");
        assert_eq!(twin.poll_interval, Duration::from_millis(2500));
    }

    #[test]
    fn non_base_board_url_is_rejected() {
        let cfg = Config {
            board: Some("mailto:board@example.com".into()),
            ..Config::default()
        };
        assert!(matches!(
            to_twin_config(&cfg, None),
            Err(ConfigError::Validation { field, .. }) if field == "board"
        ));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let cfg = Config {
            board: Some("http://192.168.1.50".into()),
            poll: Poll {
                interval_ms: 0,
                ..Poll::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            to_twin_config(&cfg, None),
            Err(ConfigError::Validation { .. })
        ));
    }
}
