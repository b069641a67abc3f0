//! Application-level configuration loading: JSON file first, then environment overrides.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GAME_RANK_CONFIG_PATH";
const DEFAULT_APP_NAME: &str = "Game Rank";
const DEFAULT_PUBLIC_DIR: &str = "public";
const DEFAULT_PORT: u16 = 3000;

/// Which storage backend the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Memory,
    Mongo,
}

impl StoreKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(StoreKind::Memory),
            "mongo" | "mongodb" => Some(StoreKind::Mongo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Name shown in page titles and the layout header.
    pub app_name: String,
    /// Directory served under `/public`.
    pub public_dir: PathBuf,
    /// Development mode, shown as a badge in the layout.
    pub dev: bool,
    pub port: u16,
    pub store: StoreKind,
}

impl AppConfig {
    /// Load the configuration file (falling back to defaults) and apply environment overrides.
    pub fn load() -> Self {
        Self::from_file().with_env_overrides()
    }

    fn from_file() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded application config");
                    raw.into()
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

    /// `PORT`, `APP_ENV` and `GAME_RANK_STORE` take precedence over the file.
    fn with_env_overrides(mut self) -> Self {
        if let Some(port) = env::var("PORT").ok().and_then(|value| value.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Ok(app_env) = env::var("APP_ENV") {
            self.dev = app_env.eq_ignore_ascii_case("development");
        }
        match env::var("GAME_RANK_STORE") {
            Ok(value) => match StoreKind::parse(&value) {
                Some(kind) => self.store = kind,
                None => warn!(
                    value = %value,
                    store = ?self.store,
                    "unknown GAME_RANK_STORE value; keeping configured store"
                ),
            },
            Err(_) if env::var_os("MONGO_URI").is_some() => self.store = StoreKind::Mongo,
            Err(_) => {}
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_owned(),
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            dev: false,
            port: DEFAULT_PORT,
            store: StoreKind::Memory,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    app_name: Option<String>,
    public_dir: Option<PathBuf>,
    #[serde(default)]
    dev: bool,
    port: Option<u16>,
    store: Option<StoreKind>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            app_name: value.app_name.unwrap_or(defaults.app_name),
            public_dir: value.public_dir.unwrap_or(defaults.public_dir),
            dev: value.dev,
            port: value.port.unwrap_or(defaults.port),
            store: value.store.unwrap_or(defaults.store),
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
