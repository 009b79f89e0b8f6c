//! Configuration management for the vocabulary service.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::repository::{QueryLimits, WordRepository};
use crate::store::util::{is_memory_url, sqlite_path};
use crate::store::{
    DocumentStore, InMemoryDocumentStore, SqliteDocumentStore, StoreError, StoreResult,
};

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "vocab.db";

/// Default listen address for the HTTP server.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Name `prefer` discovers config files under (`vocab.toml`, `vocab.yaml`, ...).
const CONFIG_BASENAME: &str = "vocab";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename inside `data_dir`.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    /// `memory` selects the in-memory store; anything else is SQLite.
    pub database_url: Option<String>,
    /// Address the HTTP server listens on.
    pub bind: String,
    /// Run the backfill migrator for every language before serving.
    pub migrate_on_startup: bool,
    pub limits: QueryLimits,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vocab");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            bind: DEFAULT_BIND.to_string(),
            migrate_on_startup: true,
            limits: QueryLimits::default(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        match self.database_url {
            Some(ref url) => url.clone(),
            None => format!("sqlite:{}", self.database_path().display()),
        }
    }

    /// Get the full path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        match self.database_url {
            Some(ref url) if !is_memory_url(url) => PathBuf::from(sqlite_path(url)),
            _ => self.data_dir.join(&self.database_filename),
        }
    }

    pub fn is_memory(&self) -> bool {
        self.database_url.as_deref().is_some_and(is_memory_url)
    }

    /// Ensure the data directory and the database's parent directory exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        let mut dirs = vec![self.data_dir.clone()];
        if let Some(parent) = self.database_path().parent() {
            if !parent.as_os_str().is_empty() {
                dirs.push(parent.to_path_buf());
            }
        }
        for dir in dirs {
            fs::create_dir_all(&dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("Failed to create directory '{}': {}", dir.display(), e),
                )
            })?;
        }
        Ok(())
    }

    /// Open the configured document store, creating the schema if needed.
    pub async fn open_store(&self) -> StoreResult<Arc<dyn DocumentStore>> {
        if self.is_memory() {
            tracing::debug!("Using in-memory document store");
            return Ok(Arc::new(InMemoryDocumentStore::new()));
        }

        self.ensure_directories()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let url = self.database_url();
        tracing::debug!("Opening SQLite document store at {}", url);
        let store = SqliteDocumentStore::open(&url).await?;
        Ok(Arc::new(store))
    }

    /// Build the word repository.
    ///
    /// A store that fails to open leaves the repository unavailable instead of
    /// failing, so the process still starts and reports the condition per request.
    pub async fn word_repository(&self) -> WordRepository {
        match self.open_store().await {
            Ok(store) => WordRepository::new(store, self.limits.clone()),
            Err(e) => {
                tracing::error!("Document store unavailable: {}", e);
                WordRepository::unavailable(self.limits.clone())
            }
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "target")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Full database URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Server listen address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate_on_startup: Option<bool>,
    /// Query caps and pool sizes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<QueryLimits>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Find a `vocab` config file in the standard locations.
    ///
    /// `prefer` does the discovery; the file itself is parsed with serde by
    /// [`Config::load_from_path`].
    pub async fn discover() -> Option<PathBuf> {
        match prefer::load(CONFIG_BASENAME).await {
            Ok(found) => found.source_path().map(|path| path.to_path_buf()),
            Err(_) => {
                tracing::debug!("No {} config file discovered", CONFIG_BASENAME);
                None
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref url) = self.database_url {
            settings.database_url = Some(url.clone());
        }
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
        if let Some(migrate) = self.migrate_on_startup {
            settings.migrate_on_startup = migrate;
        }
        if let Some(ref limits) = self.limits {
            settings.limits = limits.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory or database file (--target flag).
    pub target: Option<PathBuf>,
}

/// Apply a `--target` path: a `.db` file selects the database directly,
/// anything else is the data directory.
fn apply_target(settings: &mut Settings, target: &Path) {
    let is_db_file = target
        .extension()
        .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3");

    if is_db_file {
        if let Some(name) = target.file_name().and_then(|n| n.to_str()) {
            settings.database_filename = name.to_string();
        }
        settings.data_dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
    } else {
        settings.data_dir = target.to_path_buf();
    }
    settings.database_url = None;
}

/// Load settings with explicit options.
///
/// Precedence: defaults, then the config file, then `DATABASE_URL` and
/// `VOCAB_BIND`, then the `--target` flag.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let config_path = match options.config_path.clone() {
        Some(path) => Some(path),
        None => Config::discover().await,
    };
    let config = match config_path {
        Some(ref path) => match Config::load_from_path(path).await {
            Ok(config) => {
                tracing::debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                Config::default()
            }
        },
        None => Config::default(),
    };

    let mut settings = Settings::default();
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(database_url) = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
        tracing::debug!("Using DATABASE_URL from environment: {}", database_url);
        settings.database_url = Some(database_url);
    }

    if let Some(bind) = std::env::var("VOCAB_BIND").ok().filter(|s| !s.is_empty()) {
        tracing::debug!("Using VOCAB_BIND from environment: {}", bind);
        settings.bind = bind;
    }

    if let Some(ref target) = options.target {
        apply_target(&mut settings, target);
    }

    (settings, config)
}
