//! Configuration: runtime settings plus an optional user config file.
//!
//! `Settings` is always fully populated and is what the rest of the crate
//! consumes. `Config` mirrors the optional on-disk file (discovered via
//! `prefer`, or pointed at with `--config`) and is merged into the
//! defaults; a handful of environment variables override both.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::llm::EnhancerConfig;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "blogforge.db";

/// Blog listing scraped when nothing else is configured.
pub const DEFAULT_BLOG_URL: &str = "https://beyondchats.com/blogs/";

/// Articles scraped per pass by default.
pub const DEFAULT_ARTICLE_COUNT: usize = 5;

/// Search results fetched as references per article by default.
pub const DEFAULT_REFERENCE_LIMIT: usize = 2;

/// Default pause between pipeline steps in milliseconds.
pub const DEFAULT_STEP_DELAY_MS: u64 = 2000;

/// Fully-resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the database.
    pub data_dir: PathBuf,
    /// Filename of the database inside `data_dir`.
    pub database_filename: String,
    /// Explicit database path (overrides data_dir/database_filename when set).
    /// Set via DATABASE_URL env var or the --target flag.
    pub database_override: Option<PathBuf>,
    /// Blog listing page articles are discovered from.
    pub blog_url: String,
    /// Articles scraped per pass.
    pub article_count: usize,
    /// Search results fetched as references per article.
    pub reference_limit: usize,
    /// User agent for HTTP requests and browser pages.
    pub user_agent: String,
    /// Plain HTTP request timeout in seconds.
    pub request_timeout: u64,
    /// Delay between pipeline steps in milliseconds.
    pub step_delay_ms: u64,
    /// Browser navigation timeout in seconds.
    pub navigation_timeout: u64,
    /// Delay after the lazy-load scroll, in milliseconds.
    pub settle_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        // ~/Documents/blogforge, degrading to the home dir and then `.`
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("blogforge");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_override: None,
            blog_url: DEFAULT_BLOG_URL.to_string(),
            article_count: DEFAULT_ARTICLE_COUNT,
            reference_limit: DEFAULT_REFERENCE_LIMIT,
            user_agent: crate::scrapers::USER_AGENT.to_string(),
            request_timeout: 30,
            step_delay_ms: DEFAULT_STEP_DELAY_MS,
            navigation_timeout: 30,
            settle_ms: 3000,
        }
    }
}

impl Settings {
    /// Settings rooted at a specific data directory.
    #[allow(dead_code)]
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Full path of the database file.
    pub fn database_path(&self) -> PathBuf {
        match &self.database_override {
            Some(path) => path.clone(),
            None => self.data_dir.join(&self.database_filename),
        }
    }

    /// Whether the database file already exists on disk.
    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    /// Pause between pipeline steps.
    pub fn step_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.step_delay_ms)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        let dir = match &self.database_override {
            Some(path) => path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            None => self.data_dir.clone(),
        };
        fs::create_dir_all(&dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to create data directory '{}': {}", dir.display(), e),
            )
        })
    }
}

/// Shape of the optional user config file. Every field is optional;
/// unset fields keep their [`Settings`] defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Data directory, possibly relative to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "target")]
    pub data_dir: Option<String>,
    /// Database filename override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Blog listing URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blog_url: Option<String>,
    /// Articles scraped per pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_count: Option<u64>,
    /// Search results fetched as references per article.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_limit: Option<u64>,
    /// User agent override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Plain HTTP request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Delay between pipeline steps in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_delay_ms: Option<u64>,
    /// Browser navigation timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_timeout: Option<u64>,
    /// Delay after the lazy-load scroll, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_ms: Option<u64>,
    /// Enhancement provider settings.
    #[serde(default, skip_serializing_if = "EnhancerConfig::is_default")]
    #[prefer(default)]
    pub enhancer: EnhancerConfig,
    /// Where this config was read from; absent for pure defaults.
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover and load a `blogforge` config file from the standard
    /// locations, falling back to defaults when none exists.
    pub async fn load() -> Self {
        // prefer handles discovery; parsing goes through serde below
        match prefer::load("blogforge").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(_) => Self::default(),
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load a config file, picking the parser from its extension
    /// (TOML, YAML, or JSON as the default).
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
        // Env credentials still override file-provided provider settings
        config.enhancer = config.enhancer.with_env_overrides();
        Ok(config)
    }

    /// Directory of the loaded config file, when one was loaded.
    /// Relative paths in the file resolve against it.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a possibly-relative path from the config file: `~` is
    /// expanded, absolute paths pass through, everything else joins
    /// `base_dir`.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Merge the file's set fields into `settings`. Relative paths
    /// resolve against `base_dir`.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref blog_url) = self.blog_url {
            settings.blog_url = blog_url.clone();
        }
        if let Some(count) = self.article_count {
            settings.article_count = count as usize;
        }
        if let Some(limit) = self.reference_limit {
            settings.reference_limit = limit as usize;
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(delay) = self.step_delay_ms {
            settings.step_delay_ms = delay;
        }
        if let Some(timeout) = self.navigation_timeout {
            settings.navigation_timeout = timeout;
        }
        if let Some(settle) = self.settle_ms {
            settings.settle_ms = settle;
        }
    }
}

/// CLI-provided overrides for settings discovery.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file, bypassing auto-discovery.
    pub config_path: Option<PathBuf>,
    /// Resolve relative paths against the working directory instead of
    /// the config file's directory.
    pub use_cwd: bool,
    /// Target directory or database file (--target flag).
    /// Can be a directory containing blogforge.db or a .db file directly.
    pub target: Option<PathBuf>,
}

/// A `--target` argument resolved to a concrete database location.
#[derive(Debug, Clone)]
pub struct ResolvedData {
    pub database_filename: String,
    pub database_path: PathBuf,
}

impl ResolvedData {
    /// Interpret `path` as either a database file or a directory that
    /// holds `blogforge.db`.
    pub fn from_path(path: &Path) -> Self {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(path)
        };

        let is_db_file = path
            .extension()
            .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3")
            || (path.exists() && path.is_file());

        if is_db_file {
            let database_filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(DEFAULT_DATABASE_FILENAME)
                .to_string();
            Self {
                database_filename,
                database_path: path,
            }
        } else {
            let database_filename = DEFAULT_DATABASE_FILENAME.to_string();
            let database_path = path.join(&database_filename);
            Self {
                database_filename,
                database_path,
            }
        }
    }
}

/// Find a `blogforge.{ext}` or `config.{ext}` sitting next to the
/// database, so a targeted data directory can carry its own settings.
fn find_config_next_to_db(data_dir: &Path) -> Option<PathBuf> {
    let extensions = ["json", "json5", "yaml", "yml", "toml", "ini", "xml"];
    let basenames = ["blogforge", "config"];

    for basename in basenames {
        for ext in extensions {
            let path = data_dir.join(format!("{}.{}", basename, ext));
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

/// Reduce a `--target` value to a directory, peeling a database
/// filename off the end when one was given.
fn resolve_data_path_to_dir(path: &Path) -> PathBuf {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };

    if path
        .extension()
        .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3")
    {
        path.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        path
    }
}

/// Pick the config source: an explicit `--config` path wins, then a
/// config sitting next to the targeted data dir, then auto-discovery.
async fn load_file_config(options: &LoadOptions, data_dir_override: Option<&PathBuf>) -> Config {
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path)
            .await
            .unwrap_or_default();
    }

    if let Some(data_dir) = data_dir_override {
        if let Some(config_path) = find_config_next_to_db(data_dir) {
            tracing::debug!("Found config next to data dir: {}", config_path.display());
            return Config::load_from_path(&config_path)
                .await
                .unwrap_or_default();
        }
    }

    Config::load().await
}

/// Build the final settings from defaults, the config file, CLI
/// overrides, and the environment, in that precedence order.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let data_dir_override = options.target.as_ref().map(|d| resolve_data_path_to_dir(d));
    let resolved_data = options.target.as_ref().map(|d| ResolvedData::from_path(d));

    let config = load_file_config(&options, data_dir_override.as_ref()).await;

    let mut settings = Settings::default();

    let base_dir = if options.use_cwd {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        config
            .base_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    };

    config.apply_to_settings(&mut settings, &base_dir);

    // --target override takes precedence for data_dir
    if let Some(data_dir) = data_dir_override {
        settings.data_dir = data_dir;
    }
    if let Some(resolved) = resolved_data {
        settings.database_filename = resolved.database_filename;
        settings.database_override = Some(resolved.database_path);
    }

    // DATABASE_URL environment variable takes highest precedence.
    // Only sqlite paths are supported: `sqlite:///path/to.db` or a bare path.
    if let Some(url) = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
        tracing::debug!("Using DATABASE_URL from environment: {}", url);
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(&url);
        let resolved = ResolvedData::from_path(Path::new(path));
        settings.database_filename = resolved.database_filename;
        settings.database_override = Some(resolved.database_path);
    }

    // BLOG_URL environment variable takes precedence over config
    if let Some(url) = std::env::var("BLOG_URL").ok().filter(|s| !s.is_empty()) {
        tracing::debug!("Using BLOG_URL from environment: {}", url);
        settings.blog_url = url;
    }

    // SCRAPING_DELAY_MS environment variable takes precedence over config
    if let Some(delay) = std::env::var("SCRAPING_DELAY_MS")
        .ok()
        .and_then(|s| s.parse().ok())
    {
        settings.step_delay_ms = delay;
    }

    (settings, config)
}
