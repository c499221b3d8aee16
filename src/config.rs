use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Application configuration, loaded from config.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host to bind to (default: 0.0.0.0)
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 9000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL path (default: /)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Session secret for cookie signing
    #[serde(default = "default_session_secret")]
    pub session_secret: String,

    /// Path to SQLite database
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Path for uploaded images/documents, served under /uploads
    #[serde(default = "default_upload_path")]
    pub upload_path: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Google API key used for both the YouTube and the Drive catalog APIs
    #[serde(default)]
    pub google_api_key: String,

    /// Base URL of the Google APIs host (override in tests)
    #[serde(default = "default_google_api_base")]
    pub google_api_base: String,

    /// Playlist ID for Sunday worship sermon videos
    #[serde(default)]
    pub youtube_playlist_sunday: String,

    /// Playlist ID for dawn worship sermon videos
    #[serde(default)]
    pub youtube_playlist_dawn: String,

    /// Drive folder ID holding the weekly bulletin images
    #[serde(default)]
    pub drive_folder_id: String,

    /// Bearer token guarding the externally-invoked sync endpoints.
    /// The endpoints refuse to run while this is unset.
    #[serde(default)]
    pub sync_token: Option<String>,

    /// Public YouTube channel URL shown on the sermons page
    #[serde(default = "default_channel_url")]
    pub youtube_channel_url: String,

    /// HTTP timeout for external catalog calls, in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    9000
}
fn default_base_url() -> String {
    "/".to_string()
}
fn default_session_secret() -> String {
    "church-session-secret".to_string()
}
fn default_db_path() -> PathBuf {
    expand_home("~/church/church.db")
}
fn default_upload_path() -> PathBuf {
    expand_home("~/church/uploads")
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_google_api_base() -> String {
    "https://www.googleapis.com".to_string()
}
fn default_channel_url() -> String {
    "https://www.youtube.com/@wethechurch0424".to_string()
}
fn default_http_timeout() -> u64 {
    20
}

impl Config {
    /// Load configuration from file, with fallback to defaults
    /// Precedence: config file > environment variables > defaults
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path.unwrap_or("~/.config/church/config.yml");
        let expanded_path = expand_home(config_path);

        let mut config = if expanded_path.exists() {
            tracing::info!("Loading config from: {}", expanded_path.display());
            let content = fs::read_to_string(&expanded_path)?;
            serde_yaml::from_str::<Config>(&content).map_err(|e| {
                crate::error::Error::Config(format!("Failed to parse config: {}", e))
            })?
        } else {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                expanded_path.display()
            );
            Self::default_config()
        };

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Expand all path fields
        config.expand_paths();

        // Validate configuration
        config.validate()?;

        // Create config file if it doesn't exist
        if !expanded_path.exists() {
            config.save_default(&expanded_path)?;
        }

        Ok(config)
    }

    /// Create default configuration
    fn default_config() -> Self {
        Config {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
            session_secret: default_session_secret(),
            db_path: default_db_path(),
            upload_path: default_upload_path(),
            log_level: default_log_level(),
            google_api_key: String::new(),
            google_api_base: default_google_api_base(),
            youtube_playlist_sunday: String::new(),
            youtube_playlist_dawn: String::new(),
            drive_folder_id: String::new(),
            sync_token: None,
            youtube_channel_url: default_channel_url(),
            http_timeout_seconds: default_http_timeout(),
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CHURCH_HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("CHURCH_PORT") {
            if let Ok(port) = val.parse() {
                self.port = port;
            }
        }
        if let Ok(val) = std::env::var("CHURCH_BASE_URL") {
            self.base_url = val;
        }
        if let Ok(val) = std::env::var("CHURCH_DB_PATH") {
            self.db_path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("CHURCH_LOG_LEVEL") {
            self.log_level = val;
        }
        if let Ok(val) = std::env::var("GOOGLE_API_KEY") {
            self.google_api_key = val;
        }
        if let Ok(val) = std::env::var("YOUTUBE_PLAYLIST_SUNDAY") {
            self.youtube_playlist_sunday = val;
        }
        if let Ok(val) = std::env::var("YOUTUBE_PLAYLIST_DAWN") {
            self.youtube_playlist_dawn = val;
        }
        if let Ok(val) = std::env::var("GOOGLE_DRIVE_FOLDER_ID") {
            self.drive_folder_id = val;
        }
        if let Ok(val) = std::env::var("CHURCH_SYNC_TOKEN") {
            self.sync_token = Some(val);
        }
    }

    /// Expand ~ in all path fields
    fn expand_paths(&mut self) {
        self.db_path = expand_home_path(&self.db_path);
        self.upload_path = expand_home_path(&self.upload_path);
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        // base_url must start with /
        if !self.base_url.starts_with('/') {
            return Err(crate::error::Error::Config(format!(
                "base_url must start with '/', got: {}",
                self.base_url
            )));
        }

        if let Some(token) = &self.sync_token {
            if token.is_empty() {
                return Err(crate::error::Error::Config(
                    "sync_token must not be empty when set".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Save default configuration to file
    fn save_default(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self).map_err(|e| {
            crate::error::Error::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, yaml)?;
        tracing::info!("Created default config at: {}", path.display());

        Ok(())
    }

    /// Get the database URL for SQLx
    pub fn database_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.db_path.display())
    }
}

/// Expand ~ to home directory in a string path
fn expand_home(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Expand ~ in a PathBuf
fn expand_home_path(path: &PathBuf) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        expand_home(path_str)
    } else {
        path.clone()
    }
}
