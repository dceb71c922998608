use crate::error::ConfigError;
use crate::workflow::StoryMode;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Max tracing level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub publish: PublishConfig,

    #[serde(default)]
    pub login: LoginConfig,
}

fn default_log_level() -> String {
    "info".into()
}

// ── Remote service ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the content/publishing service
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for generation, config and verification calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Timeout for the publish call; delivery with Stories is slow
    #[serde(default = "default_publish_timeout_secs")]
    pub publish_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".into()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_publish_timeout_secs() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            publish_timeout_secs: default_publish_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

// ── Publish workflow ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Story mode preselected by the front-end: none, channel, personal, both
    #[serde(default)]
    pub default_story_mode: StoryMode,
    /// Pause between an accepted verification code and the resumed publish
    #[serde(default = "default_resume_delay_ms")]
    pub resume_delay_ms: u64,
    /// Clear content and approvals after a partially successful publish
    #[serde(default = "default_true")]
    pub clear_on_partial: bool,
    /// Case-insensitive fragments that mark a failure message as an
    /// authentication problem when the service does not flag it itself
    #[serde(default = "default_auth_failure_markers")]
    pub auth_failure_markers: Vec<String>,
}

fn default_resume_delay_ms() -> u64 {
    1_000
}

fn default_true() -> bool {
    true
}

fn default_auth_failure_markers() -> Vec<String> {
    [
        "верификация",
        "авторизация",
        "код",
        "verification",
        "authorization",
        "auth code",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl PublishConfig {
    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            default_story_mode: StoryMode::default(),
            resume_delay_ms: default_resume_delay_ms(),
            clear_on_partial: true,
            auth_failure_markers: default_auth_failure_markers(),
        }
    }
}

// ── Telegram login ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginConfig {
    /// Seconds between checks while waiting for a QR code to be scanned
    #[serde(default = "default_qr_poll_interval_secs")]
    pub qr_poll_interval_secs: u64,
    /// Checks before giving up on a QR login
    #[serde(default = "default_qr_max_polls")]
    pub qr_max_polls: u32,
}

fn default_qr_poll_interval_secs() -> u64 {
    2
}

fn default_qr_max_polls() -> u32 {
    60
}

impl LoginConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.qr_poll_interval_secs)
    }
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            qr_poll_interval_secs: default_qr_poll_interval_secs(),
            qr_max_polls: default_qr_max_polls(),
        }
    }
}

// ── Loading / saving ─────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        Self {
            config_path: home.join(".postgate").join("config.toml"),
            log_level: default_log_level(),
            service: ServiceConfig::default(),
            publish: PublishConfig::default(),
            login: LoginConfig::default(),
        }
    }
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let postgate_dir = home.join(".postgate");

        if !postgate_dir.exists() {
            fs::create_dir_all(&postgate_dir).context("Failed to create .postgate directory")?;
        }

        Self::load_or_init_at(postgate_dir.join("config.toml"))
    }

    /// Load the config at `config_path`, writing defaults when it is missing.
    pub fn load_or_init_at(config_path: PathBuf) -> Result<Self> {
        let mut config = if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config = toml::from_str(&contents)
                .map_err(|e| ConfigError::Load(e.to_string()))
                .context("Failed to parse config file")?;
            // Set computed path that is skipped during serialization
            config.config_path.clone_from(&config_path);
            config
        } else {
            let config = Self {
                config_path,
                ..Self::default()
            };
            config.save()?;
            config
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("POSTGATE_BASE_URL") {
            if !url.is_empty() {
                self.service.base_url = url;
            }
        }

        if let Ok(level) = std::env::var("POSTGATE_LOG_LEVEL") {
            if !level.is_empty() {
                self.log_level = level;
            }
        }

        if let Ok(mode) = std::env::var("POSTGATE_STORY_MODE") {
            if let Ok(mode) = StoryMode::from_str(&mode) {
                self.publish.default_story_mode = mode;
            }
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let url = url::Url::parse(&self.service.base_url).map_err(|e| {
            ConfigError::Validation(format!("service.base_url is not a valid URL: {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "service.base_url must use http or https, got {}",
                url.scheme()
            )));
        }

        for (name, value) in [
            ("request_timeout_secs", self.service.request_timeout_secs),
            ("publish_timeout_secs", self.service.publish_timeout_secs),
            ("connect_timeout_secs", self.service.connect_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation(format!(
                    "service.{name} must be greater than zero"
                )));
            }
        }

        if self.login.qr_max_polls == 0 {
            return Err(ConfigError::Validation(
                "login.qr_max_polls must be greater than zero".into(),
            ));
        }

        self.tracing_level()?;
        Ok(())
    }

    pub fn tracing_level(&self) -> std::result::Result<tracing::Level, ConfigError> {
        tracing::Level::from_str(self.log_level.trim()).map_err(|_| {
            ConfigError::Validation(format!("unknown log_level: {}", self.log_level))
        })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
