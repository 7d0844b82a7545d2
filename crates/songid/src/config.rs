use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pipeline::settings::DEFAULT_MARKER_TOKEN;
use pipeline::{CycleSettings, NotificationSettings, NotifyTarget};
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RECOGNIZER_ENDPOINT: &str = "http://127.0.0.1:8765/recognize";
const SENDER_PATTERN: &str = r"^\+[0-9]+$";
const GROUP_PATTERN: &str = r"^group\.[A-Za-z0-9+/=]+$";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARNING" => Some(LogLevel::Warning),
            "ERROR" => Some(LogLevel::Error),
            "CRITICAL" => Some(LogLevel::Critical),
            _ => None,
        }
    }

    /// `EnvFilter` directive; tracing has no level above error.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(rename = "logLevel")]
    pub log_level: String,
    pub monitored_paths: Vec<String>,
    #[serde(rename = "maxQueueSize")]
    pub max_queue_size: i64,
    #[serde(rename = "checkInterval")]
    pub check_interval: i64,
    #[serde(rename = "renameAndMoveOnly")]
    pub rename_and_move_only: bool,
    #[serde(rename = "artistSubfolders")]
    pub artist_subfolders: bool,
    #[serde(rename = "notifySignal")]
    pub notify_signal: bool,
    #[serde(rename = "notifyEachSong")]
    pub notify_each_song: bool,
    #[serde(rename = "notifySummary")]
    pub notify_summary: i64,
    #[serde(rename = "signalSender")]
    pub signal_sender: String,
    #[serde(rename = "signalGroup")]
    pub signal_group: String,
    #[serde(rename = "signalEndpoint")]
    pub signal_endpoint: String,
    #[serde(rename = "markerToken")]
    pub marker_token: String,
    #[serde(rename = "recognizerEndpoint")]
    pub recognizer_endpoint: String,
    #[serde(rename = "recognizerTimeout")]
    pub recognizer_timeout: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            monitored_paths: Vec::new(),
            max_queue_size: 50,
            check_interval: 300,
            rename_and_move_only: false,
            artist_subfolders: false,
            notify_signal: false,
            notify_each_song: false,
            notify_summary: 5,
            signal_sender: String::new(),
            signal_group: String::new(),
            signal_endpoint: String::new(),
            marker_token: DEFAULT_MARKER_TOKEN.to_string(),
            recognizer_endpoint: DEFAULT_RECOGNIZER_ENDPOINT.to_string(),
            recognizer_timeout: 30,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, err) => write!(f, "cannot read {}: {}", path.display(), err),
            ConfigError::Json(err) => write!(f, "invalid JSON in config file: {}", err),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err)
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

/// First CLI argument, then `SONGID_CONFIG`, then `config.json` next to the binary.
pub fn config_path(arg: Option<String>) -> PathBuf {
    resolve_config_path(arg, env::var("SONGID_CONFIG").ok())
}

fn resolve_config_path(arg: Option<String>, env_value: Option<String>) -> PathBuf {
    if let Some(value) = arg.filter(|v| !v.trim().is_empty()) {
        return PathBuf::from(value);
    }
    match env_value {
        Some(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json")),
        Err(_) => PathBuf::from("config.json"),
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
    let mut config: AppConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        LogLevel::parse(&self.log_level).ok_or_else(|| {
            invalid(format!(
                "logLevel must be one of DEBUG, INFO, WARNING, ERROR, CRITICAL, not {}",
                self.log_level
            ))
        })
    }

    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.log_level()?;
        self.log_level = self.log_level.trim().to_ascii_uppercase();

        if self.monitored_paths.is_empty() {
            return Err(invalid("at least one entry in monitored_paths is required"));
        }
        for path in &self.monitored_paths {
            if !Path::new(path).is_dir() {
                return Err(invalid(format!("monitored path not found: {}", path)));
            }
        }
        if self.max_queue_size <= 0 {
            return Err(invalid("maxQueueSize must be greater than 0"));
        }
        if self.check_interval <= 0 {
            return Err(invalid("checkInterval must be greater than 0"));
        }
        if self.notify_summary < 0 {
            return Err(invalid("notifySummary must not be negative"));
        }
        if self.notify_summary > self.max_queue_size {
            return Err(invalid(format!(
                "notifySummary ({}) must be less than or equal to maxQueueSize ({})",
                self.notify_summary, self.max_queue_size
            )));
        }
        if self.recognizer_timeout <= 0 {
            return Err(invalid("recognizerTimeout must be greater than 0"));
        }
        if self.marker_token.trim().is_empty() {
            return Err(invalid("markerToken must not be blank"));
        }
        if !matches_pattern(SENDER_PATTERN, &self.signal_sender)? {
            return Err(invalid("signalSender must be a phone number like +1234567890"));
        }
        if !matches_pattern(GROUP_PATTERN, &self.signal_group)? {
            return Err(invalid("signalGroup must look like group.<base64 id>"));
        }
        check_http_url("signalEndpoint", &self.signal_endpoint)?;
        check_http_url("recognizerEndpoint", &self.recognizer_endpoint)?;
        Ok(())
    }

    pub fn recognizer_timeout(&self) -> Duration {
        Duration::from_secs(self.recognizer_timeout.max(1) as u64)
    }

    pub fn to_cycle_settings(&self) -> CycleSettings {
        CycleSettings {
            monitored_paths: self.monitored_paths.iter().map(PathBuf::from).collect(),
            check_interval: Duration::from_secs(self.check_interval.max(1) as u64),
            max_queue_size: self.max_queue_size.max(1) as usize,
            rename_and_move_only: self.rename_and_move_only,
            artist_subfolders: self.artist_subfolders,
            marker_token: self.marker_token.trim().to_string(),
            notifications: NotificationSettings {
                enabled: self.notify_signal,
                each_song: self.notify_each_song,
                summary_min: self.notify_summary.max(0) as usize,
                target: NotifyTarget {
                    endpoint: self.signal_endpoint.trim_end_matches('/').to_string(),
                    sender: self.signal_sender.clone(),
                    recipients: vec![self.signal_group.clone()],
                },
            },
        }
    }
}

fn matches_pattern(pattern: &str, value: &str) -> Result<bool, ConfigError> {
    let re = Regex::new(pattern).map_err(|err| invalid(err.to_string()))?;
    Ok(re.is_match(value))
}

fn check_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value.trim()).map_err(|err| invalid(format!("{} is not a valid URL: {}", field, err)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("{} must use http or https, not {}", field, other))),
    }
}
