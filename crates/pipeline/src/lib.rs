pub mod fallback;
pub mod marker;
pub mod notify;
mod process;
pub mod relocate;
pub mod scheduler;
pub mod settings;

#[cfg(test)]
mod test_support;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::TrackMatch;
use metadata::{CoverArt, TagStore};

pub use notify::NotifyOptions;
pub use scheduler::{scan_folder, FolderReport, TokioClock};
pub use settings::{CycleSettings, NotificationSettings, NotifyTarget};

#[derive(Debug)]
pub enum RecognizeError {
    Io(std::io::Error),
    Transport(String),
    Status(u16),
    Decode(String),
}

impl std::fmt::Display for RecognizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognizeError::Io(err) => write!(f, "io error: {}", err),
            RecognizeError::Transport(err) => write!(f, "transport error: {}", err),
            RecognizeError::Status(status) => write!(f, "recognition service returned http {}", status),
            RecognizeError::Decode(err) => write!(f, "invalid recognition response: {}", err),
        }
    }
}

impl std::error::Error for RecognizeError {}

impl From<std::io::Error> for RecognizeError {
    fn from(err: std::io::Error) -> Self {
        RecognizeError::Io(err)
    }
}

/// Fingerprint lookup. `Ok(None)` means the service had no match.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, path: &Path) -> Result<Option<TrackMatch>, RecognizeError>;
}

#[async_trait]
pub trait CoverSource: Send + Sync {
    async fn fetch_cover(&self, url: &str) -> Result<CoverArt, String>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        target: &NotifyTarget,
        fields: &[(String, String)],
        options: &NotifyOptions,
    ) -> Result<(), String>;
}

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

#[derive(Clone)]
pub struct Pipeline {
    recognizer: Arc<dyn Recognizer>,
    tags: Arc<dyn TagStore>,
    covers: Arc<dyn CoverSource>,
    notifier: Arc<dyn Notifier>,
}

impl Pipeline {
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        tags: Arc<dyn TagStore>,
        covers: Arc<dyn CoverSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            recognizer,
            tags,
            covers,
            notifier,
        }
    }
}
