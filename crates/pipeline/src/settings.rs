use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MARKER_TOKEN: &str = "roybatty";
pub const MANUAL_INPUT_DIR: &str = "manual_input";

#[derive(Clone, Debug)]
pub struct CycleSettings {
    pub monitored_paths: Vec<PathBuf>,
    pub check_interval: Duration,
    pub max_queue_size: usize,
    pub rename_and_move_only: bool,
    pub artist_subfolders: bool,
    pub marker_token: String,
    pub notifications: NotificationSettings,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            monitored_paths: Vec::new(),
            check_interval: Duration::from_secs(300),
            max_queue_size: 50,
            rename_and_move_only: false,
            artist_subfolders: false,
            marker_token: DEFAULT_MARKER_TOKEN.to_string(),
            notifications: NotificationSettings::default(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub each_song: bool,
    pub summary_min: usize,
    pub target: NotifyTarget,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotifyTarget {
    pub endpoint: String,
    pub sender: String,
    pub recipients: Vec<String>,
}
