use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::config::LogLevel;

pub struct Logging {
    handle: Option<reload::Handle<EnvFilter, Registry>>,
    level: LogLevel,
}

pub fn init(level: LogLevel) -> Logging {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Logging { handle: None, level };
    }

    let (filter, handle) = reload::Layer::new(EnvFilter::new(level.directive()));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
    Logging {
        handle: Some(handle),
        level,
    }
}

impl Logging {
    pub fn apply(&mut self, level: LogLevel) {
        if level == self.level {
            return;
        }
        let Some(handle) = &self.handle else {
            return;
        };
        match handle.reload(EnvFilter::new(level.directive())) {
            Ok(()) => {
                self.level = level;
                info!("Log level set to {}", level.directive());
            }
            Err(err) => warn!("Failed to change log level: {}", err),
        }
    }
}
