use std::collections::VecDeque;
use std::sync::Once;

use tracing::Level;

static INIT: Once = Once::new();

/// Prefixes every message, e.g. with the feed it concerns.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefixes: VecDeque<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push_back(prefix.into());
        self
    }

    fn prefixed(&self, message: &str) -> String {
        let prefix = self.prefixes.iter().map(|p| format!("{} ", p)).collect::<String>();
        format!("{}{}", prefix, message)
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}", self.prefixed(message));
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}", self.prefixed(message));
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}", self.prefixed(message));
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}", self.prefixed(message));
    }
}

/// Install the fmt subscriber once: INFO by default, DEBUG when `verbose`.
pub fn init_logging(verbose: bool) -> Logger {
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            let level = if verbose { Level::DEBUG } else { Level::INFO };
            tracing_subscriber::fmt().with_max_level(level).init();
        });
    }
    Logger::new()
}
