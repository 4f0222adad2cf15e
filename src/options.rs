//! Polling and parsing options shared by both watcher loops.

use crate::parse::CsvFormat;
use std::time::Duration;

/// Default wait between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Wait before retrying when the tailed file is missing or locked.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Wait after a failed cycle before trying again.
pub const DEFAULT_RECOVERY_BACKOFF: Duration = Duration::from_secs(1);

/// Options for [`watch_append`](crate::watch_append) and
/// [`watch_latest`](crate::watch_latest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    /// Wait between polls. Zero polls again right away.
    pub interval: Duration,
    pub retry_backoff: Duration,
    pub recovery_backoff: Duration,
    /// Drop the first line of the tailed file. Only the append watcher uses it.
    pub skip_header: bool,
    pub format: CsvFormat,
    /// Also wake up early on filesystem change notifications.
    pub notify: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            recovery_backoff: DEFAULT_RECOVERY_BACKOFF,
            skip_header: true,
            format: CsvFormat::default(),
            notify: false,
        }
    }
}

impl WatchOptions {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Poll interval in whole seconds; zero or negative means no wait.
    pub fn with_interval_secs(self, secs: i64) -> Self {
        self.with_interval(interval_from_secs(secs))
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_recovery_backoff(mut self, backoff: Duration) -> Self {
        self.recovery_backoff = backoff;
        self
    }

    pub fn with_skip_header(mut self, skip_header: bool) -> Self {
        self.skip_header = skip_header;
        self
    }

    pub fn with_format(mut self, format: CsvFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_notify(mut self, notify: bool) -> Self {
        self.notify = notify;
        self
    }
}

pub fn interval_from_secs(secs: i64) -> Duration {
    if secs <= 0 {
        Duration::ZERO
    } else {
        Duration::from_secs(secs as u64)
    }
}
