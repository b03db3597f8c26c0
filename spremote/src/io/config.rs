use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::LevelFilter;

use crate::io::repl::constants::{EXECUTE_TIMEOUT, READ_TIMEOUT, SENTINEL};

/// How the completion marker is built for each command.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SentinelMode {
    /// The same marker for every command (`#<<<done>>>`).
    #[default]
    Fixed,
    /// The marker is suffixed with a per-session command counter (`#<<<done>>>:7:`), so a marker
    /// echoed late by an abandoned command never completes a later one.
    Sequenced,
}

/// Session configuration.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use spremote::io::{ReplConfig, SentinelMode};
///
/// let config = ReplConfig::default()
///     .with_execute_timeout(Some(Duration::from_secs(5)))
///     .with_sentinel_mode(SentinelMode::Sequenced)
///     .with_verbosity(log::LevelFilter::Debug);
/// assert_eq!(config.sentinel, "<<<done>>>");
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct ReplConfig {
    /// Maximum time a single read may block.
    pub read_timeout: Duration,
    /// Default bound of a whole `execute()` call (`None` waits forever).
    pub execute_timeout: Option<Duration>,
    /// Completion marker: must never appear in legitimate output.
    pub sentinel: String,
    /// How the marker is derived per command.
    pub sentinel_mode: SentinelMode,
    /// Log target used by the session diagnostics.
    pub log_target: String,
    /// Most verbose level the session diagnostics forward to the `log` facade.
    pub verbosity: LevelFilter,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            read_timeout: READ_TIMEOUT,
            execute_timeout: Some(EXECUTE_TIMEOUT),
            sentinel: String::from(SENTINEL),
            sentinel_mode: SentinelMode::default(),
            log_target: String::from("spremote"),
            verbosity: LevelFilter::Trace,
        }
    }
}

impl ReplConfig {
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_execute_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.execute_timeout = timeout;
        self
    }

    pub fn with_sentinel<S: Into<String>>(mut self, sentinel: S) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn with_sentinel_mode(mut self, mode: SentinelMode) -> Self {
        self.sentinel_mode = mode;
        self
    }

    pub fn with_log_target<S: Into<String>>(mut self, target: S) -> Self {
        self.log_target = target.into();
        self
    }

    pub fn with_verbosity(mut self, verbosity: LevelFilter) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// The options used by a plain `execute()` call.
    pub fn execute_options(&self) -> ExecuteOptions {
        ExecuteOptions {
            timeout: self.execute_timeout,
            cancel: None,
        }
    }
}

/// A flag shared between the caller and a running `execute()`.
///
/// Cancelling is observed between two reads, so at most one read timeout after [`cancel`](Self::cancel).
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Bounds of a single `execute()` call.
#[derive(Clone, Debug, Default)]
pub struct ExecuteOptions {
    /// Overall time allowed to observe the completion marker (`None` waits forever).
    pub timeout: Option<Duration>,
    /// Aborts the wait when cancelled.
    pub cancel: Option<CancellationToken>,
}

impl ExecuteOptions {
    /// Waits forever for the command to complete.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

impl Display for ExecuteOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.timeout {
            Some(timeout) => write!(f, "timeout={}ms", timeout.as_millis())?,
            None => write!(f, "timeout=none")?,
        }
        write!(f, ", cancellable={}", self.cancel.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReplConfig::default();
        assert_eq!(config.read_timeout, Duration::from_millis(100));
        assert_eq!(config.execute_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.sentinel, "<<<done>>>");
        assert_eq!(config.sentinel_mode, SentinelMode::Fixed);
        assert_eq!(config.log_target, "spremote");
        assert_eq!(config.verbosity, LevelFilter::Trace);
    }

    #[test]
    fn test_config_builders() {
        let config = ReplConfig::default()
            .with_read_timeout(Duration::from_millis(20))
            .with_execute_timeout(None)
            .with_sentinel("@@end@@")
            .with_sentinel_mode(SentinelMode::Sequenced)
            .with_log_target("hub-a")
            .with_verbosity(LevelFilter::Warn);
        assert_eq!(config.read_timeout, Duration::from_millis(20));
        assert_eq!(config.execute_timeout, None);
        assert_eq!(config.sentinel, "@@end@@");
        assert_eq!(config.sentinel_mode, SentinelMode::Sequenced);
        assert_eq!(config.log_target, "hub-a");
        assert_eq!(config.verbosity, LevelFilter::Warn);
        assert_eq!(config.execute_options().timeout, None);
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let options = ExecuteOptions::unbounded().with_cancel(token.clone());
        assert!(!options.is_cancelled());
        token.cancel();
        assert!(options.is_cancelled());
        assert!(!ExecuteOptions::default().is_cancelled());
    }

    #[test]
    fn test_options_display() {
        let options = ExecuteOptions::default().with_timeout(Duration::from_millis(250));
        assert_eq!(options.to_string(), "timeout=250ms, cancellable=false");
        let options = ExecuteOptions::unbounded().with_cancel(CancellationToken::new());
        assert_eq!(options.to_string(), "timeout=none, cancellable=true");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serde() {
        let json = r#"{"sentinel": "@@end@@", "sentinel_mode": "Sequenced"}"#;
        let config: ReplConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.sentinel, "@@end@@");
        assert_eq!(config.sentinel_mode, SentinelMode::Sequenced);
        assert_eq!(config.read_timeout, Duration::from_millis(100));
    }
}
