use std::fmt::Arguments;

use log::{Level, LevelFilter};

use crate::io::ReplConfig;

/// Diagnostic sink owned by a session.
///
/// Messages go to the `log` facade under the session target, and only when the level is within the
/// session verbosity: two sessions may log under different targets and verbosities.
#[derive(Clone, Debug)]
pub struct Diagnostics {
    target: String,
    verbosity: LevelFilter,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::from(&ReplConfig::default())
    }
}

impl From<&ReplConfig> for Diagnostics {
    fn from(config: &ReplConfig) -> Self {
        Self {
            target: config.log_target.clone(),
            verbosity: config.verbosity,
        }
    }
}

impl Diagnostics {
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn verbosity(&self) -> LevelFilter {
        self.verbosity
    }

    /// Indicates whether a message at `level` would be forwarded.
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.verbosity && log::log_enabled!(target: self.target.as_str(), level)
    }

    pub fn log(&self, level: Level, args: Arguments<'_>) {
        if level <= self.verbosity {
            log::log!(target: self.target.as_str(), level, "{}", args);
        }
    }

    pub fn trace(&self, args: Arguments<'_>) {
        self.log(Level::Trace, args)
    }

    pub fn debug(&self, args: Arguments<'_>) {
        self.log(Level::Debug, args)
    }

    pub fn warn(&self, args: Arguments<'_>) {
        self.log(Level::Warn, args)
    }

    pub fn error(&self, args: Arguments<'_>) {
        self.log(Level::Error, args)
    }
}
