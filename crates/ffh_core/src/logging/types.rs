//! Logging types and configuration.

use serde::{Deserialize, Serialize};

/// Callback that receives each log message as a string.
///
/// Messages are delivered in order; append-to-log semantics.
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Configuration for operation logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Prefix messages with a wall-clock timestamp.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,

    /// Also dump each command's argv as JSON before running it.
    #[serde(default)]
    pub show_command_json: bool,

    /// Number of recent lines kept for error diagnosis.
    #[serde(default = "default_tail")]
    pub error_tail: usize,
}

fn default_true() -> bool {
    true
}

fn default_tail() -> usize {
    20
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            show_timestamps: default_true(),
            show_command_json: false,
            error_tail: default_tail(),
        }
    }
}
