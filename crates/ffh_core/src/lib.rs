//! ffh_core - Backend logic for ffhelper
//!
//! This crate contains all business logic with zero UI dependencies:
//! time code handling, ffmpeg command construction, process execution,
//! and operation orchestration. It can be used by a GUI front-end or a
//! CLI tool.

pub mod command;
pub mod config;
pub mod logging;
pub mod ops;
pub mod runner;
pub mod timecode;

pub use command::{CommandBuilder, CommandError, CommandPlan, FfmpegCommand, MediaOperation, TrimMode};
pub use ops::{execute, OpError, OpOutcome, OpResult};
pub use runner::{ProcessRunner, RunnerError, RunnerEvent, RunnerState};
pub use timecode::{TimeCode, TimeCodeError};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
