//! Runner states, events, and errors.

use std::io;

use thiserror::Error;

/// Lifecycle of one runner invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerState {
    /// No command has been started.
    #[default]
    Idle,
    /// A worker is streaming output.
    Running,
    /// The output stream was exhausted normally.
    Completed,
    /// Spawning or reading failed.
    Failed,
}

/// Events delivered to the caller while a command runs.
///
/// Line events arrive in the order the process produced them (per
/// stream); the terminal `Done` event always comes last, on both the
/// success and the failure path. On failure a single `Error` event
/// precedes `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerEvent {
    /// One decoded output line, append-to-log semantics.
    Line(String),
    /// Spawn or read failure description.
    Error(String),
    /// Terminal event. `decode_failures` counts lines that decoded in
    /// neither UTF-8 nor GBK and were dropped.
    Done { decode_failures: u64 },
}

/// Errors that can occur while running a command.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("a command is already running")]
    AlreadyRunning,

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to capture process {0}")]
    Pipe(&'static str),

    #[error("failed to read process output: {0}")]
    Read(#[from] io::Error),
}

/// Result type for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;
