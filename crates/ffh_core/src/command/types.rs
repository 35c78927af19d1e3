//! Command types: operations, invocations, and plans.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::timecode::TimeCode;

/// Errors that can occur while building a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("end time {end} is not after start time {start}")]
    EndNotAfterStart { start: String, end: String },

    #[error("concatenation needs at least 2 inputs, got {0}")]
    TooFewInputs(usize),

    #[error("source path has no file name: {0}")]
    BadSourcePath(PathBuf),
}

/// Result type for command building.
pub type CommandResult<T> = Result<T, CommandError>;

/// How the second time value of a trim is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimMode {
    /// The value is a length; seek happens before the input is opened.
    #[default]
    Duration,
    /// The value is an absolute end position in the source.
    EndTime,
}

/// One user action against a media file.
///
/// Owned transiently by the caller for the duration of one operation.
#[derive(Debug, Clone)]
pub enum MediaOperation {
    /// Cut a sub-range out of `source` by stream copy.
    ///
    /// In [`TrimMode::Duration`], `end` is the clip length rather than
    /// an absolute position.
    Trim {
        source: PathBuf,
        start: TimeCode,
        end: TimeCode,
        mode: TrimMode,
    },
    /// Copy the audio track of `source` into an `.m4a` next to it.
    ExtractAudio { source: PathBuf },
    /// Join two or more clips into one file, in the given order.
    Concat { sources: Vec<PathBuf> },
}

/// A single ready-to-spawn ffmpeg invocation.
///
/// `working_dir` is carried on the command itself so callers never have
/// to mutate the process-wide current directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegCommand {
    /// Program name or path (normally `ffmpeg`).
    pub program: String,
    /// Arguments, passed directly to the process.
    pub args: Vec<String>,
    /// Directory to run in, if the invocation depends on one.
    pub working_dir: Option<PathBuf>,
}

impl fmt::Display for FfmpegCommand {
    /// Space-joined rendering for log output only; never fed to a shell.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// The invocations an operation expands to.
#[derive(Debug, Clone)]
pub enum CommandPlan {
    /// Trim and audio extraction are one invocation.
    Single {
        command: FfmpegCommand,
        /// File the invocation writes.
        output: PathBuf,
    },
    /// Concatenation runs in two phases: remux every input to an
    /// intermediate transport-stream file, then merge the intermediates.
    /// The remux phase must fully complete before the merge starts.
    TwoPhase {
        remux: Vec<FfmpegCommand>,
        merge: FfmpegCommand,
        /// Intermediate files the remux phase writes. Kept after the
        /// merge unless the caller opts into cleanup.
        intermediates: Vec<PathBuf>,
        output: PathBuf,
    },
}

impl CommandPlan {
    /// File the whole plan ultimately produces.
    pub fn output(&self) -> &PathBuf {
        match self {
            CommandPlan::Single { output, .. } => output,
            CommandPlan::TwoPhase { output, .. } => output,
        }
    }
}
