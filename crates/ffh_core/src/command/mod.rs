//! ffmpeg command construction.
//!
//! This module turns a [`MediaOperation`] into ready-to-spawn argument
//! vectors. Arguments are always passed to the process as a vector,
//! never through a shell, so file names containing shell metacharacters
//! are inert.
//!
//! # Architecture
//!
//! - **types**: `MediaOperation`, `FfmpegCommand`, `CommandPlan`
//! - **builder**: `CommandBuilder` converts an operation into a plan

mod builder;
mod types;

pub use builder::CommandBuilder;
pub use types::{
    CommandError, CommandPlan, CommandResult, FfmpegCommand, MediaOperation, TrimMode,
};
