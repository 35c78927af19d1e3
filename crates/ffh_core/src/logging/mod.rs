//! User-facing operation logging.
//!
//! Diagnostics inside the crate go through `tracing`; the streamed
//! ffmpeg output that the user watches goes through [`OpLogger`],
//! which writes to an optional log file and forwards every line to a
//! caller-supplied callback (a GUI appends it to its log panel, the
//! CLI prints it).

mod op_logger;
mod types;

pub use op_logger::OpLogger;
pub use types::{LogCallback, LogSettings};
