//! External process execution.
//!
//! Two primitives live here:
//!
//! - [`ProcessRunner`]: launches a command on a worker thread and
//!   streams its output lines back over an `mpsc` channel, one
//!   [`RunnerEvent`] per line, terminated by exactly one `Done` event.
//! - [`run_captured`]: blocking one-shot invocation with the full
//!   combined output captured, used by callers that must consume one
//!   phase completely before starting the next.

mod process;
mod types;

pub use process::{run_captured, CapturedOutput, ProcessRunner};
pub use types::{RunnerError, RunnerEvent, RunnerResult, RunnerState};
