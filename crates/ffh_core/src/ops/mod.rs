//! Operation orchestration.
//!
//! [`execute`] takes a [`MediaOperation`] from build to completion:
//! single-command operations stream their output through a
//! [`ProcessRunner`] channel, and concatenation runs its two phases as
//! blocking captured invocations — the remux phase is fully consumed,
//! output included, before the merge starts.
//!
//! `execute` blocks the calling thread; a GUI runs it on a worker
//! thread and receives lines through the logger callback.

use std::path::PathBuf;
use std::sync::mpsc;

use thiserror::Error;

use crate::command::{CommandBuilder, CommandError, CommandPlan, FfmpegCommand, MediaOperation};
use crate::config::OutputSettings;
use crate::logging::OpLogger;
use crate::runner::{run_captured, ProcessRunner, RunnerError, RunnerEvent};

/// Errors that can occur while executing an operation.
#[derive(Error, Debug)]
pub enum OpError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("external process failed: {0}")]
    Run(String),
}

/// Result type for operation execution.
pub type OpResult<T> = Result<T, OpError>;

/// What an operation produced.
#[derive(Debug)]
pub struct OpOutcome {
    /// File the operation wrote.
    pub output: PathBuf,
    /// Output lines dropped because they decoded in neither encoding.
    pub decode_failures: u64,
}

/// Run an operation to completion, streaming output to `logger`.
pub fn execute(
    builder: &CommandBuilder,
    op: &MediaOperation,
    logger: &OpLogger,
    output_settings: &OutputSettings,
) -> OpResult<OpOutcome> {
    match builder.build(op)? {
        CommandPlan::Single { command, output } => {
            let decode_failures = run_streamed(&command, logger)?;
            Ok(OpOutcome {
                output,
                decode_failures,
            })
        }
        CommandPlan::TwoPhase {
            remux,
            merge,
            intermediates,
            output,
        } => {
            let mut decode_failures = 0;

            logger.info("--- remux phase ---");
            for command in &remux {
                decode_failures += run_phase(command, logger)?;
            }

            logger.info("--- merge phase ---");
            match run_phase(&merge, logger) {
                Ok(dropped) => decode_failures += dropped,
                Err(e) => {
                    // A failed merge may leave a partial output behind;
                    // remove it rather than presenting it as a result.
                    remove_partial_output(&output, logger);
                    return Err(e);
                }
            }

            if output_settings.cleanup_intermediates {
                cleanup_intermediates(&intermediates, logger);
            }

            Ok(OpOutcome {
                output,
                decode_failures,
            })
        }
    }
}

/// Stream one command through a [`ProcessRunner`] channel, forwarding
/// every line to the logger. Returns the decode-failure count.
fn run_streamed(command: &FfmpegCommand, logger: &OpLogger) -> OpResult<u64> {
    logger.command(&command.to_string(), &command.args);

    let runner = ProcessRunner::new();
    let (tx, rx) = mpsc::channel();
    let handle = runner.start(command.clone(), tx)?;

    let (failure, done) = drain_events(&rx, logger);

    if handle.join().is_err() {
        logger.error("output worker panicked");
        return Err(OpError::Run("output worker panicked".to_string()));
    }
    // A worker that dies without its terminal event is a failure, not
    // a silently successful run.
    let decode_failures = match done {
        Some(dropped) => dropped,
        None => {
            logger.error("output worker ended without a terminal event");
            return Err(OpError::Run(
                "output worker ended without a terminal event".to_string(),
            ));
        }
    };

    if decode_failures > 0 {
        logger.warn(&format!(
            "{} output line(s) could not be decoded and were dropped",
            decode_failures
        ));
    }

    match failure {
        Some(message) => Err(OpError::Run(message)),
        None => Ok(decode_failures),
    }
}

/// Forward events to the logger until the terminal event arrives or
/// the channel closes. Returns the failure message (if any) and the
/// terminal event's decode-failure count (`None` if the channel closed
/// without one).
fn drain_events(
    rx: &mpsc::Receiver<RunnerEvent>,
    logger: &OpLogger,
) -> (Option<String>, Option<u64>) {
    let mut failure = None;
    let mut done = None;
    for event in rx.iter() {
        match event {
            RunnerEvent::Line(line) => logger.output_line(&line),
            RunnerEvent::Error(message) => {
                logger.error(&message);
                failure = Some(message);
            }
            RunnerEvent::Done { decode_failures } => {
                done = Some(decode_failures);
                break;
            }
        }
    }
    (failure, done)
}

/// Run one concat phase invocation to completion, blocking until all
/// of its output has been read.
fn run_phase(command: &FfmpegCommand, logger: &OpLogger) -> OpResult<u64> {
    logger.command(&command.to_string(), &command.args);

    let captured = run_captured(command)?;
    for line in &captured.lines {
        logger.output_line(line);
    }
    if captured.decode_failures > 0 {
        logger.warn(&format!(
            "{} output line(s) could not be decoded and were dropped",
            captured.decode_failures
        ));
    }
    Ok(captured.decode_failures)
}

/// Remove a partial merge output after a failed merge. A missing file
/// is fine (the merge may have died before creating it).
fn remove_partial_output(output: &std::path::Path, logger: &OpLogger) {
    match std::fs::remove_file(output) {
        Ok(()) => logger.info(&format!("removed partial output {}", output.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => logger.warn(&format!(
            "could not remove partial output {}: {}",
            output.display(),
            e
        )),
    }
}

/// Remove intermediate files, warning on (not failing over) misses.
fn cleanup_intermediates(intermediates: &[PathBuf], logger: &OpLogger) {
    for path in intermediates {
        match std::fs::remove_file(path) {
            Ok(()) => logger.info(&format!("removed intermediate {}", path.display())),
            Err(e) => logger.warn(&format!(
                "could not remove intermediate {}: {}",
                path.display(),
                e
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogCallback, LogSettings};
    use std::sync::{Arc, Mutex};

    /// Builder that "runs" ffmpeg via echo, so commands succeed and
    /// their argv comes back as output.
    fn echo_builder() -> CommandBuilder {
        CommandBuilder::new().with_ffmpeg_path("echo")
    }

    fn collecting_logger() -> (OpLogger, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let callback: LogCallback = Box::new(move |msg: &str| {
            sink.lock().unwrap().push(msg.to_string());
        });
        let settings = LogSettings {
            show_timestamps: false,
            ..LogSettings::default()
        };
        (OpLogger::callback_only(settings, callback), lines)
    }

    #[test]
    fn trim_streams_output_and_reports_outcome() {
        let (logger, lines) = collecting_logger();
        let op = MediaOperation::Trim {
            source: PathBuf::from("/videos/talk.mp4"),
            start: crate::timecode::TimeCode::parse("0:10").unwrap(),
            end: crate::timecode::TimeCode::parse("0:20").unwrap(),
            mode: crate::command::TrimMode::EndTime,
        };

        let outcome = execute(&echo_builder(), &op, &logger, &OutputSettings::default()).unwrap();
        assert_eq!(outcome.output, PathBuf::from("/videos/talk_cut.mp4"));
        assert_eq!(outcome.decode_failures, 0);

        let lines = lines.lock().unwrap();
        assert!(lines[0].starts_with("$ echo"));
        assert!(lines.iter().any(|l| l.contains("-vcodec")));
    }

    #[test]
    fn missing_binary_surfaces_run_error() {
        let (logger, lines) = collecting_logger();
        let builder = CommandBuilder::new().with_ffmpeg_path("ffh-test-no-such-binary");
        let op = MediaOperation::ExtractAudio {
            source: PathBuf::from("/videos/talk.mp4"),
        };

        let result = execute(&builder, &op, &logger, &OutputSettings::default());
        assert!(matches!(result, Err(OpError::Run(_))));
        assert!(lines
            .lock()
            .unwrap()
            .iter()
            .any(|l| l.starts_with("[ERROR]")));
    }

    #[test]
    fn precondition_failure_issues_no_command() {
        let (logger, lines) = collecting_logger();
        let op = MediaOperation::Concat {
            sources: vec![PathBuf::from("/videos/a.mp4")],
        };

        let result = execute(&echo_builder(), &op, &logger, &OutputSettings::default());
        assert!(matches!(
            result,
            Err(OpError::Command(CommandError::TooFewInputs(1)))
        ));
        assert!(lines.lock().unwrap().is_empty());
    }

    #[test]
    fn concat_runs_remux_then_merge() {
        // The merge phase runs with the first input's directory as its
        // working directory, so the sources live in a real tempdir.
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.mp4");
        let b = dir.path().join("b.mp4");

        let (logger, lines) = collecting_logger();
        let op = MediaOperation::Concat {
            sources: vec![a, b.clone()],
        };

        let outcome = execute(&echo_builder(), &op, &logger, &OutputSettings::default()).unwrap();
        assert_eq!(outcome.output, dir.path().join("a.ts_merge.mp4"));

        let lines = lines.lock().unwrap();
        let remux_marker = lines.iter().position(|l| l.contains("remux phase")).unwrap();
        let merge_marker = lines.iter().position(|l| l.contains("merge phase")).unwrap();
        assert!(remux_marker < merge_marker);
        // Both remux invocations happen before the merge starts.
        let b_ts = dir.path().join("b.ts").display().to_string();
        let last_remux = lines.iter().rposition(|l| l.contains(&b_ts)).unwrap();
        assert!(last_remux < merge_marker);
        assert!(lines
            .iter()
            .skip(merge_marker)
            .any(|l| l.contains("concat:a.ts|b.ts")));
    }

    #[test]
    fn channel_closing_without_terminal_event_is_not_success() {
        // A worker that dies mid-stream drops its sender without ever
        // emitting the terminal event; that must read as a failure,
        // not a clean run with zero decode failures.
        let (logger, _lines) = collecting_logger();
        let (tx, rx) = mpsc::channel();
        tx.send(RunnerEvent::Line("frame=1".to_string())).unwrap();
        drop(tx);

        let (failure, done) = drain_events(&rx, &logger);
        assert!(failure.is_none());
        assert!(done.is_none());
    }

    #[test]
    fn failed_merge_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let partial = dir.path().join("a.ts_merge.mp4");
        std::fs::write(&partial, b"half a file").unwrap();

        let (logger, lines) = collecting_logger();
        remove_partial_output(&partial, &logger);

        assert!(!partial.exists());
        assert!(lines
            .lock()
            .unwrap()
            .iter()
            .any(|l| l.contains("removed partial output")));

        // Removing a never-created output is not an error.
        remove_partial_output(&dir.path().join("missing.mp4"), &logger);
    }

    #[test]
    fn merge_failure_surfaces_error_without_leaving_output() {
        // The merge phase runs from the first input's directory; a
        // directory that no longer exists makes the merge spawn fail
        // while the remux phase (no working directory) still succeeds.
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");
        let a = gone.join("a.mp4");
        let b = gone.join("b.mp4");

        let (logger, _lines) = collecting_logger();
        let op = MediaOperation::Concat {
            sources: vec![a, b],
        };

        let result = execute(&echo_builder(), &op, &logger, &OutputSettings::default());
        assert!(matches!(result, Err(OpError::Runner(_))));
        assert!(!gone.join("a.ts_merge.mp4").exists());
    }

    #[test]
    fn cleanup_removes_intermediates_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.mp4");
        let b = dir.path().join("b.mp4");
        std::fs::write(&a, b"x").unwrap();
        std::fs::write(&b, b"x").unwrap();
        // echo won't create the .ts files, so stand them up by hand.
        let a_ts = dir.path().join("a.ts");
        let b_ts = dir.path().join("b.ts");
        std::fs::write(&a_ts, b"ts").unwrap();
        std::fs::write(&b_ts, b"ts").unwrap();

        let (logger, _lines) = collecting_logger();
        let op = MediaOperation::Concat {
            sources: vec![a, b],
        };
        let settings = OutputSettings {
            cleanup_intermediates: true,
        };

        execute(&echo_builder(), &op, &logger, &settings).unwrap();
        assert!(!a_ts.exists());
        assert!(!b_ts.exists());
    }
}
