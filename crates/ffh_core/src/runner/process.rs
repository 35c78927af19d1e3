//! Process spawning and output streaming.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use parking_lot::Mutex;

use crate::command::FfmpegCommand;

use super::types::{RunnerError, RunnerEvent, RunnerResult, RunnerState};

/// Runs one command at a time on a background worker.
///
/// `start` transitions Idle→Running and rejects a second call while a
/// worker is still streaming; after a terminal state the runner may be
/// started again. Exit status is not consulted: only spawn and read
/// failures move the runner to `Failed`.
pub struct ProcessRunner {
    state: Arc<Mutex<RunnerState>>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RunnerState::Idle)),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunnerState {
        *self.state.lock()
    }

    /// Launch `command` on a worker thread.
    ///
    /// Output lines are delivered as [`RunnerEvent::Line`] through
    /// `events`, followed by exactly one [`RunnerEvent::Done`]. Returns
    /// [`RunnerError::AlreadyRunning`] if a previous invocation has not
    /// reached a terminal state yet.
    pub fn start(
        &self,
        command: FfmpegCommand,
        events: mpsc::Sender<RunnerEvent>,
    ) -> RunnerResult<thread::JoinHandle<()>> {
        {
            let mut state = self.state.lock();
            if *state == RunnerState::Running {
                return Err(RunnerError::AlreadyRunning);
            }
            *state = RunnerState::Running;
        }

        let state = Arc::clone(&self.state);
        let handle = thread::spawn(move || {
            let decode_failures = Arc::new(AtomicU64::new(0));
            let outcome = stream_output(&command, &events, &decode_failures);

            match outcome {
                Ok(()) => {
                    *state.lock() = RunnerState::Completed;
                }
                Err(e) => {
                    // The error event precedes the terminal event.
                    let _ = events.send(RunnerEvent::Error(e.to_string()));
                    *state.lock() = RunnerState::Failed;
                }
            }
            let _ = events.send(RunnerEvent::Done {
                decode_failures: decode_failures.load(Ordering::SeqCst),
            });
        });

        Ok(handle)
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the command and forward its output line by line.
fn stream_output(
    command: &FfmpegCommand,
    events: &mpsc::Sender<RunnerEvent>,
    decode_failures: &Arc<AtomicU64>,
) -> RunnerResult<()> {
    tracing::debug!("spawning: {}", command);

    let mut child = spawn(command)?;

    let stdout = child.stdout.take().ok_or(RunnerError::Pipe("stdout"))?;
    let stderr = child.stderr.take().ok_or(RunnerError::Pipe("stderr"))?;

    // Both streams are drained concurrently so neither pipe can fill up
    // and stall the child. Order is preserved within each stream.
    let out_reader = spawn_line_reader(stdout, events.clone(), Arc::clone(decode_failures));
    let err_reader = spawn_line_reader(stderr, events.clone(), Arc::clone(decode_failures));

    let out_result = out_reader
        .join()
        .map_err(|_| RunnerError::Pipe("stdout reader"))?;
    let err_result = err_reader
        .join()
        .map_err(|_| RunnerError::Pipe("stderr reader"))?;

    // Reap the child before reporting reader errors.
    let status = child.wait().map_err(RunnerError::Read)?;
    tracing::debug!("process exited with {}", status);

    out_result?;
    err_result?;
    Ok(())
}

/// Read raw lines from `source`, decode them, and forward each as an
/// event. Undecodable lines are dropped and counted.
fn spawn_line_reader<R: Read + Send + 'static>(
    source: R,
    events: mpsc::Sender<RunnerEvent>,
    decode_failures: Arc<AtomicU64>,
) -> thread::JoinHandle<RunnerResult<()>> {
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf).map_err(RunnerError::Read)?;
            if n == 0 {
                return Ok(());
            }
            while matches!(buf.last(), Some(&b'\n') | Some(&b'\r')) {
                buf.pop();
            }
            match decode_line(&buf) {
                Some(line) => {
                    let _ = events.send(RunnerEvent::Line(line));
                }
                None => {
                    decode_failures.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
    })
}

/// Decode a raw output line as UTF-8, falling back to GBK.
///
/// Returns `None` when neither encoding yields a clean decode.
fn decode_line(bytes: &[u8]) -> Option<String> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some(text.to_string());
    }
    let (decoded, _, had_errors) = encoding_rs::GBK.decode(bytes);
    if had_errors {
        None
    } else {
        Some(decoded.into_owned())
    }
}

fn spawn(command: &FfmpegCommand) -> RunnerResult<Child> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &command.working_dir {
        cmd.current_dir(dir);
    }
    cmd.spawn().map_err(|e| RunnerError::Spawn {
        program: command.program.clone(),
        source: e,
    })
}

/// Full output of a blocking one-shot invocation.
#[derive(Debug)]
pub struct CapturedOutput {
    /// Decoded stdout lines followed by decoded stderr lines.
    pub lines: Vec<String>,
    /// Lines dropped because neither encoding decoded them.
    pub decode_failures: u64,
    /// Exit status, exposed for callers but not mapped to an error.
    pub status: ExitStatus,
}

/// Run `command` to completion and capture its combined output.
///
/// Blocks until the process exits and all output has been read. This is
/// the primitive for phased work where one invocation must be fully
/// consumed before the next begins.
pub fn run_captured(command: &FfmpegCommand) -> RunnerResult<CapturedOutput> {
    tracing::debug!("running captured: {}", command);

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args).stdin(Stdio::null());
    if let Some(dir) = &command.working_dir {
        cmd.current_dir(dir);
    }

    let output = cmd.output().map_err(|e| RunnerError::Spawn {
        program: command.program.clone(),
        source: e,
    })?;

    let mut lines = Vec::new();
    let mut decode_failures = 0;
    for raw in output.stdout.split(|b| *b == b'\n').chain(output.stderr.split(|b| *b == b'\n')) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.is_empty() {
            continue;
        }
        match decode_line(raw) {
            Some(line) => lines.push(line),
            None => decode_failures += 1,
        }
    }

    Ok(CapturedOutput {
        lines,
        decode_failures,
        status: output.status,
    })
}
