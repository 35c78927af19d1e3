//! Operation logger with file and callback output.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogSettings};

/// Logger for one operation with dual output (file + callback).
///
/// Every message is appended to the log file (if one was opened) and
/// forwarded to the callback (if one was given). A ring buffer keeps
/// the most recent lines so a failure can be diagnosed without
/// re-reading the file.
pub struct OpLogger {
    log_path: Option<PathBuf>,
    file_writer: Arc<Mutex<Option<BufWriter<File>>>>,
    callback: Arc<Mutex<Option<LogCallback>>>,
    settings: LogSettings,
    tail: Arc<Mutex<VecDeque<String>>>,
}

impl OpLogger {
    /// Create a logger writing to `<log_dir>/<name>.log`.
    ///
    /// The directory is created if missing. Pass `None` as the
    /// callback for file-only logging.
    pub fn new(
        name: &str,
        log_dir: impl AsRef<Path>,
        settings: LogSettings,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", sanitize_filename(name)));
        let file = File::create(&log_path)?;

        Ok(Self {
            log_path: Some(log_path),
            file_writer: Arc::new(Mutex::new(Some(BufWriter::new(file)))),
            callback: Arc::new(Mutex::new(callback)),
            settings,
            tail: Arc::new(Mutex::new(VecDeque::with_capacity(32))),
        })
    }

    /// Create a logger with no file, callback output only.
    pub fn callback_only(settings: LogSettings, callback: LogCallback) -> Self {
        Self {
            log_path: None,
            file_writer: Arc::new(Mutex::new(None)),
            callback: Arc::new(Mutex::new(Some(callback))),
            settings,
            tail: Arc::new(Mutex::new(VecDeque::with_capacity(32))),
        }
    }

    /// Path of the log file, if one was opened.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Log an informational message.
    pub fn info(&self, message: &str) {
        self.output(&self.format_message(message));
    }

    /// Log a warning.
    pub fn warn(&self, message: &str) {
        self.output(&self.format_message(&format!("[WARNING] {}", message)));
    }

    /// Log an error.
    pub fn error(&self, message: &str) {
        self.output(&self.format_message(&format!("[ERROR] {}", message)));
    }

    /// Log a command about to be executed, `$`-prefixed.
    ///
    /// With `show_command_json` set, the argv is also dumped as JSON so
    /// quoting ambiguities in the pretty form can't mislead.
    pub fn command(&self, display: &str, argv: &[String]) {
        self.output(&self.format_message(&format!("$ {}", display)));
        if self.settings.show_command_json {
            if let Ok(json) = serde_json::to_string(argv) {
                self.output(&self.format_message(&json));
            }
        }
    }

    /// Log one line of external process output.
    pub fn output_line(&self, line: &str) {
        {
            let mut tail = self.tail.lock();
            if tail.len() >= self.settings.error_tail {
                tail.pop_front();
            }
            tail.push_back(line.to_string());
        }
        self.output(&self.format_message(line));
    }

    /// The most recent process output lines, oldest first.
    pub fn tail(&self) -> Vec<String> {
        self.tail.lock().iter().cloned().collect()
    }

    /// Flush the log file.
    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    fn format_message(&self, message: &str) -> String {
        if self.settings.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        }
    }

    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }
        if let Some(ref callback) = *self.callback.lock() {
            callback(formatted);
        }
    }
}

impl Drop for OpLogger {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Replace path separators and other awkward characters in a log name.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn collecting_logger() -> (OpLogger, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel();
        let callback: LogCallback = Box::new(move |msg: &str| {
            let _ = tx.send(msg.to_string());
        });
        let settings = LogSettings {
            show_timestamps: false,
            ..LogSettings::default()
        };
        (OpLogger::callback_only(settings, callback), rx)
    }

    #[test]
    fn forwards_messages_to_callback_in_order() {
        let (logger, rx) = collecting_logger();
        logger.info("first");
        logger.output_line("second");
        logger.error("third");
        drop(logger);

        let messages: Vec<String> = rx.into_iter().collect();
        assert_eq!(messages, vec!["first", "second", "[ERROR] third"]);
    }

    #[test]
    fn tail_keeps_recent_output_lines() {
        let (tx, _rx) = mpsc::channel();
        let callback: LogCallback = Box::new(move |msg: &str| {
            let _ = tx.send(msg.to_string());
        });
        let settings = LogSettings {
            show_timestamps: false,
            error_tail: 2,
            ..LogSettings::default()
        };
        let logger = OpLogger::callback_only(settings, callback);
        logger.output_line("a");
        logger.output_line("b");
        logger.output_line("c");
        assert_eq!(logger.tail(), vec!["b", "c"]);
    }

    #[test]
    fn writes_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let logger = OpLogger::new("trim a/b", dir.path(), LogSettings::default(), None).unwrap();
        let path = logger.log_path().unwrap().to_path_buf();
        assert!(path.file_name().unwrap().to_string_lossy().contains("trim a_b"));

        logger.info("written");
        logger.flush();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("written"));
    }
}
