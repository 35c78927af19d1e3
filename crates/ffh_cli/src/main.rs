//! ffhelper - CLI front-end for ffh_core.
//!
//! Drives ffmpeg for three tasks: trimming a clip to a time range,
//! extracting the audio track, and concatenating clips. Streams the
//! external process output to stdout as it arrives.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ffh_core::config::ConfigManager;
use ffh_core::logging::{LogCallback, OpLogger};
use ffh_core::{CommandBuilder, MediaOperation, TimeCode, TrimMode};

#[derive(Parser)]
#[command(
    name = "ffhelper",
    version,
    about = "Trim, extract audio, and concatenate video clips by driving ffmpeg"
)]
struct Cli {
    /// Config file path (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the ffmpeg executable.
    #[arg(long, global = true)]
    ffmpeg: Option<String>,

    /// Verbose diagnostics on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cut a sub-range out of a clip by stream copy.
    Trim(TrimArgs),

    /// Copy the audio track into an .m4a next to the source.
    ExtractAudio {
        /// Source video file.
        input: PathBuf,
    },

    /// Concatenate two or more clips into one file.
    Concat {
        /// Source clips, in playback order.
        inputs: Vec<PathBuf>,

        /// Remove the intermediate .ts files after a successful merge.
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Args)]
struct TrimArgs {
    /// Source video file.
    input: PathBuf,

    /// Start position, colon-separated (e.g. 1:30).
    #[arg(long)]
    start: String,

    /// Absolute end position. Conflicts with --duration.
    #[arg(long, conflicts_with = "duration")]
    to: Option<String>,

    /// Clip length measured from the start position.
    #[arg(long)]
    duration: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => default_config_path(),
    };
    let mut config = ConfigManager::new(&config_path);
    config
        .load_or_create()
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let mut settings = config.settings().clone();
    if let Some(ffmpeg) = cli.ffmpeg.clone() {
        settings.tools.ffmpeg_path = ffmpeg;
    }

    let (op, op_name) = build_operation(&cli.command, &mut settings)?;

    let builder = CommandBuilder::new().with_ffmpeg_path(settings.tools.ffmpeg_path.clone());
    let callback: LogCallback = Box::new(|msg: &str| println!("{}", msg));
    let logger = match OpLogger::new(
        op_name,
        &settings.paths.logs_folder,
        settings.logging.clone(),
        Some(callback),
    ) {
        Ok(logger) => logger,
        Err(e) => {
            tracing::warn!("could not open log file: {}", e);
            let callback: LogCallback = Box::new(|msg: &str| println!("{}", msg));
            OpLogger::callback_only(settings.logging.clone(), callback)
        }
    };

    let outcome = ffh_core::execute(&builder, &op, &logger, &settings.output)?;
    if outcome.decode_failures > 0 {
        eprintln!(
            "warning: {} output line(s) were dropped as undecodable",
            outcome.decode_failures
        );
    }
    println!("wrote {}", outcome.output.display());
    Ok(())
}

/// Turn the parsed CLI command into a media operation.
fn build_operation(
    command: &Command,
    settings: &mut ffh_core::config::Settings,
) -> Result<(MediaOperation, &'static str)> {
    match command {
        Command::Trim(args) => {
            let start = parse_time(&args.start, "--start")?;
            let (end, mode) = match (&args.to, &args.duration) {
                (Some(to), None) => (parse_time(to, "--to")?, TrimMode::EndTime),
                (None, Some(duration)) => (parse_time(duration, "--duration")?, TrimMode::Duration),
                (None, None) | (Some(_), Some(_)) => {
                    bail!("trim needs exactly one of --to or --duration")
                }
            };
            Ok((
                MediaOperation::Trim {
                    source: args.input.clone(),
                    start,
                    end,
                    mode,
                },
                "trim",
            ))
        }
        Command::ExtractAudio { input } => Ok((
            MediaOperation::ExtractAudio {
                source: input.clone(),
            },
            "extract-audio",
        )),
        Command::Concat { inputs, cleanup } => {
            if *cleanup {
                settings.output.cleanup_intermediates = true;
            }
            Ok((
                MediaOperation::Concat {
                    sources: inputs.clone(),
                },
                "concat",
            ))
        }
    }
}

fn parse_time(raw: &str, flag: &str) -> Result<TimeCode> {
    TimeCode::parse(raw).with_context(|| format!("invalid time for {}: {:?}", flag, raw))
}

fn default_config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "ffhelper")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("ffhelper.toml"))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn trim_requires_an_end_or_duration() {
        let cli = Cli::try_parse_from(["ffhelper", "trim", "in.mp4", "--start", "0:10"]).unwrap();
        let mut settings = ffh_core::config::Settings::default();
        let result = build_operation(&cli.command, &mut settings);
        assert!(result.is_err());
    }

    #[test]
    fn trim_to_and_duration_conflict() {
        let result = Cli::try_parse_from([
            "ffhelper", "trim", "in.mp4", "--start", "0:10", "--to", "0:20", "--duration", "0:05",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn concat_cleanup_flag_overrides_settings() {
        let cli =
            Cli::try_parse_from(["ffhelper", "concat", "a.mp4", "b.mp4", "--cleanup"]).unwrap();
        let mut settings = ffh_core::config::Settings::default();
        build_operation(&cli.command, &mut settings).unwrap();
        assert!(settings.output.cleanup_intermediates);
    }
}
