//! Builds ffmpeg argument vectors from media operations.

use std::path::{Path, PathBuf};

use crate::timecode::TimeCode;

use super::types::{
    CommandError, CommandPlan, CommandResult, FfmpegCommand, MediaOperation, TrimMode,
};

/// Suffix inserted before the extension of a trimmed clip.
const TRIM_SUFFIX: &str = "_cut";
/// Container extension for extracted audio tracks.
const AUDIO_EXTENSION: &str = "m4a";
/// Container extension for concat intermediates.
const INTERMEDIATE_EXTENSION: &str = "ts";
/// Suffix appended to the first intermediate's name for the merge output.
const MERGE_SUFFIX: &str = "_merge.mp4";

/// Builder for ffmpeg invocations.
///
/// Converts a [`MediaOperation`] into a [`CommandPlan`] with exact
/// argument vectors. Output paths are derived from the source paths;
/// nothing is written or checked on disk here.
pub struct CommandBuilder {
    /// Program name or path used for every invocation.
    ffmpeg_path: String,
}

impl CommandBuilder {
    /// Create a builder that invokes `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }

    /// Use a custom ffmpeg executable.
    pub fn with_ffmpeg_path(mut self, path: impl Into<String>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    /// Build the plan for an operation.
    ///
    /// Preconditions are checked here: an end-time trim requires the end
    /// to compare after the start (positional rule), and concatenation
    /// requires at least two inputs. On a precondition failure no
    /// command is issued.
    pub fn build(&self, op: &MediaOperation) -> CommandResult<CommandPlan> {
        match op {
            MediaOperation::Trim {
                source,
                start,
                end,
                mode,
            } => self.build_trim(source, start, end, *mode),
            MediaOperation::ExtractAudio { source } => self.build_extract_audio(source),
            MediaOperation::Concat { sources } => self.build_concat(sources),
        }
    }

    fn build_trim(
        &self,
        source: &Path,
        start: &TimeCode,
        end: &TimeCode,
        mode: TrimMode,
    ) -> CommandResult<CommandPlan> {
        let output = derive_sibling(source, |stem, ext| match ext {
            Some(ext) => format!("{}{}.{}", stem, TRIM_SUFFIX, ext),
            None => format!("{}{}", stem, TRIM_SUFFIX),
        })?;

        let source_str = source.to_string_lossy().to_string();
        let output_str = output.to_string_lossy().to_string();

        let args = match mode {
            TrimMode::EndTime => {
                if start.positional_cmp(end) != std::cmp::Ordering::Less {
                    return Err(CommandError::EndNotAfterStart {
                        start: start.to_string(),
                        end: end.to_string(),
                    });
                }
                vec![
                    "-i".to_string(),
                    source_str,
                    "-vcodec".to_string(),
                    "copy".to_string(),
                    "-acodec".to_string(),
                    "copy".to_string(),
                    "-ss".to_string(),
                    start.to_string(),
                    "-to".to_string(),
                    end.to_string(),
                    output_str,
                    "-y".to_string(),
                ]
            }
            // Fast seek: -ss before -i, the second value is a length.
            TrimMode::Duration => vec![
                "-ss".to_string(),
                start.to_string(),
                "-i".to_string(),
                source_str,
                "-vcodec".to_string(),
                "copy".to_string(),
                "-acodec".to_string(),
                "copy".to_string(),
                "-t".to_string(),
                end.to_string(),
                output_str,
                "-y".to_string(),
            ],
        };

        Ok(CommandPlan::Single {
            command: self.command(args, None),
            output,
        })
    }

    fn build_extract_audio(&self, source: &Path) -> CommandResult<CommandPlan> {
        let output = derive_sibling(source, |stem, _ext| {
            format!("{}.{}", stem, AUDIO_EXTENSION)
        })?;

        let args = vec![
            "-i".to_string(),
            source.to_string_lossy().to_string(),
            "-vn".to_string(),
            "-y".to_string(),
            "-acodec".to_string(),
            "copy".to_string(),
            output.to_string_lossy().to_string(),
        ];

        Ok(CommandPlan::Single {
            command: self.command(args, None),
            output,
        })
    }

    /// Concat is two-phase: remux every input to MPEG-TS while fixing
    /// the AAC bitstream framing, then join the intermediates with the
    /// `concat:` protocol. The merge runs with the first input's
    /// directory as its working directory and refers to the
    /// intermediates by bare file name.
    fn build_concat(&self, sources: &[PathBuf]) -> CommandResult<CommandPlan> {
        if sources.len() < 2 {
            return Err(CommandError::TooFewInputs(sources.len()));
        }

        let mut remux = Vec::with_capacity(sources.len());
        let mut intermediates = Vec::with_capacity(sources.len());
        let mut intermediate_names = Vec::with_capacity(sources.len());

        for source in sources {
            let intermediate = derive_sibling(source, |stem, _ext| {
                format!("{}.{}", stem, INTERMEDIATE_EXTENSION)
            })?;
            let name = intermediate
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| CommandError::BadSourcePath(source.clone()))?;

            remux.push(self.command(
                vec![
                    "-i".to_string(),
                    source.to_string_lossy().to_string(),
                    "-acodec".to_string(),
                    "copy".to_string(),
                    "-vcodec".to_string(),
                    "copy".to_string(),
                    "-absf".to_string(),
                    "aac_adtstoasc".to_string(),
                    "-y".to_string(),
                    intermediate.to_string_lossy().to_string(),
                ],
                None,
            ));
            intermediates.push(intermediate);
            intermediate_names.push(name);
        }

        let working_dir = sources[0]
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let output_name = format!("{}{}", intermediate_names[0], MERGE_SUFFIX);
        let output = working_dir.join(&output_name);

        let merge = self.command(
            vec![
                "-i".to_string(),
                format!("concat:{}", intermediate_names.join("|")),
                "-acodec".to_string(),
                "copy".to_string(),
                "-vcodec".to_string(),
                "copy".to_string(),
                "-absf".to_string(),
                "aac_adtstoasc".to_string(),
                "-y".to_string(),
                output_name,
            ],
            Some(working_dir),
        );

        Ok(CommandPlan::TwoPhase {
            remux,
            merge,
            intermediates,
            output,
        })
    }

    fn command(&self, args: Vec<String>, working_dir: Option<PathBuf>) -> FfmpegCommand {
        FfmpegCommand {
            program: self.ffmpeg_path.clone(),
            args,
            working_dir,
        }
    }
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive an output path next to `source`, naming it from the source's
/// stem and extension.
fn derive_sibling(
    source: &Path,
    name: impl FnOnce(&str, Option<&str>) -> String,
) -> CommandResult<PathBuf> {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| CommandError::BadSourcePath(source.to_path_buf()))?;
    let ext = source.extension().map(|e| e.to_string_lossy().to_string());

    let file_name = name(&stem, ext.as_deref());
    Ok(match source.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    })
}
