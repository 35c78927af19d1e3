//! Settings struct with TOML-based sections.

use serde::{Deserialize, Serialize};

use crate::logging::LogSettings;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// External tool locations.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Output handling.
    #[serde(default)]
    pub output: OutputSettings,

    /// Folder locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// Operation logging configuration.
    #[serde(default)]
    pub logging: LogSettings,
}

/// External tool locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// ffmpeg executable name or path.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
        }
    }
}

/// Output handling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Delete the intermediate `.ts` files after a successful merge.
    /// Off by default; intermediates are never removed silently.
    #[serde(default)]
    pub cleanup_intermediates: bool,
}

/// Folder locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Folder for operation log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            logs_folder: default_logs_folder(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_loads_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.tools.ffmpeg_path, "ffmpeg");
        assert!(!settings.output.cleanup_intermediates);
        assert_eq!(settings.paths.logs_folder, ".logs");
        assert!(settings.logging.show_timestamps);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [tools]
            ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
            "#,
        )
        .unwrap();
        assert_eq!(settings.tools.ffmpeg_path, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(settings.paths.logs_folder, ".logs");
    }
}
