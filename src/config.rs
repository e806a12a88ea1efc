use crate::error::{ExtendLoopError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ffmpeg executable used for decoding and encoding.
    pub ffmpeg_path: String,
    /// ffprobe executable used for reading codec metadata.
    pub ffprobe_path: String,
    /// Prepended to the input file name when no output path is given.
    pub output_prefix: String,
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            output_prefix: "extended_".to_string(),
            show_progress: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                config = toml::from_str::<Config>(&contents).map_err(|e| {
                    ExtendLoopError::Config(format!("{}: {e}", config_path.display()))
                })?;
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from `EXTEND_LOOP_*` variables.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("EXTEND_LOOP_FFMPEG") {
            self.ffmpeg_path = path;
        }
        if let Some(path) = var("EXTEND_LOOP_FFPROBE") {
            self.ffprobe_path = path;
        }
        if let Some(prefix) = var("EXTEND_LOOP_OUTPUT_PREFIX") {
            self.output_prefix = prefix;
        }
        if let Some(progress) = var("EXTEND_LOOP_PROGRESS") {
            self.show_progress = !matches!(
                progress.trim().to_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ffmpeg_path.trim().is_empty() {
            return Err(ExtendLoopError::Config(
                "ffmpeg path must not be empty".to_string(),
            ));
        }
        if self.ffprobe_path.trim().is_empty() {
            return Err(ExtendLoopError::Config(
                "ffprobe path must not be empty".to_string(),
            ));
        }
        // An empty prefix makes the default output path the input path.
        if self.output_prefix.is_empty() {
            return Err(ExtendLoopError::Config(
                "output prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("extend-loop").join("config.toml"))
    }
}
