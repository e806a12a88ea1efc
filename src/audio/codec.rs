//! Decode and encode through ffmpeg, with a float WAV in a temp dir as the
//! hand-off format on both sides.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{ExtendLoopError, Result};

use super::Timeline;

/// Encoder settings for writing the extended audio.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportParams {
    /// ffmpeg muxer name. `None` lets ffmpeg pick from the file name.
    pub format: Option<String>,
    /// Audio bit-rate argument, e.g. `"192k"`. `None` keeps the encoder default.
    pub bitrate: Option<String>,
}

impl ExportParams {
    pub fn for_output(output: &Path, bit_rate: Option<u64>) -> Self {
        Self {
            format: format_for_extension(output),
            bitrate: bitrate_arg(bit_rate),
        }
    }
}

/// ffmpeg muxer name for an output path, from its extension.
///
/// A few extensions map to differently named muxers; anything else is used
/// verbatim.
pub fn format_for_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    if ext.is_empty() {
        return None;
    }

    let format = match ext.as_str() {
        "m4a" => "ipod".to_string(),
        "aac" => "adts".to_string(),
        _ => ext,
    };
    Some(format)
}

/// Bit-rate in bits/sec as an encoder argument in whole kilobits.
pub fn bitrate_arg(bit_rate: Option<u64>) -> Option<String> {
    let kbps = bit_rate? / 1000;
    (kbps > 0).then(|| format!("{kbps}k"))
}

/// Decode an audio file into memory at its native rate and channel layout.
pub fn decode(ffmpeg: &str, input: &Path) -> Result<Timeline> {
    if !input.exists() {
        return Err(ExtendLoopError::FileNotFound(input.display().to_string()));
    }

    let temp_dir = TempDir::new()?;
    let wav_path = temp_dir.path().join("decoded.wav");

    info!("Decoding {}", input.display());

    let output = Command::new(ffmpeg)
        .args(["-v", "error", "-y", "-i"])
        .arg(input)
        .args(["-vn", "-acodec", "pcm_f32le", "-f", "wav"])
        .arg(&wav_path)
        .output()
        .map_err(|e| ExtendLoopError::Decode(format!("Failed to run {ffmpeg}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtendLoopError::Decode(format!(
            "{ffmpeg} could not decode {}: {}",
            input.display(),
            stderr.trim()
        )));
    }

    let timeline = Timeline::read_wav(&wav_path)
        .map_err(|e| ExtendLoopError::Decode(format!("Failed to read decoded audio: {e}")))?;

    debug!(
        "Decoded {:.3}s, {} Hz, {} channels",
        timeline.duration(),
        timeline.sample_rate(),
        timeline.channels()
    );

    Ok(timeline)
}

/// Encode a timeline to `output`.
///
/// The output file is written directly; a failed encode may leave a partial
/// file behind.
pub fn export(ffmpeg: &str, timeline: &Timeline, output: &Path, params: &ExportParams) -> Result<()> {
    let temp_dir = TempDir::new()?;
    let wav_path = temp_dir.path().join("extended.wav");
    timeline.write_wav(&wav_path)?;

    let mut command = Command::new(ffmpeg);
    command.args(["-v", "error", "-y", "-i"]).arg(&wav_path);
    if let Some(ref format) = params.format {
        command.args(["-f", format.as_str()]);
    }
    if let Some(ref bitrate) = params.bitrate {
        command.args(["-b:a", bitrate.as_str()]);
    }
    command.arg(output);

    debug!("Export command: {:?}", command);

    let result = command
        .output()
        .map_err(|e| ExtendLoopError::Export(format!("Failed to run {ffmpeg}: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(ExtendLoopError::Export(format!(
            "{ffmpeg} could not write {}: {}",
            output.display(),
            stderr.trim()
        )));
    }

    if !output.exists() {
        return Err(ExtendLoopError::Export(
            "Output file was not created".to_string(),
        ));
    }

    info!("Exported {:.3}s to {}", timeline.duration(), output.display());
    Ok(())
}
