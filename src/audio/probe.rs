use std::path::Path;
use std::process::Command;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ExtendLoopError, Result};

/// How the source audio was encoded. Each field is `None` when unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodingProfile {
    pub codec_name: Option<String>,
    /// Bits per second.
    pub bit_rate: Option<u64>,
    /// Hz.
    pub sample_rate: Option<u32>,
}

impl EncodingProfile {
    /// Normalize prober output into a profile.
    ///
    /// Accepts either a container object with a `streams` array, where the
    /// first audio stream is used, or a single flat stream object.
    pub fn from_probe_json(info: &Value) -> Self {
        let Some(stream) = audio_stream(info) else {
            return Self::default();
        };

        Self {
            codec_name: stream
                .get("codec_name")
                .and_then(Value::as_str)
                .map(str::to_string),
            bit_rate: stream.get("bit_rate").and_then(to_u64),
            sample_rate: stream
                .get("sample_rate")
                .and_then(to_u64)
                .and_then(|v| u32::try_from(v).ok()),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.codec_name.is_none() && self.bit_rate.is_none() && self.sample_rate.is_none()
    }
}

fn is_audio(stream: &Map<String, Value>) -> bool {
    stream.get("codec_type").and_then(Value::as_str) == Some("audio")
}

fn audio_stream(info: &Value) -> Option<&Map<String, Value>> {
    let object = info.as_object()?;

    if let Some(streams) = object.get("streams") {
        return streams
            .as_array()?
            .iter()
            .filter_map(Value::as_object)
            .find(|s| is_audio(s));
    }

    is_audio(object).then_some(object)
}

fn to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Inspect a media file with ffprobe.
///
/// Never fails: any problem running or reading the prober is logged and
/// yields a profile with every field unknown.
pub fn probe(ffprobe: &str, path: &Path) -> EncodingProfile {
    match try_probe(ffprobe, path) {
        Ok(profile) => {
            if profile.is_unknown() {
                warn!("No audio stream metadata found in {}", path.display());
            }
            profile
        }
        Err(e) => {
            warn!("Error probing audio settings: {e}");
            EncodingProfile::default()
        }
    }
}

fn try_probe(ffprobe: &str, path: &Path) -> Result<EncodingProfile> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_streams",
            "-show_format",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| ExtendLoopError::Probe(format!("Failed to run {ffprobe}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtendLoopError::Probe(format!(
            "{ffprobe} failed: {}",
            stderr.trim()
        )));
    }

    let info: Value = serde_json::from_slice(&output.stdout)?;
    let profile = EncodingProfile::from_probe_json(&info);
    debug!("Probed {}: {:?}", path.display(), profile);

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_streams_picks_first_audio() {
        let info = json!({
            "streams": [
                { "codec_type": "video", "codec_name": "mjpeg" },
                { "codec_type": "audio", "codec_name": "mp3", "bit_rate": "192000", "sample_rate": "44100" },
                { "codec_type": "audio", "codec_name": "aac", "bit_rate": "128000" }
            ],
            "format": { "bit_rate": "200000" }
        });

        let profile = EncodingProfile::from_probe_json(&info);
        assert_eq!(profile.codec_name.as_deref(), Some("mp3"));
        assert_eq!(profile.bit_rate, Some(192_000));
        assert_eq!(profile.sample_rate, Some(44100));
    }

    #[test]
    fn test_flat_stream_object() {
        let info = json!({
            "codec_type": "audio",
            "codec_name": "flac",
            "sample_rate": 48000
        });

        let profile = EncodingProfile::from_probe_json(&info);
        assert_eq!(profile.codec_name.as_deref(), Some("flac"));
        assert_eq!(profile.bit_rate, None);
        assert_eq!(profile.sample_rate, Some(48000));
    }

    #[test]
    fn test_no_audio_stream_is_unknown() {
        let video_only = json!({ "streams": [{ "codec_type": "video" }] });
        let flat_video = json!({ "codec_type": "video", "codec_name": "h264" });
        let bad_streams = json!({ "streams": "nope" });

        for info in [video_only, flat_video, bad_streams, json!([1, 2]), json!(null)] {
            assert!(EncodingProfile::from_probe_json(&info).is_unknown());
        }
    }

    #[test]
    fn test_unparseable_numbers_are_unknown() {
        let info = json!({
            "codec_type": "audio",
            "codec_name": "opus",
            "bit_rate": "N/A",
            "sample_rate": -1
        });

        let profile = EncodingProfile::from_probe_json(&info);
        assert_eq!(profile.codec_name.as_deref(), Some("opus"));
        assert_eq!(profile.bit_rate, None);
        assert_eq!(profile.sample_rate, None);
    }

    #[test]
    fn test_known_zero_is_not_unknown() {
        let info = json!({ "codec_type": "audio", "bit_rate": "0" });
        let profile = EncodingProfile::from_probe_json(&info);
        assert_eq!(profile.bit_rate, Some(0));
        assert!(!profile.is_unknown());
    }

    #[test]
    fn test_probe_missing_tool_degrades() {
        let profile = probe(
            "definitely-not-a-real-ffprobe-binary",
            Path::new("/nonexistent/file.mp3"),
        );
        assert_eq!(profile, EncodingProfile::default());
    }

    #[test]
    fn test_probe_missing_file_degrades() {
        let profile = probe("ffprobe", Path::new("/nonexistent/file.mp3"));
        assert!(profile.is_unknown());
    }
}
