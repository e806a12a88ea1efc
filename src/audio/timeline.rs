use std::ops::Range;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::error::{ExtendLoopError, Result};

/// Decoded audio held entirely in memory.
///
/// Samples are interleaved by channel. One frame holds one sample per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl Timeline {
    /// Build a timeline from interleaved samples.
    ///
    /// Trailing samples that do not fill a whole frame are dropped.
    pub fn from_samples(mut samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self> {
        if channels == 0 || sample_rate == 0 {
            return Err(ExtendLoopError::SpecMismatch(format!(
                "invalid layout: {channels} channels at {sample_rate} Hz"
            )));
        }
        let whole = samples.len() - samples.len() % channels as usize;
        samples.truncate(whole);
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds, derived from the frame count.
    pub fn duration(&self) -> f64 {
        self.frames_to_secs(self.frames())
    }

    pub fn frames_to_secs(&self, frames: usize) -> f64 {
        frames as f64 / self.sample_rate as f64
    }

    /// Frame index for a position given in seconds.
    ///
    /// The position is first truncated to whole milliseconds, then to a whole
    /// frame. The result is clamped to the end of the timeline.
    pub fn frame_at(&self, seconds: f64) -> usize {
        let millis = (seconds.max(0.0) * 1000.0) as u64;
        let frame = millis as u128 * self.sample_rate as u128 / 1000;
        (frame.min(self.frames() as u128)) as usize
    }

    /// Copy out a range of frames. Out of range bounds are clamped.
    pub fn slice(&self, frames: Range<usize>) -> Self {
        let total = self.frames();
        let start = frames.start.min(total);
        let end = frames.end.clamp(start, total);
        let ch = self.channels as usize;
        Self {
            samples: self.samples[start * ch..end * ch].to_vec(),
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Append another timeline with the same channel layout and sample rate.
    pub fn append(&mut self, other: &Timeline) -> Result<()> {
        if other.channels != self.channels || other.sample_rate != self.sample_rate {
            return Err(ExtendLoopError::SpecMismatch(format!(
                "cannot join {} ch @ {} Hz onto {} ch @ {} Hz",
                other.channels, other.sample_rate, self.channels, self.sample_rate
            )));
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Make room for `additional` more frames without aborting on failure.
    pub fn try_reserve_frames(&mut self, additional: usize) -> Result<()> {
        let seconds = (self.frames() as f64 + additional as f64) / self.sample_rate as f64;
        let too_long = || ExtendLoopError::TargetTooLong { seconds };

        let samples = additional
            .checked_mul(self.channels as usize)
            .ok_or_else(too_long)?;
        self.samples
            .try_reserve_exact(samples)
            .map_err(|_| too_long())
    }

    /// Read a WAV file. Integer PCM is normalized to [-1.0, 1.0].
    pub fn read_wav(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();

        debug!(
            "Reading WAV {}: {} Hz, {} channels, {} bits {:?}",
            path.display(),
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
            spec.sample_format
        );

        let samples: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
            SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()?
            }
        };

        Self::from_samples(samples, spec.channels, spec.sample_rate)
    }

    /// Write the timeline as a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let mut writer = WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;

        debug!(
            "Wrote {} frames ({:.3}s) to {}",
            self.frames(),
            self.duration(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize, channels: u16, sample_rate: u32) -> Timeline {
        let samples = (0..frames * channels as usize)
            .map(|i| i as f32 / 1_000_000.0)
            .collect();
        Timeline::from_samples(samples, channels, sample_rate).unwrap()
    }

    #[test]
    fn test_duration_from_frames() {
        let timeline = ramp(44100 * 2, 2, 44100);
        assert_eq!(timeline.frames(), 88200);
        assert_eq!(timeline.duration(), 2.0);
    }

    #[test]
    fn test_from_samples_drops_partial_frame() {
        let timeline = Timeline::from_samples(vec![0.0; 5], 2, 8000).unwrap();
        assert_eq!(timeline.frames(), 2);
        assert_eq!(timeline.samples().len(), 4);
    }

    #[test]
    fn test_from_samples_rejects_zero_layout() {
        assert!(Timeline::from_samples(vec![0.0; 4], 0, 8000).is_err());
        assert!(Timeline::from_samples(vec![0.0; 4], 1, 0).is_err());
    }

    #[test]
    fn test_frame_at_truncates_to_millis() {
        let timeline = ramp(48000 * 3, 1, 48000);
        assert_eq!(timeline.frame_at(1.0), 48000);
        // 1.0009s truncates to 1000ms
        assert_eq!(timeline.frame_at(1.0009), 48000);
        assert_eq!(timeline.frame_at(1.5), 72000);
        assert_eq!(timeline.frame_at(10.0), timeline.frames());
        assert_eq!(timeline.frame_at(-1.0), 0);
    }

    #[test]
    fn test_slice_clamps() {
        let timeline = ramp(100, 2, 1000);
        let slice = timeline.slice(90..200);
        assert_eq!(slice.frames(), 10);
        assert_eq!(slice.samples()[0], timeline.samples()[180]);

        let inverted = timeline.slice(50..10);
        assert!(inverted.is_empty());
    }

    #[test]
    fn test_append_joins_in_order() {
        let timeline = ramp(30, 1, 1000);
        let mut joined = timeline.slice(0..10);
        joined.append(&timeline.slice(10..30)).unwrap();
        assert_eq!(joined, timeline);
    }

    #[test]
    fn test_try_reserve_frames() {
        let mut timeline = ramp(10, 2, 1000);
        timeline.try_reserve_frames(1000).unwrap();
        assert!(matches!(
            timeline.try_reserve_frames(usize::MAX),
            Err(ExtendLoopError::TargetTooLong { .. })
        ));
        assert_eq!(timeline.frames(), 10);
    }

    #[test]
    fn test_append_rejects_mismatch() {
        let mut mono = ramp(10, 1, 1000);
        let stereo = ramp(10, 2, 1000);
        let other_rate = ramp(10, 1, 2000);
        assert!(matches!(
            mono.append(&stereo),
            Err(ExtendLoopError::SpecMismatch(_))
        ));
        assert!(mono.append(&other_rate).is_err());
        assert_eq!(mono.frames(), 10);
    }

    #[test]
    fn test_wav_round_trip_preserves_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        let timeline = ramp(2205, 2, 22050);

        timeline.write_wav(&path).unwrap();
        let loaded = Timeline::read_wav(&path).unwrap();

        assert_eq!(loaded, timeline);
    }

    #[test]
    fn test_read_int_wav_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("int.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(i16::MIN).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.write_sample(16384i16).unwrap();
        writer.finalize().unwrap();

        let loaded = Timeline::read_wav(&path).unwrap();
        assert_eq!(loaded.samples(), &[-1.0, 0.0, 0.5]);
    }
}
