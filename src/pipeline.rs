use crate::audio::{check_ffmpeg, decode, export, probe, EncodingProfile, ExportParams};
use crate::config::Config;
use crate::error::{ExtendLoopError, Result};
use crate::extend::{extend, ExtensionPlan, LoopWindow};
use crate::time::format_hhmmss;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// What to extend and how far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtendRequest {
    pub window: LoopWindow,
    /// Minimum output length in seconds.
    pub min_length: f64,
}

/// Result of extending one file.
#[derive(Debug, Clone)]
pub struct ExtendResult {
    /// Path to the written audio file.
    pub output_path: PathBuf,
    /// Metadata of the input as reported by the prober.
    pub profile: EncodingProfile,
    /// Encoder settings used for the output.
    pub export_params: ExportParams,
    pub plan: ExtensionPlan,
    pub window: LoopWindow,
    /// Seconds.
    pub original_duration: f64,
    pub extended_duration: f64,
    pub elapsed: Duration,
}

fn spinner(enabled: bool, message: &'static str) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Extend an audio file by looping a section until it is at least
/// `request.min_length` seconds long.
///
/// Stages:
/// 1. Probe the input for codec and bit-rate (best effort)
/// 2. Decode the whole input into memory
/// 3. Splice head, repeated loop and tail
/// 4. Encode to `output`, passing the source bit-rate through when known
pub fn extend_file(
    input: &Path,
    output: &Path,
    request: ExtendRequest,
    config: &Config,
) -> Result<ExtendResult> {
    let start_time = Instant::now();

    if !input.exists() {
        return Err(ExtendLoopError::FileNotFound(input.display().to_string()));
    }
    check_ffmpeg(&config.ffmpeg_path)?;

    // Stage 1: probe
    info!("Stage 1/4: Probing {}", input.display());
    let profile = probe(&config.ffprobe_path, input);
    info!(
        "Codec: {}, bit-rate: {}, sample rate: {}",
        profile.codec_name.as_deref().unwrap_or("unknown"),
        profile
            .bit_rate
            .map(|b| b.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        profile
            .sample_rate
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    );

    // Stage 2: decode
    info!("Stage 2/4: Decoding audio");
    let pb = spinner(config.show_progress, "Decoding audio...");
    let timeline = decode(&config.ffmpeg_path, input)?;
    if let Some(pb) = pb {
        pb.finish_with_message(format!("✓ Decoded {:.3}s", timeline.duration()));
    }

    // Stage 3: splice
    info!("Stage 3/4: Extending to at least {:.3}s", request.min_length);
    let (extended, plan) = extend(&timeline, request.window, request.min_length)?;

    // Stage 4: encode
    let export_params = ExportParams::for_output(output, profile.bit_rate);
    info!(
        "Stage 4/4: Encoding (format: {}, bit-rate: {})",
        export_params.format.as_deref().unwrap_or("auto"),
        export_params.bitrate.as_deref().unwrap_or("default")
    );
    let pb = spinner(config.show_progress, "Encoding output...");
    export(&config.ffmpeg_path, &extended, output, &export_params)?;
    if let Some(pb) = pb {
        pb.finish_with_message(format!("✓ Wrote {}", output.display()));
    }

    Ok(ExtendResult {
        output_path: output.to_path_buf(),
        profile,
        export_params,
        plan,
        window: request.window,
        original_duration: timeline.duration(),
        extended_duration: extended.duration(),
        elapsed: start_time.elapsed(),
    })
}

/// Human-readable summary lines for a finished run.
pub fn summary_lines(result: &ExtendResult) -> Vec<String> {
    let bitrate = result
        .profile
        .bit_rate
        .map(|b| format!("{} kb/s", b as f64 / 1000.0))
        .unwrap_or_else(|| "N/A".to_string());
    let sample_rate = result
        .profile
        .sample_rate
        .map(|r| format!("{r} Hz"))
        .unwrap_or_else(|| "N/A".to_string());

    vec![
        format!("Output:           {}", result.output_path.display()),
        format!("Original length:  {:.3}s", result.original_duration),
        format!("Extended length:  {:.3}s", result.extended_duration),
        format!("Loop repeats:     {}", result.plan.repeats),
        format!(
            "Original codec:   {}",
            result.profile.codec_name.as_deref().unwrap_or("unknown")
        ),
        format!("Original bitrate: {bitrate}"),
        format!("Sample rate:      {sample_rate}"),
        format!(
            "Loop section:     {} → {} ({:.3}s)",
            format_hhmmss(result.window.start),
            format_hhmmss(result.window.end),
            result.plan.loop_length
        ),
    ]
}

/// Print a summary of the run to stdout.
pub fn print_summary(result: &ExtendResult) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                        Loop Extension Complete                ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    for line in summary_lines(result) {
        println!("  {line}");
    }
    println!();
    println!("  Took {:.2}s", result.elapsed.as_secs_f64());
    println!("═══════════════════════════════════════════════════════════════");
}
