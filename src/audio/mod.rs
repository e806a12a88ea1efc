pub mod codec;
pub mod probe;
pub mod timeline;

pub use codec::{bitrate_arg, decode, export, format_for_extension, ExportParams};
pub use probe::{probe, EncodingProfile};
pub use timeline::Timeline;

use std::process::Command;

use tracing::debug;

use crate::error::{ExtendLoopError, Result};

/// Check that ffmpeg is installed and runnable.
pub fn check_ffmpeg(binary: &str) -> Result<()> {
    let output = Command::new(binary)
        .arg("-version")
        .output()
        .map_err(|e| {
            ExtendLoopError::Config(format!(
                "{binary} not found. Install it with: brew install ffmpeg (macOS) or apt install ffmpeg (Linux). Error: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(ExtendLoopError::Config(format!("{binary} check failed")));
    }

    debug!("{binary} is available");
    Ok(())
}
