use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtendLoopError {
    #[error("Unrecognised time format: '{0}'")]
    TimeParse(String),

    #[error(
        "Loop points must satisfy 0 ≤ start < end < track length ({track_length:.3}s); got {start}s → {end}s."
    )]
    InvalidLoopBounds {
        track_length: f64,
        start: f64,
        end: f64,
    },

    #[error("Loop section {start}s → {end}s is empty at millisecond resolution")]
    EmptyLoop { start: f64, end: f64 },

    #[error("Target length {seconds}s is too long to build in memory")]
    TargetTooLong { seconds: f64 },

    #[error("No such file: {0}")]
    FileNotFound(String),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Audio decode failed: {0}")]
    Decode(String),

    #[error("Audio export failed: {0}")]
    Export(String),

    #[error("Incompatible audio: {0}")]
    SpecMismatch(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, ExtendLoopError>;
