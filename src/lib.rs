pub mod audio;
pub mod config;
pub mod error;
pub mod extend;
pub mod pipeline;
pub mod time;

pub use config::Config;
pub use error::{ExtendLoopError, Result};
pub use extend::{extend, ExtensionPlan, LoopWindow};
pub use pipeline::{extend_file, print_summary, ExtendRequest, ExtendResult};
pub use time::{format_hhmmss, parse_time};
