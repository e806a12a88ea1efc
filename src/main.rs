use anyhow::{Context, Result};
use clap::Parser;
use extend_loop::config::Config;
use extend_loop::{extend_file, parse_time, print_summary, ExtendRequest, LoopWindow};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "extend-loop")]
#[command(version, about = "Extend an audio file by looping a section")]
#[command(
    long_about = "Extend an audio file by repeating the section between --loop-start and --loop-end \
                  until the result is at least --min-length long, keeping the original bit-rate when known."
)]
struct Cli {
    /// Path to input audio
    #[arg(short, long)]
    input: PathBuf,

    /// Path for output file (default: extended_<name>.<ext> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Loop start time (e.g. 0:17.758)
    #[arg(long)]
    loop_start: String,

    /// Loop end time (e.g. 1:51.710)
    #[arg(long)]
    loop_end: String,

    /// Target minimum length (e.g. 10m, 300s, 1:00:00)
    #[arg(long)]
    min_length: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable progress spinners
    #[arg(long)]
    no_progress: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

fn derive_output_path(input: &Path, prefix: &str) -> PathBuf {
    let name = input.file_name().unwrap_or_default();
    input.with_file_name(format!("{prefix}{}", name.to_string_lossy()))
}

fn parse_arg(name: &str, value: &str) -> Result<f64> {
    parse_time(value).with_context(|| format!("Invalid --{name}"))
}

fn run(cli: Cli) -> Result<()> {
    let input = expand_home(&cli.input);
    if !input.exists() {
        anyhow::bail!("No such file: {}", input.display());
    }

    let mut config = Config::load().context("Failed to load configuration")?;
    if cli.no_progress {
        config.show_progress = false;
    }
    config.validate()?;

    let output = cli
        .output
        .map(|p| expand_home(&p))
        .unwrap_or_else(|| derive_output_path(&input, &config.output_prefix));

    let request = ExtendRequest {
        window: LoopWindow::new(
            parse_arg("loop-start", &cli.loop_start)?,
            parse_arg("loop-end", &cli.loop_end)?,
        ),
        min_length: parse_arg("min-length", &cli.min_length)?,
    };

    info!("Input:      {}", input.display());
    info!("Output:     {}", output.display());
    info!("Min length: {:.3}s", request.min_length);

    let result = extend_file(&input, &output, request, &config)?;
    print_summary(&result);

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_output_path() {
        let input = PathBuf::from("/path/to/song.mp3");
        assert_eq!(
            derive_output_path(&input, "extended_"),
            PathBuf::from("/path/to/extended_song.mp3")
        );

        let input = PathBuf::from("theme.final.m4a");
        assert_eq!(
            derive_output_path(&input, "extended_"),
            PathBuf::from("extended_theme.final.m4a")
        );
    }

    #[test]
    fn test_expand_home() {
        let plain = PathBuf::from("/abs/song.mp3");
        assert_eq!(expand_home(&plain), plain);

        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_home(Path::new("~/music/song.mp3")),
                home.join("music/song.mp3")
            );
        }
    }

    #[test]
    fn test_parse_arg_names_option() {
        let err = parse_arg("loop-start", "abc").unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("--loop-start"));
        assert!(msg.contains("'abc'"));
        assert_eq!(parse_arg("min-length", "10m").unwrap(), 600.0);
    }

    #[test]
    fn test_cli_parses_required_options() {
        let cli = Cli::try_parse_from([
            "extend-loop",
            "-i",
            "song.mp3",
            "--loop-start",
            "0:18.744",
            "--loop-end",
            "1:52.563",
            "--min-length",
            "10m",
        ])
        .unwrap();
        assert_eq!(cli.input, PathBuf::from("song.mp3"));
        assert!(cli.output.is_none());
        assert_eq!(cli.min_length, "10m");

        assert!(Cli::try_parse_from(["extend-loop", "-i", "song.mp3"]).is_err());
    }
}
