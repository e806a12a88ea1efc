//! Time expressions: `2h`, `10m`, `45.5s`, `1:52.563`, `1:01:01`.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{ExtendLoopError, Result};

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^\s*(?:
            (?P<h>[0-9]+)\s*h(?:ours?)? |
            (?P<m>[0-9]+)\s*m(?:in(?:s|utes?)?)? |
            (?P<s>[0-9]+(?:\.[0-9]+)?)\s*s(?:ec(?:s|onds?)?)? |
            (?P<clock>(?:[0-9]+:)?[0-9]+:[0-9]+(?:\.[0-9]{1,6})?)
        )\s*$",
    )
    .expect("Invalid regex")
});

/// Parse a time expression into seconds.
///
/// Accepts exactly one of:
/// - hours: `2h`, `2 hours`
/// - minutes: `10m`, `10 min`, `10 minutes`
/// - seconds: `45s`, `45.5 sec`, `45 seconds`
/// - clock: `M:S`, `H:M:S`, with up to six fractional digits on the seconds
///
/// Unit suffixes are case-insensitive and surrounding whitespace is ignored.
pub fn parse_time(text: &str) -> Result<f64> {
    let caps = TIME_RE
        .captures(text)
        .ok_or_else(|| ExtendLoopError::TimeParse(text.to_string()))?;

    if let Some(h) = caps.name("h") {
        return Ok(parse_number(h.as_str(), text)? * 3600.0);
    }
    if let Some(m) = caps.name("m") {
        return Ok(parse_number(m.as_str(), text)? * 60.0);
    }
    if let Some(s) = caps.name("s") {
        return parse_number(s.as_str(), text);
    }

    parse_clock(&caps, text)
}

fn parse_clock(caps: &Captures<'_>, text: &str) -> Result<f64> {
    let clock = caps
        .name("clock")
        .ok_or_else(|| ExtendLoopError::TimeParse(text.to_string()))?;

    let parts = clock
        .as_str()
        .split(':')
        .map(|p| parse_number(p, text))
        .collect::<Result<Vec<f64>>>()?;

    match parts.as_slice() {
        [h, m, s] => Ok(h * 3600.0 + m * 60.0 + s),
        [m, s] => Ok(m * 60.0 + s),
        _ => Err(ExtendLoopError::TimeParse(text.to_string())),
    }
}

fn parse_number(value: &str, text: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|_| ExtendLoopError::TimeParse(text.to_string()))
}

/// Render seconds as `H:MM:SS.mmm`, rounded to the nearest millisecond.
pub fn format_hhmmss(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let secs = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}
