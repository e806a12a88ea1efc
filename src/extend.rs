//! Loop extension: splice `head + N × loop + tail` until the result is at
//! least the requested length.

use tracing::{debug, info};

use crate::audio::Timeline;
use crate::error::{ExtendLoopError, Result};

/// Loop section boundaries in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopWindow {
    pub start: f64,
    pub end: f64,
}

impl LoopWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// Check `0 ≤ start < end < track_length`.
pub fn validate_loop_bounds(track_length: f64, window: LoopWindow) -> Result<()> {
    let LoopWindow { start, end } = window;
    if 0.0 <= start && start < end && end < track_length {
        Ok(())
    } else {
        Err(ExtendLoopError::InvalidLoopBounds {
            track_length,
            start,
            end,
        })
    }
}

/// A timeline cut into the parts before, inside and after the loop section.
#[derive(Debug, Clone)]
pub struct Sections {
    pub head: Timeline,
    pub looped: Timeline,
    pub tail: Timeline,
}

impl Sections {
    /// Cut at the loop boundaries, truncated to whole milliseconds.
    pub fn split(timeline: &Timeline, window: LoopWindow) -> Self {
        let start = timeline.frame_at(window.start);
        let end = timeline.frame_at(window.end).max(start);

        Self {
            head: timeline.slice(0..start),
            looped: timeline.slice(start..end),
            tail: timeline.slice(end..timeline.frames()),
        }
    }

    /// Assemble `head + repeats × loop + tail`.
    pub fn assemble(&self, repeats: usize) -> Result<Timeline> {
        let added = self
            .looped
            .frames()
            .checked_mul(repeats)
            .and_then(|f| f.checked_add(self.tail.frames()));

        let mut result = self.head.clone();
        result.try_reserve_frames(added.unwrap_or(usize::MAX))?;
        for _ in 0..repeats {
            result.append(&self.looped)?;
        }
        result.append(&self.tail)?;
        Ok(result)
    }
}

/// How many times the loop is repeated and what that adds up to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtensionPlan {
    pub repeats: usize,
    /// Seconds.
    pub head: f64,
    pub loop_length: f64,
    pub tail: f64,
    pub total: f64,
}

impl ExtensionPlan {
    /// Smallest repeat count `N` with `head + N·loop + tail ≥ min_length`.
    ///
    /// Lengths are in frames so the comparison is exact for every `N`.
    /// `loop_frames` must be non-zero. Fails with `TargetTooLong` when no
    /// frame count representable in memory reaches `min_length`.
    pub fn compute(
        head_frames: usize,
        loop_frames: usize,
        tail_frames: usize,
        sample_rate: u32,
        min_length: f64,
    ) -> Result<Self> {
        let rate = sample_rate as f64;
        let fixed = head_frames.saturating_add(tail_frames);
        let total_secs =
            |n: usize| fixed.saturating_add(n.saturating_mul(loop_frames)) as f64 / rate;

        if !min_length.is_finite() || (loop_frames > 0 && total_secs(usize::MAX) < min_length) {
            return Err(ExtendLoopError::TargetTooLong {
                seconds: min_length,
            });
        }

        let mut repeats = 0;
        if loop_frames > 0 {
            let missing = (min_length * rate - fixed as f64).max(0.0);
            repeats = (missing / loop_frames as f64).ceil() as usize;
            while total_secs(repeats) < min_length {
                repeats += 1;
            }
            while repeats > 0 && total_secs(repeats - 1) >= min_length {
                repeats -= 1;
            }
        }

        Ok(Self {
            repeats,
            head: head_frames as f64 / rate,
            loop_length: loop_frames as f64 / rate,
            tail: tail_frames as f64 / rate,
            total: total_secs(repeats),
        })
    }
}

/// Extend `timeline` to at least `min_length` seconds by repeating the loop
/// section.
///
/// Returns the new timeline and the plan that produced it. A track already
/// long enough without the loop section comes back as `head + tail`.
pub fn extend(
    timeline: &Timeline,
    window: LoopWindow,
    min_length: f64,
) -> Result<(Timeline, ExtensionPlan)> {
    validate_loop_bounds(timeline.duration(), window)?;

    let sections = Sections::split(timeline, window);
    if sections.looped.is_empty() {
        return Err(ExtendLoopError::EmptyLoop {
            start: window.start,
            end: window.end,
        });
    }

    let plan = ExtensionPlan::compute(
        sections.head.frames(),
        sections.looped.frames(),
        sections.tail.frames(),
        timeline.sample_rate(),
        min_length,
    )?;

    debug!(
        "Sections: head {:.3}s, loop {:.3}s, tail {:.3}s",
        plan.head, plan.loop_length, plan.tail
    );

    let result = sections.assemble(plan.repeats)?;

    info!(
        "Repeated loop {} time(s): {:.3}s → {:.3}s",
        plan.repeats,
        timeline.duration(),
        result.duration()
    );

    Ok((result, plan))
}
