//! Transcode progress monitoring.
//!
//! The transcoder's only progress signal is the `time=` token embedded in
//! its human-readable stderr stats lines. The monitor scrapes that token
//! and converts elapsed time into a fraction of the whole job.
//!
//! The fraction is remapped into the [0.20, 0.95] window: the first 20% is
//! reserved for startup and invocation, the last 5% for finalization. The
//! fixed markers at 0.20 and 0.99 bracket the streamed updates.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Fraction reported just before the transcoder is spawned.
pub const PROGRESS_STARTING: f64 = 0.20;
/// Fraction reported once the transcoder has exited successfully.
pub const PROGRESS_FINALIZING: f64 = 0.99;
/// Share of the job covered by the transcoder's own reported time.
const TRANSCODE_SPAN: f64 = 0.75;

/// A single fractional-progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Overall job fraction in (0, 1].
    pub fraction: f64,
    /// Human-readable step description.
    pub message: Option<String>,
}

impl ProgressEvent {
    pub fn new(fraction: f64, message: impl Into<String>) -> Self {
        Self {
            fraction,
            message: Some(message.into()),
        }
    }
}

/// Sink receiving progress events during a render.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

fn time_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"time=(\d{2}):(\d{2}):(\d{2})\.(\d+)").expect("valid time regex")
    })
}

/// Extract the elapsed-seconds token from one stderr line, if present.
pub fn parse_time_line(line: &str) -> Option<f64> {
    let caps = time_token().captures(line)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    let frac: f64 = format!("0.{}", &caps[4]).parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds + frac)
}

/// Maps transcoder stderr lines to job-progress events.
///
/// One instance per render. When the total duration is unknown the monitor
/// stays silent and the fixed markers are the only events a job sees; that
/// is a degradation in granularity, not a failure.
#[derive(Debug)]
pub struct TranscodeProgress {
    duration: Option<f64>,
    last_fraction: f64,
}

impl TranscodeProgress {
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            duration,
            last_fraction: PROGRESS_STARTING,
        }
    }

    /// Observe one stderr line; returns an event when the line carries a
    /// usable time token.
    pub fn observe_line(&mut self, line: &str) -> Option<ProgressEvent> {
        let duration = self.duration.filter(|d| *d > 0.0)?;
        let elapsed = parse_time_line(line)?;
        let ratio = (elapsed / duration).clamp(0.0, 1.0);
        let fraction = (PROGRESS_STARTING + ratio * TRANSCODE_SPAN).max(self.last_fraction);
        self.last_fraction = fraction;
        Some(ProgressEvent::new(fraction, "Rendering"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATS_LINE: &str =
        "frame=  120 fps= 30 q=28.0 size=    512kB time=00:00:05.04 bitrate= 831.7kbits/s speed=1.01x";

    #[test]
    fn test_parse_time_line() {
        assert!((parse_time_line(STATS_LINE).unwrap() - 5.04).abs() < 0.001);
        assert!(
            (parse_time_line("time=01:02:03.50").unwrap() - 3723.5).abs() < 0.001
        );
        assert!(parse_time_line("Press [q] to stop").is_none());
        assert!(parse_time_line("time=N/A").is_none());
    }

    #[test]
    fn test_window_mapping() {
        let mut monitor = TranscodeProgress::new(Some(10.0));
        let event = monitor.observe_line(STATS_LINE).unwrap();
        // 5.04s of 10s -> 0.2 + 0.504 * 0.75
        assert!((event.fraction - 0.578).abs() < 0.001);
        assert_eq!(event.message.as_deref(), Some("Rendering"));
    }

    #[test]
    fn test_fraction_clamped_to_window_top() {
        let mut monitor = TranscodeProgress::new(Some(2.0));
        let event = monitor.observe_line("time=00:01:00.00").unwrap();
        assert!((event.fraction - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_events_are_non_decreasing() {
        let mut monitor = TranscodeProgress::new(Some(10.0));
        let first = monitor.observe_line("time=00:00:06.00").unwrap();
        // A regressed timestamp must not lower the reported fraction.
        let second = monitor.observe_line("time=00:00:02.00").unwrap();
        assert!(second.fraction >= first.fraction);
    }

    #[test]
    fn test_unknown_duration_emits_nothing() {
        let mut monitor = TranscodeProgress::new(None);
        assert!(monitor.observe_line(STATS_LINE).is_none());

        let mut monitor = TranscodeProgress::new(Some(0.0));
        assert!(monitor.observe_line(STATS_LINE).is_none());
    }

    #[test]
    fn test_lines_without_token_emit_nothing() {
        let mut monitor = TranscodeProgress::new(Some(10.0));
        assert!(monitor.observe_line("Stream mapping:").is_none());
    }
}
