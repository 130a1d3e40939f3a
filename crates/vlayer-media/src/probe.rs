//! FFprobe duration query.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Query a media file's total duration in seconds.
///
/// Asks ffprobe for the container and per-stream durations in plain
/// numeric, one-value-per-line form. Some files report several values; the
/// longest one wins.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration:stream=duration",
            "-of",
            "default=nokey=1:noprint_wrappers=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            "FFprobe exited with non-zero status",
            Some(String::from_utf8_lossy(&output.stderr).into_owned()),
        ));
    }

    match max_duration(&String::from_utf8_lossy(&output.stdout)) {
        Some(duration) => {
            debug!(path = %path.display(), duration, "Probed media duration");
            Ok(duration)
        }
        None => Err(MediaError::DurationUnavailable),
    }
}

/// Pick the largest parsable duration from probe output.
fn max_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .filter_map(|line| line.trim().parse::<f64>().ok())
        .fold(None, |max, value| {
            Some(max.map_or(value, |m: f64| m.max(value)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_duration_takes_largest() {
        let out = "12.5\n12.461000\n12.507000\n";
        assert!((max_duration(out).unwrap() - 12.507).abs() < 0.001);
    }

    #[test]
    fn test_max_duration_skips_unparsable_lines() {
        let out = "N/A\n8.25\n\n";
        assert!((max_duration(out).unwrap() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_max_duration_empty_output() {
        assert!(max_duration("").is_none());
        assert!(max_duration("N/A\nN/A\n").is_none());
    }
}
