//! Render command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use vlayer_models::EncodingConfig;

use crate::error::{MediaError, MediaResult};
use crate::graph::FilterGraph;
use crate::progress::{ProgressSink, TranscodeProgress};

/// Builder for one transcoder invocation.
#[derive(Debug, Clone)]
pub struct RenderCommand {
    graph: FilterGraph,
    encoding: EncodingConfig,
    output: PathBuf,
}

impl RenderCommand {
    /// Create a render command from a compiled graph.
    pub fn new(graph: FilterGraph, output: impl AsRef<Path>) -> Self {
        Self {
            graph,
            encoding: EncodingConfig::default(),
            output: output.as_ref().to_path_buf(),
        }
    }

    /// Override the encoding configuration.
    pub fn encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    /// Build the command arguments.
    ///
    /// With a compositing graph the final video label is mapped explicitly,
    /// audio passes through from the base input when present, and the
    /// output is truncated to the shortest mapped stream. Without one the
    /// base stream is re-encoded directly.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string()];

        for input in &self.graph.inputs {
            args.push("-i".to_string());
            args.push(input.clone());
        }

        if let (Some(filter), Some(label)) =
            (&self.graph.filter_complex, &self.graph.output_label)
        {
            args.push("-filter_complex".to_string());
            args.push(filter.clone());
            args.push("-map".to_string());
            args.push(label.clone());
            args.push("-map".to_string());
            args.push("0:a?".to_string());
            args.extend(self.encoding.to_output_args());
            args.push("-shortest".to_string());
        } else {
            args.extend(self.encoding.to_output_args());
        }

        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Run a render command, streaming stderr into the progress monitor.
///
/// Blocks until the transcoder exits: stderr is read line by line until the
/// stream closes, then the exit status is collected. Because stderr is
/// consumed for progress parsing, a failing run surfaces only a generic
/// error plus the exit code.
pub async fn run_render(
    cmd: &RenderCommand,
    duration: Option<f64>,
    sink: &ProgressSink,
) -> MediaResult<()> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let args = cmd.build_args();
    debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

    let mut child = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;

    let stderr = child.stderr.take().expect("stderr piped above");
    let mut lines = BufReader::new(stderr).lines();
    let mut monitor = TranscodeProgress::new(duration);

    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(event) = monitor.observe_line(&line) {
            sink(event);
        }
    }

    let status = child.wait().await?;
    if status.success() {
        Ok(())
    } else {
        Err(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            status.code(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_overlay() -> FilterGraph {
        FilterGraph {
            inputs: vec!["/in/base.mp4".to_string(), "/assets/logo.png".to_string()],
            filter_complex: Some(
                "[1:v][0:v]scale2ref=w=main_w*0.25:h=main_h*0.1:flags=bilinear[scaled0][base0];\
                 [base0][scaled0]overlay=x=main_w*0.1:y=main_h*0.8:enable='between(t,1,3)'[v1]"
                    .to_string(),
            ),
            output_label: Some("[v1]".to_string()),
        }
    }

    #[test]
    fn test_build_args_with_graph() {
        let graph = graph_with_overlay();
        let filter = graph.filter_complex.clone().unwrap();
        let cmd = RenderCommand::new(graph, "/out/output.mp4");

        let args = cmd.build_args();
        let expected: Vec<String> = [
            "-y",
            "-i",
            "/in/base.mp4",
            "-i",
            "/assets/logo.png",
            "-filter_complex",
            filter.as_str(),
            "-map",
            "[v1]",
            "-map",
            "0:a?",
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-crf",
            "23",
            "-c:a",
            "aac",
            "-shortest",
            "/out/output.mp4",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(args, expected);
    }

    #[test]
    fn test_build_args_without_graph_falls_back_to_reencode() {
        let graph = FilterGraph {
            inputs: vec!["/in/base.mp4".to_string()],
            filter_complex: None,
            output_label: None,
        };
        let cmd = RenderCommand::new(graph, "/out/output.mp4");

        let args = cmd.build_args();
        assert_eq!(
            args,
            vec![
                "-y",
                "-i",
                "/in/base.mp4",
                "-c:v",
                "libx264",
                "-preset",
                "medium",
                "-crf",
                "23",
                "-c:a",
                "aac",
                "/out/output.mp4"
            ]
        );
        assert!(!args.contains(&"-filter_complex".to_string()));
        assert!(!args.contains(&"-shortest".to_string()));
    }
}
