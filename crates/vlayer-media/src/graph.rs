//! Overlay compositing graph compiler.
//!
//! Translates an ordered overlay list into the transcoder input list and a
//! `filter_complex` expression. Pure string construction; no I/O and no
//! state beyond a per-call label counter, so compiling the same list twice
//! yields byte-identical output.
//!
//! All anchor, size and font expressions are written in terms of the base
//! stream's runtime `main_w`/`main_h`, so one graph works for any input
//! resolution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use vlayer_models::{Overlay, OverlayKind};

/// Compiled compositing graph for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGraph {
    /// Transcoder input sources; index 0 is always the base video.
    pub inputs: Vec<String>,
    /// `filter_complex` expression; absent when no overlay produced a stage.
    pub filter_complex: Option<String>,
    /// Label of the final video stream; present iff `filter_complex` is.
    pub output_label: Option<String>,
}

impl FilterGraph {
    /// Whether any overlay survived compilation.
    pub fn has_overlays(&self) -> bool {
        self.filter_complex.is_some()
    }

    /// The base video path, as passed to the compiler.
    pub fn base_input(&self) -> Option<&str> {
        self.inputs.first().map(String::as_str)
    }
}

/// Escape text for a drawtext filter argument.
fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
        .replace('%', "\\%")
}

/// Render a percentage (0-100) as the decimal fraction used in filter
/// expressions (10 -> "0.1").
fn fraction(percent: f64) -> String {
    format!("{}", percent / 100.0)
}

/// Compile an overlay list into inputs plus a filter graph.
///
/// Each image/video overlay contributes one extra input in list order;
/// its resolved path comes from `assets`, falling back to the overlay's
/// `content` verbatim. Unsupported kinds are skipped without consuming an
/// input. The id -> input map is first-match-wins: a colliding id keeps
/// the earlier input.
pub fn compile_overlay_graph(
    input: &Path,
    overlays: &[Overlay],
    assets: &HashMap<String, PathBuf>,
) -> FilterGraph {
    let mut inputs = vec![input.to_string_lossy().into_owned()];

    let mut input_index: HashMap<&str, usize> = HashMap::new();
    for overlay in overlays {
        if overlay.kind.needs_input() {
            let resolved = assets
                .get(&overlay.content)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|| overlay.content.clone());
            inputs.push(resolved);
            input_index
                .entry(overlay.id.as_str())
                .or_insert(inputs.len() - 1);
        }
    }

    let mut stages: Vec<String> = Vec::new();
    let mut current = "[0:v]".to_string();
    let mut chain = 0usize;

    for overlay in overlays {
        let x = fraction(overlay.position.x);
        let y = fraction(overlay.position.y);
        let enable = format!(
            "enable='between(t,{},{})'",
            overlay.timing.start, overlay.timing.end
        );

        match overlay.kind {
            OverlayKind::Text | OverlayKind::Sticker => {
                let h = fraction(overlay.size.height);
                chain += 1;
                let label = format!("[v{chain}]");
                stages.push(format!(
                    "{current}drawtext=text='{text}':fontsize=main_h*{h}*0.8:\
                     fontcolor=white:borderw=2:bordercolor=black@0.8:\
                     x=main_w*{x}:y=main_h*{y}:{enable}{label}",
                    text = escape_drawtext(&overlay.content),
                ));
                current = label;
            }
            OverlayKind::Image | OverlayKind::Video => {
                let Some(&index) = input_index.get(overlay.id.as_str()) else {
                    // No dedicated input resolved for this id; skip the stage.
                    continue;
                };
                let w = fraction(overlay.size.width);
                let h = fraction(overlay.size.height);

                let mut src = format!("[{index}:v]");
                if overlay.kind == OverlayKind::Video {
                    // Restart the overlay clock so upstream trimming cannot
                    // shift its timeline.
                    let pts = format!("[pts{chain}]");
                    stages.push(format!("{src}setpts=PTS-STARTPTS{pts}"));
                    src = pts;
                }

                // Scale against the base stream so overlay size tracks the
                // actual resolution; requested dimensions are exact, aspect
                // is not preserved.
                let scaled = format!("[scaled{chain}]");
                let base = format!("[base{chain}]");
                stages.push(format!(
                    "{src}{current}scale2ref=w=main_w*{w}:h=main_h*{h}:flags=bilinear{scaled}{base}"
                ));

                chain += 1;
                let label = format!("[v{chain}]");
                stages.push(format!(
                    "{base}{scaled}overlay=x=main_w*{x}:y=main_h*{y}:{enable}{label}"
                ));
                current = label;
            }
            OverlayKind::Unsupported => {}
        }
    }

    if stages.is_empty() {
        FilterGraph {
            inputs,
            filter_complex: None,
            output_label: None,
        }
    } else {
        FilterGraph {
            inputs,
            filter_complex: Some(stages.join(";")),
            output_label: Some(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vlayer_models::{Position, Size, Timing};

    fn overlay(id: &str, kind: OverlayKind, content: &str) -> Overlay {
        Overlay {
            id: id.to_string(),
            kind,
            content: content.to_string(),
            position: Position { x: 10.0, y: 80.0 },
            size: Size {
                width: 25.0,
                height: 10.0,
            },
            timing: Timing {
                start: 1.0,
                end: 3.0,
            },
        }
    }

    fn compile(overlays: &[Overlay], assets: &HashMap<String, PathBuf>) -> FilterGraph {
        compile_overlay_graph(Path::new("/in/base.mp4"), overlays, assets)
    }

    #[test]
    fn test_empty_list_has_no_graph() {
        let graph = compile(&[], &HashMap::new());
        assert_eq!(graph.inputs, vec!["/in/base.mp4"]);
        assert!(graph.filter_complex.is_none());
        assert!(graph.output_label.is_none());
    }

    #[test]
    fn test_input_count_law() {
        let overlays = vec![
            overlay("a", OverlayKind::Text, "hi"),
            overlay("b", OverlayKind::Image, "logo.png"),
            overlay("c", OverlayKind::Unsupported, "???"),
            overlay("d", OverlayKind::Video, "clip.mp4"),
            overlay("e", OverlayKind::Sticker, "🔥"),
        ];
        let graph = compile(&overlays, &HashMap::new());
        assert_eq!(
            graph.inputs,
            vec!["/in/base.mp4", "logo.png", "clip.mp4"]
        );
    }

    #[test]
    fn test_text_overlay_stage() {
        let overlays = vec![overlay("a", OverlayKind::Text, "Hello")];
        let graph = compile(&overlays, &HashMap::new());
        let filter = graph.filter_complex.unwrap();
        assert_eq!(
            filter,
            "[0:v]drawtext=text='Hello':fontsize=main_h*0.1*0.8:\
             fontcolor=white:borderw=2:bordercolor=black@0.8:\
             x=main_w*0.1:y=main_h*0.8:enable='between(t,1,3)'[v1]"
        );
        assert_eq!(graph.output_label.as_deref(), Some("[v1]"));
    }

    #[test]
    fn test_text_escaping() {
        let overlays = vec![overlay("a", OverlayKind::Text, r"100%: it's \done")];
        let graph = compile(&overlays, &HashMap::new());
        let filter = graph.filter_complex.unwrap();
        assert!(filter.contains(r"text='100\%\: it\'s \\done'"));
    }

    #[test]
    fn test_image_overlay_resolves_asset() {
        let mut assets = HashMap::new();
        assets.insert("logo.png".to_string(), PathBuf::from("/assets/logo.png"));

        let overlays = vec![overlay("a", OverlayKind::Image, "logo.png")];
        let graph = compile(&overlays, &assets);

        assert_eq!(graph.inputs, vec!["/in/base.mp4", "/assets/logo.png"]);
        let filter = graph.filter_complex.unwrap();
        assert_eq!(
            filter,
            "[1:v][0:v]scale2ref=w=main_w*0.25:h=main_h*0.1:flags=bilinear[scaled0][base0];\
             [base0][scaled0]overlay=x=main_w*0.1:y=main_h*0.8:enable='between(t,1,3)'[v1]"
        );
    }

    #[test]
    fn test_video_overlay_resets_timestamps() {
        let overlays = vec![overlay("a", OverlayKind::Video, "clip.mp4")];
        let graph = compile(&overlays, &HashMap::new());
        let filter = graph.filter_complex.unwrap();
        assert!(filter.starts_with("[1:v]setpts=PTS-STARTPTS[pts0];"));
        assert!(filter.contains("[pts0][0:v]scale2ref="));
    }

    #[test]
    fn test_stages_chain_in_list_order() {
        let overlays = vec![
            overlay("a", OverlayKind::Text, "first"),
            overlay("b", OverlayKind::Image, "logo.png"),
            overlay("c", OverlayKind::Text, "last"),
        ];
        let graph = compile(&overlays, &HashMap::new());
        let filter = graph.filter_complex.unwrap();

        // Text draws on [0:v] into [v1], image composites [v1] into [v2],
        // final text draws on [v2] into [v3].
        assert!(filter.starts_with("[0:v]drawtext=text='first'"));
        assert!(filter.contains("[1:v][v1]scale2ref="));
        assert!(filter.contains("[v2]drawtext=text='last'"));
        assert_eq!(graph.output_label.as_deref(), Some("[v3]"));
    }

    #[test]
    fn test_unsupported_kind_does_not_shift_input_indices() {
        let with_unknown = vec![
            overlay("a", OverlayKind::Unsupported, "???"),
            overlay("b", OverlayKind::Image, "logo.png"),
        ];
        let without_unknown = vec![overlay("b", OverlayKind::Image, "logo.png")];

        let g1 = compile(&with_unknown, &HashMap::new());
        let g2 = compile(&without_unknown, &HashMap::new());
        assert_eq!(g1.inputs, g2.inputs);
        assert_eq!(g1.filter_complex, g2.filter_complex);
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let overlays = vec![
            overlay("a", OverlayKind::Text, "hi"),
            overlay("b", OverlayKind::Video, "clip.mp4"),
            overlay("c", OverlayKind::Image, "logo.png"),
        ];
        let g1 = compile(&overlays, &HashMap::new());
        let g2 = compile(&overlays, &HashMap::new());
        assert_eq!(g1, g2);
    }

    #[test]
    fn test_expressions_use_runtime_dimensions_only() {
        let mut ov = overlay("a", OverlayKind::Text, "hi");
        ov.position = Position { x: 33.0, y: 66.0 };
        ov.size = Size {
            width: 0.0,
            height: 20.0,
        };
        let graph = compile(&[ov], &HashMap::new());
        let filter = graph.filter_complex.unwrap();
        assert!(filter.contains("x=main_w*0.33"));
        assert!(filter.contains("y=main_h*0.66"));
        assert!(filter.contains("fontsize=main_h*0.2*0.8"));
    }

    #[test]
    fn test_id_collision_first_match_wins() {
        let overlays = vec![
            overlay("dup", OverlayKind::Image, "first.png"),
            overlay("dup", OverlayKind::Image, "second.png"),
        ];
        let graph = compile(&overlays, &HashMap::new());

        // Both overlays still get an input slot, but both stages composite
        // the first-matched input.
        assert_eq!(
            graph.inputs,
            vec!["/in/base.mp4", "first.png", "second.png"]
        );
        let filter = graph.filter_complex.unwrap();
        assert!(filter.contains("[1:v][0:v]scale2ref="));
        assert!(filter.contains("[1:v][v1]scale2ref="));
        assert!(!filter.contains("[2:v]"));
    }
}
