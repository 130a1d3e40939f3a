//! Overlay metadata definitions.
//!
//! An overlay list arrives already validated by the upload layer; the types
//! here mirror that wire shape. List order is compositing order: later
//! entries render on top of earlier ones and on top of the base video.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of compositing element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    /// Literal text drawn over the base video
    Text,
    /// Styled text (emoji glyphs); composited exactly like `Text`
    Sticker,
    /// Still image fed as its own transcoder input
    Image,
    /// Video clip fed as its own transcoder input
    Video,
    /// Any kind this pipeline does not know; decoded, then skipped
    #[serde(other)]
    Unsupported,
}

impl OverlayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayKind::Text => "text",
            OverlayKind::Sticker => "sticker",
            OverlayKind::Image => "image",
            OverlayKind::Video => "video",
            OverlayKind::Unsupported => "unsupported",
        }
    }

    /// Whether this kind renders as drawn text.
    pub fn is_textual(&self) -> bool {
        matches!(self, OverlayKind::Text | OverlayKind::Sticker)
    }

    /// Whether this kind contributes its own transcoder input.
    pub fn needs_input(&self) -> bool {
        matches!(self, OverlayKind::Image | OverlayKind::Video)
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Top-left anchor as a percentage (0-100) of the base video frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    /// Left offset, percent of base width
    pub x: f64,
    /// Top offset, percent of base height
    pub y: f64,
}

/// Target size as a percentage (0-100) of the base video frame.
///
/// For text and sticker overlays only `height` matters (it drives the font
/// scale); `width` is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Visibility window in seconds on the base video timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Timing {
    pub start: f64,
    pub end: f64,
}

/// One timed, positioned compositing element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Overlay {
    /// Opaque id, unique within a job's list; correlates the overlay with
    /// its resolved asset input
    pub id: String,
    #[serde(rename = "type")]
    pub kind: OverlayKind,
    /// Text to draw, or an asset reference / direct path for image and video
    pub content: String,
    pub position: Position,
    pub size: Size,
    pub timing: Timing,
}

/// Ordered overlay list for one render; order is z-order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Metadata {
    pub overlays: Vec<Overlay>,
}
