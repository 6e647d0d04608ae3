use serde::Serialize;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::palette::Rgb;

/// One localized face: its frame-space box and the overlay color it was
/// drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub color: Rgb,
}

/// Detections for one frame, in the order the search discovered them.
/// Stable for a fixed input within one call; no spatial ordering implied.
pub type DetectionResult = Vec<Detection>;
