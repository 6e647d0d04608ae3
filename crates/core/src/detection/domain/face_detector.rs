use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for face localization.
///
/// Boxes come back in the frame's own coordinate space. Implementations may
/// hold reusable state (a loaded model, scratch buffers), hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>>;
}
