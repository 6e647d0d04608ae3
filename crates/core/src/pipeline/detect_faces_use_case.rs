use std::time::Instant;

use crate::detection::domain::face_detector::FaceDetector;
use crate::imaging::annotate;
use crate::pipeline::detection_result::{Detection, DetectionResult};
use crate::shared::frame::Frame;
use crate::shared::palette::color_for;

/// Runs one frame through detect → color assignment → overlay.
///
/// The frame is annotated in place; the returned result carries the same
/// boxes with their palette colors, in discovery order.
pub struct DetectFacesUseCase {
    detector: Box<dyn FaceDetector>,
}

impl DetectFacesUseCase {
    pub fn new(detector: Box<dyn FaceDetector>) -> Self {
        Self { detector }
    }

    pub fn execute(
        &mut self,
        frame: &mut Frame,
    ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let started = Instant::now();
        let boxes = self.detector.detect(frame)?;

        let result: DetectionResult = boxes
            .iter()
            .enumerate()
            .map(|(index, &bbox)| Detection {
                bbox,
                color: color_for(index),
            })
            .collect();

        annotate::annotate(frame, &boxes);

        log::debug!(
            "frame {}: {} face(s), detect+annotate took {:.1}ms",
            frame.index(),
            result.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::palette::PALETTE;

    struct StubDetector {
        boxes: Vec<BoundingBox>,
    }

    impl FaceDetector for StubDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            Ok(self.boxes.clone())
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            Err("detector broke".into())
        }
    }

    fn blank_frame(w: u32, h: u32) -> Frame {
        Frame::new(vec![0u8; (w * h * 3) as usize], w, h, 3, 0)
    }

    #[test]
    fn test_result_pairs_boxes_with_cycled_colors() {
        let boxes: Vec<BoundingBox> = (0..10)
            .map(|i| BoundingBox::new(i * 12, 5, 10, 10))
            .collect();
        let mut use_case = DetectFacesUseCase::new(Box::new(StubDetector {
            boxes: boxes.clone(),
        }));

        let mut frame = blank_frame(200, 60);
        let result = use_case.execute(&mut frame).unwrap();

        assert_eq!(result.len(), 10);
        for (i, detection) in result.iter().enumerate() {
            assert_eq!(detection.bbox, boxes[i]);
            assert_eq!(detection.color, PALETTE[i % 8]);
        }
        // Index 0 and index 8 share a palette slot
        assert_eq!(result[0].color, result[8].color);
    }

    #[test]
    fn test_frame_annotated_in_place() {
        let mut use_case = DetectFacesUseCase::new(Box::new(StubDetector {
            boxes: vec![BoundingBox::new(10, 10, 20, 20)],
        }));

        let mut frame = blank_frame(50, 50);
        use_case.execute(&mut frame).unwrap();

        // Outline corner takes the first palette color
        assert_eq!(
            frame.pixel(10, 10),
            &[PALETTE[0].0, PALETTE[0].1, PALETTE[0].2]
        );
        // Interior untouched
        assert_eq!(frame.pixel(20, 20), &[0, 0, 0]);
    }

    #[test]
    fn test_zero_detections_leaves_frame_untouched() {
        let mut use_case = DetectFacesUseCase::new(Box::new(StubDetector { boxes: vec![] }));
        let mut frame = blank_frame(30, 30);
        let before = frame.data().to_vec();

        let result = use_case.execute(&mut frame).unwrap();
        assert!(result.is_empty());
        assert_eq!(frame.data(), &before[..]);
    }

    #[test]
    fn test_detector_error_propagates() {
        let mut use_case = DetectFacesUseCase::new(Box::new(FailingDetector));
        let mut frame = blank_frame(30, 30);
        assert!(use_case.execute(&mut frame).is_err());
    }
}
