//! Cascade-based face detector: model lifecycle plus the multi-scale
//! sliding-window search.
//!
//! The search has two modes. Feature-zoom (the default) computes one integral
//! image and scales the classifier's feature rects up to each window size.
//! Image-pyramid mode (`SCALE_IMAGE`) instead shrinks the buffer per scale
//! step and scans with the base window, mapping hits back afterwards.

use std::path::{Path, PathBuf};

use crate::detection::domain::detection_config::{ConfigError, DetectionConfig, DetectionFlags};
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::neighbor_grouper::NeighborGrouper;
use crate::imaging::preprocess;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{EDGE_DENSITY_HI, EDGE_DENSITY_LO};
use crate::shared::frame::Frame;
use crate::shared::gray_buffer::GrayBuffer;

use super::haar_model::{CascadeModel, ModelLoadError, Stage};
use super::integral_image::{gradient_magnitude, IntegralImage};

pub struct CascadeFaceDetector {
    model: Option<CascadeModel>,
    model_path: Option<PathBuf>,
    downscale: f64,
    config: DetectionConfig,
    grouper: NeighborGrouper,
}

impl CascadeFaceDetector {
    /// Starts with no model loaded; `detect` returns empty results until a
    /// successful `load`.
    pub fn new(downscale: f64) -> Self {
        Self {
            model: None,
            model_path: None,
            downscale,
            config: DetectionConfig::default(),
            grouper: NeighborGrouper::new(),
        }
    }

    pub fn from_file(path: &Path, downscale: f64) -> Result<Self, ModelLoadError> {
        let mut detector = Self::new(downscale);
        detector.load(path)?;
        Ok(detector)
    }

    /// Replaces any loaded model, releasing the old one before touching the
    /// file. On failure the detector is left explicitly unloaded rather than
    /// keeping a model the caller believes was replaced.
    pub fn load(&mut self, path: &Path) -> Result<(), ModelLoadError> {
        self.model = None;
        self.model_path = None;

        let model = CascadeModel::load(path)?;
        log::info!(
            "loaded cascade model {} ({} stages, {}x{} base window)",
            path.display(),
            model.stages.len(),
            model.window_width,
            model.window_height
        );
        self.model = Some(model);
        self.model_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Path of the last successfully loaded model.
    pub fn current_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn downscale(&self) -> f64 {
        self.downscale
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Swaps the configuration used by subsequent `detect` calls.
    pub fn set_config(&mut self, config: DetectionConfig) {
        self.config = config;
    }

    /// Runs the multi-scale search over a preprocessed buffer, returning
    /// grouped detections in the buffer's own coordinate space.
    ///
    /// The configuration is validated before any search work; with no model
    /// loaded the result is an empty set, not an error.
    pub fn detect_on_gray(
        &self,
        gray: &GrayBuffer,
        config: &DetectionConfig,
    ) -> Result<Vec<BoundingBox>, ConfigError> {
        config.validate()?;
        let Some(model) = self.model.as_ref() else {
            return Ok(Vec::new());
        };

        let raw = if config.flags.contains(DetectionFlags::SCALE_IMAGE) {
            scan_pyramid(model, gray, config, &self.grouper)
        } else {
            scan_feature_zoom(model, gray, config, &self.grouper)
        };

        let mut grouped = self.grouper.group(&raw, config.min_neighbors);
        if config.flags.contains(DetectionFlags::BIGGEST_OBJECT_ONLY) {
            grouped = grouped
                .into_iter()
                .max_by_key(|b| b.area())
                .into_iter()
                .collect();
        }
        Ok(grouped)
    }
}

impl FaceDetector for CascadeFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        let gray = preprocess::preprocess(frame, self.downscale);
        let boxes = self.detect_on_gray(&gray, &self.config)?;
        log::debug!(
            "frame {}: {} detection(s) in {}x{} search buffer",
            frame.index(),
            boxes.len(),
            gray.width(),
            gray.height()
        );
        Ok(boxes.iter().map(|b| b.scaled(self.downscale)).collect())
    }
}

/// First window scale and the largest window extents the search may use.
fn scale_limits(
    model: &CascadeModel,
    gray: &GrayBuffer,
    config: &DetectionConfig,
) -> (f64, u32, u32) {
    let limit_w = config
        .max_size
        .map_or(gray.width(), |m| m.0.min(gray.width()));
    let limit_h = config
        .max_size
        .map_or(gray.height(), |m| m.1.min(gray.height()));
    // Windows never shrink below the classifier's base resolution
    let start = (config.min_size.0 as f64 / model.window_width as f64)
        .max(config.min_size.1 as f64 / model.window_height as f64)
        .max(1.0);
    (start, limit_w, limit_h)
}

fn scan_feature_zoom(
    model: &CascadeModel,
    gray: &GrayBuffer,
    config: &DetectionConfig,
    grouper: &NeighborGrouper,
) -> Vec<BoundingBox> {
    let integral = IntegralImage::of(gray);
    let edges = config
        .flags
        .contains(DetectionFlags::CANNY_PRUNING)
        .then(|| {
            IntegralImage::from_pixels(&gradient_magnitude(gray), gray.width(), gray.height())
        });
    let rough = config.flags.contains(DetectionFlags::ROUGH_SEARCH);
    let (mut scale, limit_w, limit_h) = scale_limits(model, gray, config);

    let mut raw: Vec<BoundingBox> = Vec::new();
    loop {
        let win_w = (model.window_width as f64 * scale).round() as u32;
        let win_h = (model.window_height as f64 * scale).round() as u32;
        if win_w > limit_w || win_h > limit_h {
            break;
        }

        let step = ((scale / 2.0).round() as u32).max(1);
        let mut y = 0;
        while y + win_h <= gray.height() {
            let mut x = 0;
            while x + win_w <= gray.width() {
                if edge_density_ok(edges.as_ref(), x, y, win_w, win_h)
                    && evaluate_window(model, &integral, x, y, win_w, win_h, scale)
                {
                    raw.push(BoundingBox::new(x, y, win_w, win_h));
                }
                x += step;
            }
            y += step;
        }

        if rough && !grouper.group(&raw, config.min_neighbors).is_empty() {
            break;
        }
        scale *= config.scale_factor;
    }
    raw
}

fn scan_pyramid(
    model: &CascadeModel,
    gray: &GrayBuffer,
    config: &DetectionConfig,
    grouper: &NeighborGrouper,
) -> Vec<BoundingBox> {
    let rough = config.flags.contains(DetectionFlags::ROUGH_SEARCH);
    let (mut scale, limit_w, limit_h) = scale_limits(model, gray, config);
    let base_w = model.window_width;
    let base_h = model.window_height;

    let mut raw: Vec<BoundingBox> = Vec::new();
    loop {
        let win_w = (base_w as f64 * scale).round() as u32;
        let win_h = (base_h as f64 * scale).round() as u32;
        if win_w > limit_w || win_h > limit_h {
            break;
        }

        let level = preprocess::downscale(gray, scale);
        if level.width() < base_w || level.height() < base_h {
            break;
        }
        let integral = IntegralImage::of(&level);
        let edges = config
            .flags
            .contains(DetectionFlags::CANNY_PRUNING)
            .then(|| {
                IntegralImage::from_pixels(&gradient_magnitude(&level), level.width(), level.height())
            });

        for y in 0..=level.height() - base_h {
            for x in 0..=level.width() - base_w {
                if edge_density_ok(edges.as_ref(), x, y, base_w, base_h)
                    && evaluate_window(model, &integral, x, y, base_w, base_h, 1.0)
                {
                    raw.push(BoundingBox::new(
                        (x as f64 * scale).round() as u32,
                        (y as f64 * scale).round() as u32,
                        win_w,
                        win_h,
                    ));
                }
            }
        }

        if rough && !grouper.group(&raw, config.min_neighbors).is_empty() {
            break;
        }
        scale *= config.scale_factor;
    }
    raw
}

/// Edge-based pruning: windows whose gradient mass is implausibly flat or
/// busy cannot contain the target and skip cascade evaluation.
fn edge_density_ok(edges: Option<&IntegralImage>, x: u32, y: u32, w: u32, h: u32) -> bool {
    let Some(integral) = edges else {
        return true;
    };
    let density = integral.rect_sum(x, y, w, h) as f64 / (w as u64 * h as u64) as f64 / 255.0;
    (EDGE_DENSITY_LO..=EDGE_DENSITY_HI).contains(&density)
}

/// A window survives only if every stage accepts it.
fn evaluate_window(
    model: &CascadeModel,
    integral: &IntegralImage,
    ox: u32,
    oy: u32,
    win_w: u32,
    win_h: u32,
    scale: f64,
) -> bool {
    model
        .stages
        .iter()
        .all(|stage| evaluate_stage(stage, integral, ox, oy, win_w, win_h, scale))
}

fn evaluate_stage(
    stage: &Stage,
    integral: &IntegralImage,
    ox: u32,
    oy: u32,
    win_w: u32,
    win_h: u32,
    scale: f64,
) -> bool {
    let mut sum = 0.0;
    for stump in &stage.trees {
        let mut value = 0.0;
        for r in &stump.feature.rects {
            // Zoom the rect to the window, clamped so rounding never reads
            // past the window's right/bottom edge.
            let rel_x = ((r.x as f64 * scale).round() as u32).min(win_w - 1);
            let rel_y = ((r.y as f64 * scale).round() as u32).min(win_h - 1);
            let rw = ((r.width as f64 * scale).round() as u32)
                .clamp(1, win_w - rel_x);
            let rh = ((r.height as f64 * scale).round() as u32)
                .clamp(1, win_h - rel_y);
            value += r.weight * integral.rect_mean(ox + rel_x, oy + rel_y, rw, rh);
        }
        sum += if value < stump.threshold {
            stump.left_value
        } else {
            stump.right_value
        };
    }
    sum >= stage.threshold
}
