/// Default closeness factor for the neighborhood predicate, matching the
/// classic rectangle-grouping tolerance.
pub const DEFAULT_GROUP_EPS: f64 = 0.2;

/// An axis-aligned detection box in pixel coordinates.
///
/// Coordinates are non-negative; `width`/`height` are positive for any box
/// the detector emits. The same type serves both the downscaled search space
/// and original-frame space; `scaled` maps between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Maps the box between coordinate spaces by multiplying each of x, y,
    /// width and height by `factor` and rounding to the nearest pixel,
    /// independently per coordinate.
    ///
    /// Every box leaving the detector passes through this with the
    /// preprocessor's downscale factor; skipping it would shrink and
    /// mis-position every detection by that factor.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            x: (self.x as f64 * factor).round() as u32,
            y: (self.y as f64 * factor).round() as u32,
            width: (self.width as f64 * factor).round() as u32,
            height: (self.height as f64 * factor).round() as u32,
        }
    }

    /// Neighborhood predicate for grouping raw cascade hits: true when the
    /// two boxes differ in every coordinate by at most
    /// `eps * 0.5 * (min(widths) + min(heights))`.
    pub fn similar_to(&self, other: &Self, eps: f64) -> bool {
        let delta = eps
            * 0.5
            * (self.width.min(other.width) as f64 + self.height.min(other.height) as f64);
        (self.x.abs_diff(other.x) as f64) <= delta
            && (self.y.abs_diff(other.y) as f64) <= delta
            && (self.width.abs_diff(other.width) as f64) <= delta
            && (self.height.abs_diff(other.height) as f64) <= delta
    }
}
