/// Factor by which frames are shrunk before the search runs. Detection boxes
/// are multiplied back by the same factor on the way out.
pub const DEFAULT_DOWNSCALE: f64 = 1.3;

/// Geometric step between successive search window sizes.
pub const DEFAULT_SCALE_FACTOR: f64 = 1.2;

/// Raw hits a neighborhood needs before it counts as a detection.
pub const DEFAULT_MIN_NEIGHBORS: u32 = 2;

/// Smallest search window edge, in downscaled pixels.
pub const DEFAULT_MIN_SIZE: u32 = 24;

/// Edge-density band for Canny-style pruning: windows whose gradient mass
/// falls outside `[lo, hi]` (as a fraction of the maximum possible) are
/// skipped without evaluating the cascade.
pub const EDGE_DENSITY_LO: f64 = 0.01;
pub const EDGE_DENSITY_HI: f64 = 0.90;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
