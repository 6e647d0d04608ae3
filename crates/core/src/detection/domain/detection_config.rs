use thiserror::Error;

use crate::shared::constants::{DEFAULT_MIN_NEIGHBORS, DEFAULT_MIN_SIZE, DEFAULT_SCALE_FACTOR};

/// Search-mode flag word.
///
/// `SCALE_IMAGE` switches the detector from zooming classifier features to
/// downscaling the image itself, and cannot be combined with any other flag.
/// `ROUGH_SEARCH` only makes sense when a single biggest object is wanted
/// and neighborhood filtering is on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetectionFlags(u8);

impl DetectionFlags {
    pub const SCALE_IMAGE: DetectionFlags = DetectionFlags(0b0001);
    pub const CANNY_PRUNING: DetectionFlags = DetectionFlags(0b0010);
    pub const BIGGEST_OBJECT_ONLY: DetectionFlags = DetectionFlags(0b0100);
    pub const ROUGH_SEARCH: DetectionFlags = DetectionFlags(0b1000);

    pub const fn empty() -> Self {
        DetectionFlags(0)
    }

    pub const fn contains(self, other: DetectionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn union(self, other: DetectionFlags) -> Self {
        DetectionFlags(self.0 | other.0)
    }
}

impl std::ops::BitOr for DetectionFlags {
    type Output = DetectionFlags;

    fn bitor(self, rhs: DetectionFlags) -> DetectionFlags {
        self.union(rhs)
    }
}

/// Tunable parameters for one detection call.
///
/// Immutable while a call is in flight; callers may swap in a new value
/// between calls. Sizes are edges in downscaled-buffer pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionConfig {
    /// Geometric step between successive window sizes; must exceed 1.0.
    pub scale_factor: f64,
    /// Raw hits a neighborhood needs to survive; 0 keeps every raw window.
    pub min_neighbors: u32,
    pub flags: DetectionFlags,
    /// Smallest window extent `(width, height)` searched.
    pub min_size: (u32, u32),
    /// Largest window extent searched; `None` means the buffer bounds.
    pub max_size: Option<(u32, u32)>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            flags: DetectionFlags::empty(),
            min_size: (DEFAULT_MIN_SIZE, DEFAULT_MIN_SIZE),
            max_size: None,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("scale_image cannot be combined with other detection flags")]
    ExclusiveScaleImage,
    #[error("rough_search requires biggest_object_only")]
    RoughSearchRequiresBiggestObject,
    #[error("rough_search requires min_neighbors > 0")]
    RoughSearchRequiresNeighbors,
    #[error("min_size {min:?} exceeds max_size {max:?}")]
    MinSizeExceedsMaxSize { min: (u32, u32), max: (u32, u32) },
    #[error("scale_factor must be greater than 1.0, got {0}")]
    InvalidScaleFactor(f64),
}

impl DetectionConfig {
    /// Rejects inconsistent configurations before any search work begins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scale_factor <= 1.0 {
            return Err(ConfigError::InvalidScaleFactor(self.scale_factor));
        }
        if self.flags.contains(DetectionFlags::SCALE_IMAGE)
            && self.flags != DetectionFlags::SCALE_IMAGE
        {
            return Err(ConfigError::ExclusiveScaleImage);
        }
        if self.flags.contains(DetectionFlags::ROUGH_SEARCH) {
            if !self.flags.contains(DetectionFlags::BIGGEST_OBJECT_ONLY) {
                return Err(ConfigError::RoughSearchRequiresBiggestObject);
            }
            if self.min_neighbors == 0 {
                return Err(ConfigError::RoughSearchRequiresNeighbors);
            }
        }
        if let Some(max) = self.max_size {
            if self.min_size.0 > max.0 || self.min_size.1 > max.1 {
                return Err(ConfigError::MinSizeExceedsMaxSize {
                    min: self.min_size,
                    max,
                });
            }
        }
        Ok(())
    }
}
