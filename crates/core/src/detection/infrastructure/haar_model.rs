use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("failed to read cascade file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cascade file {path} is not a valid classifier description: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid cascade description: {0}")]
    Invalid(String),
}

/// One weighted rectangle of a Haar-like feature, in base-window coordinates.
#[derive(Clone, Debug, Deserialize)]
pub struct FeatureRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub weight: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Feature {
    pub rects: Vec<FeatureRect>,
}

/// A single-split decision stump: the feature value (sum of weighted rect
/// means) is compared against `threshold`, emitting `left_value` below it
/// and `right_value` at or above it.
#[derive(Clone, Debug, Deserialize)]
pub struct Stump {
    pub feature: Feature,
    pub threshold: f64,
    pub left_value: f64,
    pub right_value: f64,
}

/// One boosted stage: the stump outputs are summed and the window survives
/// the stage only if the sum reaches `threshold`.
#[derive(Clone, Debug, Deserialize)]
pub struct Stage {
    pub threshold: f64,
    pub trees: Vec<Stump>,
}

/// A loaded cascade classifier description. Immutable after load.
///
/// Features are expressed on a `window_width` x `window_height` base window
/// and zoomed to each search scale at evaluation time. Because stumps compare
/// rect means, thresholds carry across scales unchanged.
#[derive(Clone, Debug, Deserialize)]
pub struct CascadeModel {
    pub window_width: u32,
    pub window_height: u32,
    pub stages: Vec<Stage>,
}

impl CascadeModel {
    /// Reads and validates a JSON cascade description.
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let file = File::open(path).map_err(|e| ModelLoadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let model: CascadeModel =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| ModelLoadError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelLoadError> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ModelLoadError::Invalid(
                "base window must have positive extents".into(),
            ));
        }
        if self.stages.is_empty() {
            return Err(ModelLoadError::Invalid("cascade has no stages".into()));
        }
        for (si, stage) in self.stages.iter().enumerate() {
            if stage.trees.is_empty() {
                return Err(ModelLoadError::Invalid(format!("stage {si} has no trees")));
            }
            for stump in &stage.trees {
                if stump.feature.rects.is_empty() {
                    return Err(ModelLoadError::Invalid(format!(
                        "stage {si} contains a feature with no rects"
                    )));
                }
                for r in &stump.feature.rects {
                    if r.width == 0
                        || r.height == 0
                        || r.x + r.width > self.window_width
                        || r.y + r.height > self.window_height
                    {
                        return Err(ModelLoadError::Invalid(format!(
                            "stage {si} feature rect ({}, {}, {}, {}) exceeds the {}x{} base window",
                            r.x, r.y, r.width, r.height, self.window_width, self.window_height
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
