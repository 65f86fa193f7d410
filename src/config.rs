use crate::error::{Result, TrackError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/*-----------------------------------------------------------------------------
SmoothingMethod
-----------------------------------------------------------------------------*/

/// How a collapsed smoothing window is reduced to a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingMethod {
    #[default]
    Mean,
    Median,
}

/*-----------------------------------------------------------------------------
ScoreParams
-----------------------------------------------------------------------------*/

/// Weights of the association score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreParams {
    pub norm_area: f64,
    pub area_weight: f64,
    pub distance_weight: f64,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self {
            norm_area: 5.0,
            area_weight: 4.0,
            distance_weight: 1.0,
        }
    }
}

/*-----------------------------------------------------------------------------
TrackerConfig
-----------------------------------------------------------------------------*/

/// Parameters of the whole per-video pipeline.
///
/// Every field has a default, so a JSON file only needs to name the values
/// it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub area_weight: f64,
    pub distance_weight: f64,
    pub norm_area: f64,
    pub gap_threshold_frames: usize,
    pub static_radius_px: f64,
    pub smoothing_window: usize,
    pub smoothing_jitter_px: f64,
    pub smoothing_method: SmoothingMethod,
    pub blur_sigma: f32,
    pub background_bias: f32,
    /// Compute statistics on smoothed tracks instead of raw ones.
    pub stats_on_smoothed: bool,
    /// Truncate blob centroids to whole pixels before association.
    pub integer_centroids: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let score = ScoreParams::default();
        Self {
            area_weight: score.area_weight,
            distance_weight: score.distance_weight,
            norm_area: score.norm_area,
            gap_threshold_frames: 10,
            static_radius_px: 15.0,
            smoothing_window: 10,
            smoothing_jitter_px: 10.0,
            smoothing_method: SmoothingMethod::Mean,
            blur_sigma: 3.0,
            background_bias: 30.0,
            stats_on_smoothed: false,
            integer_centroids: false,
        }
    }
}

impl TrackerConfig {
    /// Set the association score weights.
    ///
    /// # Arguments
    /// * `norm_area` - Expected blob area of the target (default: 5)
    /// * `area_weight` - Weight of the area similarity term (default: 4)
    /// * `distance_weight` - Weight of the distance penalty (default: 1)
    pub fn with_score(
        self,
        norm_area: f64,
        area_weight: f64,
        distance_weight: f64,
    ) -> Self {
        Self {
            norm_area,
            area_weight,
            distance_weight,
            ..self
        }
    }

    pub fn with_gap_threshold(self, gap_threshold_frames: usize) -> Self {
        Self {
            gap_threshold_frames,
            ..self
        }
    }

    pub fn with_static_radius(self, static_radius_px: f64) -> Self {
        Self {
            static_radius_px,
            ..self
        }
    }

    /// Set the smoothing window, its jitter threshold and reduction method.
    pub fn with_smoothing(
        self,
        smoothing_window: usize,
        smoothing_jitter_px: f64,
        smoothing_method: SmoothingMethod,
    ) -> Self {
        Self {
            smoothing_window,
            smoothing_jitter_px,
            smoothing_method,
            ..self
        }
    }

    /// Set the segmentation blur sigma and background bias.
    pub fn with_segmentation(self, blur_sigma: f32, background_bias: f32) -> Self {
        Self {
            blur_sigma,
            background_bias,
            ..self
        }
    }

    pub fn with_stats_on_smoothed(self, stats_on_smoothed: bool) -> Self {
        Self {
            stats_on_smoothed,
            ..self
        }
    }

    pub fn with_integer_centroids(self, integer_centroids: bool) -> Self {
        Self {
            integer_centroids,
            ..self
        }
    }

    pub fn score_params(&self) -> ScoreParams {
        ScoreParams {
            norm_area: self.norm_area,
            area_weight: self.area_weight,
            distance_weight: self.distance_weight,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.blur_sigma > 0.0) {
            return Err(TrackError::InvalidConfig(format!(
                "blur_sigma must be positive, got {}",
                self.blur_sigma
            )));
        }
        if self.smoothing_window == 0 {
            return Err(TrackError::InvalidConfig(
                "smoothing_window must be at least 1".to_string(),
            ));
        }
        if !(self.static_radius_px >= 0.0) {
            return Err(TrackError::InvalidConfig(format!(
                "static_radius_px must not be negative, got {}",
                self.static_radius_px
            )));
        }
        if !(self.smoothing_jitter_px >= 0.0) {
            return Err(TrackError::InvalidConfig(format!(
                "smoothing_jitter_px must not be negative, got {}",
                self.smoothing_jitter_px
            )));
        }
        let weights = [
            ("area_weight", self.area_weight),
            ("distance_weight", self.distance_weight),
            ("norm_area", self.norm_area),
        ];
        for (name, value) in weights {
            if !value.is_finite() {
                return Err(TrackError::InvalidConfig(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }
}
