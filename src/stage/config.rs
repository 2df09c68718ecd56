use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::math::Point2;

/// Tuning for a [`StageDriver`](super::StageDriver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Progress units advanced per second of tick time.
    pub time_scale: f64,
    /// Upper bound of the progress timeline.
    pub stage_length: f64,
    /// Distance at which a unit reaches an action node.
    pub trigger_radius: f64,
    /// Target of `TurnToBase` orders.
    pub base_position: Point2,
    /// Samples per Bézier segment when building follower tracks.
    pub bezier_samples: usize,
    /// Speed multiplier applied by `SpeedUp` and divided out by `SpeedDown`.
    pub speed_step: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            stage_length: 10_000.0,
            trigger_radius: 24.0,
            base_position: Point2::origin(),
            bezier_samples: 16,
            speed_step: 2.0,
        }
    }
}

impl StageConfig {
    /// Parses a configuration, filling unspecified fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value is usable by the driver.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("time_scale", self.time_scale, self.time_scale >= 0.0, "must be non-negative")?;
        check("stage_length", self.stage_length, self.stage_length > 0.0, "must be positive")?;
        check(
            "trigger_radius",
            self.trigger_radius,
            self.trigger_radius > 0.0,
            "must be positive",
        )?;
        check("speed_step", self.speed_step, self.speed_step > 0.0, "must be positive")?;
        #[allow(clippy::cast_precision_loss)]
        let samples = self.bezier_samples as f64;
        check("bezier_samples", samples, self.bezier_samples > 0, "must be at least 1")
    }
}

fn check(
    field: &'static str,
    value: f64,
    ok: bool,
    reason: &'static str,
) -> Result<(), ConfigError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            value,
            reason,
        })
    }
}
