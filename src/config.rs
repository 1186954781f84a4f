use serde::Deserialize;

/// Shape parameters for pipe curves.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    /// Arc midpoint height as a fraction of the great-circle surface distance.
    pub arc_height_fraction: f64,
    /// Maximum lateral offset as a fraction of the endpoint distance.
    pub offset_fraction: f64,
    /// Number of control points of the resampled curve.
    pub resample_points: usize,
    /// Smoothstep passes used to warp the resampling parameter.
    pub ease_passes: u32,
    /// Floor for chord lengths when assigning knots to explicit paths.
    pub min_knot_spacing: f64,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            arc_height_fraction: 1.0 / 8.0,
            offset_fraction: 1.0 / 50.0,
            resample_points: 129,
            ease_passes: 2,
            min_knot_spacing: 0.01,
        }
    }
}

/// Tolerances for pipe polylines, derived from the curve's endpoint distance.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TessellationConfig {
    pub end_divisor: f64,
    pub mid_divisor: f64,
    pub epsilon: f64,
}

impl TessellationConfig {
    /// `(end_tolerance, mid_tolerance)` for a curve spanning `length`.
    pub fn tolerances(&self, length: f64) -> (f64, f64) {
        (
            length / self.end_divisor + self.epsilon,
            length / self.mid_divisor + self.epsilon,
        )
    }
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            end_divisor: 50_000.0,
            mid_divisor: 1_000.0,
            epsilon: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Degree of the continuous position function between samples.
    pub interpolation_degree: usize,
    /// Smoothstep passes applied to a lone pipe progress value.
    pub ease_passes: u32,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            interpolation_degree: 1,
            ease_passes: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub curve: CurveConfig,
    pub tessellation: TessellationConfig,
    pub trajectory: TrajectoryConfig,
}

impl VisualizerConfig {
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let config = VisualizerConfig::default();
        assert_eq!(config.curve.arc_height_fraction, 0.125);
        assert_eq!(config.curve.offset_fraction, 0.02);
        assert_eq!(config.curve.resample_points, 129);
        assert_eq!(config.curve.ease_passes, 2);
        assert_eq!(config.tessellation.end_divisor, 50_000.0);
        assert_eq!(config.tessellation.mid_divisor, 1_000.0);
        assert_eq!(config.trajectory.interpolation_degree, 1);
    }

    #[test]
    fn tolerances_scale_with_length() {
        let (end, mid) = TessellationConfig::default().tolerances(100_000.0);
        assert!((end - 2.01).abs() < 1e-12);
        assert!((mid - 100.01).abs() < 1e-12);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            VisualizerConfig::from_json_str(r#"{ "curve": { "resample_points": 65 } }"#).unwrap();
        assert_eq!(config.curve.resample_points, 65);
        assert_eq!(config.curve.ease_passes, 2);
        assert_eq!(config.tessellation, TessellationConfig::default());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(VisualizerConfig::from_json_str("{ not json").is_err());
    }
}
