use serde::{Deserialize, Serialize};

use crate::viewport::DEFAULT_LOGICAL_SIDE;

/// Tunable inputs for the liquid-metal effect.
///
/// All fields except `speed` map one-to-one onto shader uniforms. `speed`
/// scales the animation clock on the CPU side and never reaches the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectParams {
    /// Stripe cycle width of the chrome banding.
    pub pattern_scale: f32,
    /// Strength of the per-channel refraction offsets.
    pub refraction: f32,
    /// Threshold deciding how much of the dark ink rim survives.
    pub edge: f32,
    /// Base blur applied to every stripe transition.
    pub pattern_blur: f32,
    /// How strongly simplex noise bends the ink edge.
    pub liquid: f32,
    /// Multiplier for the animation clock.
    pub speed: f32,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            pattern_scale: 2.0,
            refraction: 0.015,
            edge: 1.0,
            pattern_blur: 0.005,
            liquid: 0.07,
            speed: 0.3,
        }
    }
}

impl EffectParams {
    /// Quieter preset with slower, wider ripples. Works well for marks
    /// with thin strokes that the default tuning washes out.
    pub fn subtle() -> Self {
        Self {
            pattern_scale: 0.8,
            refraction: 0.01,
            edge: 0.2,
            pattern_blur: 0.04,
            liquid: 0.3,
            speed: 0.15,
        }
    }
}

/// Window settings for a preview session.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub title: String,
    /// Side of the square canvas in logical pixels.
    pub logical_side: u32,
    pub params: EffectParams,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            title: "liquidlogo".to_string(),
            logical_side: DEFAULT_LOGICAL_SIDE,
            params: EffectParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_match_the_effect_tuning() {
        let params = EffectParams::default();
        assert_eq!(params.pattern_scale, 2.0);
        assert_eq!(params.refraction, 0.015);
        assert_eq!(params.edge, 1.0);
        assert_eq!(params.pattern_blur, 0.005);
        assert_eq!(params.liquid, 0.07);
        assert_eq!(params.speed, 0.3);
    }

    #[test]
    fn subtle_preset_is_a_distinct_tuning() {
        assert_ne!(EffectParams::subtle(), EffectParams::default());
    }

    #[test]
    fn preview_config_defaults_to_the_square_canvas() {
        let config = PreviewConfig::default();
        assert_eq!(config.logical_side, DEFAULT_LOGICAL_SIDE);
        assert_eq!(config.params, EffectParams::default());
    }
}
