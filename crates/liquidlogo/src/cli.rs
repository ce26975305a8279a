use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use renderer::{EffectParams, DEFAULT_LOGICAL_SIDE};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(
    name = "liquidlogo",
    author,
    version,
    about = "Animated liquid-metal rendering for logo images",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Logo image to render (PNG, JPEG, GIF, BMP, or SVG).
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Starting parameter preset.
    #[arg(long, value_enum, value_name = "PRESET", default_value_t = Preset::Default)]
    pub preset: Preset,

    /// TOML file with effect parameter overrides.
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Pattern repeat density across the canvas.
    #[arg(long, value_name = "VALUE")]
    pub pattern_scale: Option<f32>,

    /// Strength of the chromatic refraction offsets.
    #[arg(long, value_name = "VALUE")]
    pub refraction: Option<f32>,

    /// Width of the bright edge highlight.
    #[arg(long, value_name = "VALUE")]
    pub edge: Option<f32>,

    /// Softening applied to the stripe pattern.
    #[arg(long, value_name = "VALUE")]
    pub pattern_blur: Option<f32>,

    /// Amount of animated surface wobble.
    #[arg(long, value_name = "VALUE")]
    pub liquid: Option<f32>,

    /// Animation speed multiplier.
    #[arg(long, value_name = "VALUE")]
    pub speed: Option<f32>,

    /// Logical window side in pixels.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_LOGICAL_SIDE)]
    pub side: u32,

    /// Write the processed field raster to PATH as a PNG and exit.
    #[arg(long, value_name = "PATH")]
    pub export_field: Option<PathBuf>,

    /// Window title.
    #[arg(long, value_name = "STR", default_value = "liquidlogo")]
    pub title: String,
}

impl Cli {
    /// Collects the individual parameter flags into one overlay.
    pub fn flag_overrides(&self) -> ParamOverrides {
        ParamOverrides {
            pattern_scale: self.pattern_scale,
            refraction: self.refraction,
            edge: self.edge,
            pattern_blur: self.pattern_blur,
            liquid: self.liquid,
            speed: self.speed,
        }
    }
}

/// Named starting points for the effect tuning.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Original effect defaults.
    Default,
    /// Quieter tuning suited to small marks.
    Subtle,
}

impl Preset {
    pub fn params(self) -> EffectParams {
        match self {
            Preset::Default => EffectParams::default(),
            Preset::Subtle => EffectParams::subtle(),
        }
    }
}

/// Partial parameter set layered over a preset. The TOML params file and the
/// individual CLI flags both deserialize into this shape.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamOverrides {
    pub pattern_scale: Option<f32>,
    pub refraction: Option<f32>,
    pub edge: Option<f32>,
    pub pattern_blur: Option<f32>,
    pub liquid: Option<f32>,
    pub speed: Option<f32>,
}

/// Resolves the effective parameters. The preset supplies every value, the
/// params file overrides it, and individual flags override both.
pub fn resolve_params(preset: Preset, file: ParamOverrides, flags: ParamOverrides) -> EffectParams {
    let base = preset.params();
    EffectParams {
        pattern_scale: flags
            .pattern_scale
            .or(file.pattern_scale)
            .unwrap_or(base.pattern_scale),
        refraction: flags
            .refraction
            .or(file.refraction)
            .unwrap_or(base.refraction),
        edge: flags.edge.or(file.edge).unwrap_or(base.edge),
        pattern_blur: flags
            .pattern_blur
            .or(file.pattern_blur)
            .unwrap_or(base.pattern_blur),
        liquid: flags.liquid.or(file.liquid).unwrap_or(base.liquid),
        speed: flags.speed.or(file.speed).unwrap_or(base.speed),
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("parse")
    }

    #[test]
    fn defaults_open_the_standard_preview() {
        let cli = parse(&["liquidlogo", "logo.png"]);
        assert_eq!(cli.preset, Preset::Default);
        assert_eq!(cli.side, 1000);
        assert_eq!(cli.title, "liquidlogo");
        assert!(cli.export_field.is_none());
        assert_eq!(cli.flag_overrides(), ParamOverrides::default());
    }

    #[test]
    fn parses_preset_and_flag_overrides() {
        let cli = parse(&[
            "liquidlogo",
            "mark.svg",
            "--preset",
            "subtle",
            "--speed",
            "0.5",
            "--side",
            "640",
        ]);
        assert_eq!(cli.preset, Preset::Subtle);
        assert_eq!(cli.flag_overrides().speed, Some(0.5));
        assert_eq!(cli.side, 640);
    }

    #[test]
    fn flags_win_over_file_and_preset() {
        let file = ParamOverrides {
            speed: Some(0.9),
            edge: Some(0.5),
            ..Default::default()
        };
        let flags = ParamOverrides {
            speed: Some(1.2),
            ..Default::default()
        };
        let params = resolve_params(Preset::Subtle, file, flags);
        assert_eq!(params.speed, 1.2);
        assert_eq!(params.edge, 0.5);
        assert_eq!(params.liquid, 0.3);
    }

    #[test]
    fn overrides_reject_unknown_keys() {
        let err = toml::from_str::<ParamOverrides>("sped = 0.5").unwrap_err();
        assert!(err.to_string().contains("sped"));
    }
}
