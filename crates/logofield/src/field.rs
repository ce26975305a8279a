//! Shading the relaxed field into a renderable raster.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::mask::MaskGrid;
use crate::relax::ScalarField;
use crate::ExtractError;

/// Gamma applied to the normalized field before mapping to grayscale.
pub(crate) const GAMMA: f32 = 2.0;

/// Grayscale RGBA raster ready for texture upload or PNG export. Ink pixels
/// are opaque gray (darkest at the field peak), everything else pure white.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderableField {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RenderableField {
    /// Wraps raw RGBA bytes without validating their length; the texture
    /// upload path performs that check.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Encodes the raster as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>, ExtractError> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(
                &self.pixels,
                self.width,
                self.height,
                ExtendedColorType::Rgba8,
            )
            .map_err(ExtractError::Encode)?;
        Ok(bytes)
    }
}

/// Normalizes the field by its peak, applies the gamma remap and packs the
/// grayscale raster. An all-zero field (empty mask) shades to uniform white
/// rather than dividing by zero.
pub fn shade_field(field: &ScalarField, shape: &MaskGrid) -> RenderableField {
    let peak = field.values().iter().copied().fold(0.0f32, f32::max);
    let scale = if peak > 0.0 { 1.0 / peak } else { 0.0 };

    let width = field.width();
    let height = field.height();
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            if shape.get(i64::from(x), i64::from(y)) {
                let raw = field.get(x, y) * scale;
                let remapped = raw.powf(GAMMA);
                let gray = (255.0 * (1.0 - remapped)).round().clamp(0.0, 255.0) as u8;
                pixels.extend_from_slice(&[gray, gray, gray, 255]);
            } else {
                pixels.extend_from_slice(&[255, 255, 255, 255]);
            }
        }
    }

    RenderableField {
        width,
        height,
        pixels,
    }
}
