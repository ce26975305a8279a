use logofield::RenderableField;
use thiserror::Error;
use wgpu::util::{DeviceExt, TextureDataOrder};

/// Why a field raster was rejected before reaching the GPU.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("field raster is empty")]
    Empty,
    #[error("field raster is {actual} bytes but {width}x{height} rgba needs {expected}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("field raster {width}x{height} exceeds the device texture limit {limit}")]
    TooLarge { width: u32, height: u32, limit: u32 },
}

/// Checks a raster against the payload contract before any GPU work.
pub(crate) fn validate_field(field: &RenderableField, limit: u32) -> Result<(), TextureError> {
    let width = field.width();
    let height = field.height();
    if width == 0 || height == 0 {
        return Err(TextureError::Empty);
    }
    if width > limit || height > limit {
        return Err(TextureError::TooLarge {
            width,
            height,
            limit,
        });
    }
    let expected = width as usize * height as usize * 4;
    let actual = field.pixels().len();
    if actual != expected {
        return Err(TextureError::SizeMismatch {
            width,
            height,
            expected,
            actual,
        });
    }
    Ok(())
}

/// The extracted field raster resident on the GPU.
///
/// Uploaded as `Rgba8Unorm` so the shader reads the same byte values the
/// extractor produced, with no colour space conversion in between.
pub(crate) struct FieldTexture {
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl FieldTexture {
    pub(crate) fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        field: &RenderableField,
        limit: u32,
    ) -> Result<Self, TextureError> {
        validate_field(field, limit)?;

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("liquid field texture"),
                size: wgpu::Extent3d {
                    width: field.width(),
                    height: field.height(),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            field.pixels(),
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }

    /// Frees the GPU allocation eagerly, ahead of the handle being dropped.
    pub(crate) fn destroy(&self) {
        self.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(width: u32, height: u32, bytes: usize) -> RenderableField {
        RenderableField::from_raw(width, height, vec![0u8; bytes])
    }

    #[test]
    fn well_formed_raster_passes() {
        assert!(validate_field(&raster(8, 4, 8 * 4 * 4), 1024).is_ok());
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let err = validate_field(&raster(8, 4, 8 * 4 * 4 - 1), 1024).unwrap_err();
        assert!(matches!(err, TextureError::SizeMismatch { expected, .. } if expected == 128));
    }

    #[test]
    fn oversized_raster_is_rejected() {
        let err = validate_field(&raster(32, 8, 32 * 8 * 4), 16).unwrap_err();
        assert!(matches!(err, TextureError::TooLarge { limit: 16, .. }));
    }

    #[test]
    fn empty_raster_is_rejected() {
        let err = validate_field(&raster(0, 4, 0), 1024).unwrap_err();
        assert!(matches!(err, TextureError::Empty));
    }
}
