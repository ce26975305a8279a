//! Logo source decoding and working-canvas sizing.
//!
//! Raster bytes go through the `image` crate; vector bytes are rasterized
//! with `resvg` onto a fixed square canvas. Either way the decoded RGBA
//! canvas is resampled so its longer side lands inside
//! [`MIN_SIDE`]..=[`MAX_SIDE`] before any field math runs.

use std::fs;
use std::path::Path;

use image::imageops::FilterType;
use image::RgbaImage;
use resvg::{tiny_skia, usvg};

use crate::ExtractError;

/// Smallest side the working canvas is allowed to have.
pub const MIN_SIDE: u32 = 500;

/// Largest side the working canvas is allowed to have.
pub const MAX_SIDE: u32 = 1000;

/// Vector sources are rasterized onto this square canvas, both axes
/// stretched independently.
pub(crate) const VECTOR_SIDE: u32 = 1000;

/// How the undecoded bytes of a [`SourceImage`] should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Raster,
    Vector,
}

impl ImageKind {
    /// Maps a declared MIME type onto a decode path. Only `image/svg+xml`
    /// selects the vector path; everything else is treated as raster data
    /// and handed to the image decoder.
    pub fn from_mime(mime: &str) -> Self {
        if mime.trim().eq_ignore_ascii_case("image/svg+xml") {
            ImageKind::Vector
        } else {
            ImageKind::Raster
        }
    }

    fn from_extension(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => ImageKind::Vector,
            _ => ImageKind::Raster,
        }
    }
}

/// An undecoded logo image plus the metadata needed to decode it.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub name: String,
    pub kind: ImageKind,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, kind: ImageKind, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind,
            bytes,
        }
    }

    /// Reads a logo from disk, deriving the name from the file name and the
    /// decode path from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|err| ExtractError::InvalidInput {
            reason: format!("failed to read {}: {err}", path.display()),
        })?;
        if bytes.is_empty() {
            return Err(ExtractError::InvalidInput {
                reason: format!("{} is empty", path.display()),
            });
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            kind: ImageKind::from_extension(path),
            bytes,
        })
    }
}

/// Decodes the source and resamples it onto the working canvas.
pub(crate) fn prepare_canvas(source: &SourceImage) -> Result<RgbaImage, ExtractError> {
    if source.bytes.is_empty() {
        return Err(ExtractError::InvalidInput {
            reason: format!("source {} carries no bytes", source.name),
        });
    }

    let decoded = match source.kind {
        ImageKind::Raster => decode_raster(&source.bytes)?,
        ImageKind::Vector => rasterize_vector(&source.bytes)?,
    };

    let (width, height) = fit_dimensions(decoded.width(), decoded.height());
    if (width, height) == decoded.dimensions() {
        return Ok(decoded);
    }
    Ok(image::imageops::resize(
        &decoded,
        width,
        height,
        FilterType::Triangle,
    ))
}

fn decode_raster(bytes: &[u8]) -> Result<RgbaImage, ExtractError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

fn rasterize_vector(bytes: &[u8]) -> Result<RgbaImage, ExtractError> {
    let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())?;
    let mut pixmap = tiny_skia::Pixmap::new(VECTOR_SIDE, VECTOR_SIDE).ok_or_else(|| {
        ExtractError::InvalidInput {
            reason: "failed to allocate vector canvas".to_owned(),
        }
    })?;

    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        VECTOR_SIDE as f32 / size.width(),
        VECTOR_SIDE as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    // Pixmap stores premultiplied RGBA; the mask predicates expect straight
    // alpha, so demultiply while copying out.
    let mut canvas = RgbaImage::new(VECTOR_SIDE, VECTOR_SIDE);
    for (src, dst) in pixmap.pixels().iter().zip(canvas.pixels_mut()) {
        let straight = src.demultiply();
        *dst = image::Rgba([
            straight.red(),
            straight.green(),
            straight.blue(),
            straight.alpha(),
        ]);
    }
    Ok(canvas)
}

/// Clamps the driving side into `[MIN_SIDE, MAX_SIDE]`, scaling the other
/// side to preserve aspect ratio. Square inputs take the height branch; the
/// scaled side never rounds below one pixel.
pub(crate) fn fit_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width > height {
        if width > MAX_SIDE {
            (MAX_SIDE, rescale(height, MAX_SIDE, width))
        } else if width < MIN_SIDE {
            (MIN_SIDE, rescale(height, MIN_SIDE, width))
        } else {
            (width, height)
        }
    } else if height > MAX_SIDE {
        (rescale(width, MAX_SIDE, height), MAX_SIDE)
    } else if height < MIN_SIDE {
        (rescale(width, MIN_SIDE, height), MIN_SIDE)
    } else {
        (width, height)
    }
}

fn rescale(side: u32, target: u32, driving: u32) -> u32 {
    ((side as f64 * target as f64 / driving as f64).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn mime_selects_decode_path() {
        assert_eq!(ImageKind::from_mime("image/svg+xml"), ImageKind::Vector);
        assert_eq!(ImageKind::from_mime("IMAGE/SVG+XML"), ImageKind::Vector);
        assert_eq!(ImageKind::from_mime("image/png"), ImageKind::Raster);
        assert_eq!(ImageKind::from_mime("application/octet-stream"), ImageKind::Raster);
    }

    #[test]
    fn in_range_dimensions_pass_through() {
        assert_eq!(fit_dimensions(500, 500), (500, 500));
        assert_eq!(fit_dimensions(1000, 640), (1000, 640));
        assert_eq!(fit_dimensions(731, 999), (731, 999));
    }

    #[test]
    fn oversized_input_scales_down_to_max() {
        assert_eq!(fit_dimensions(2000, 1000), (1000, 500));
        assert_eq!(fit_dimensions(3000, 600), (1000, 200));
        assert_eq!(fit_dimensions(250, 1200), (208, 1000));
    }

    #[test]
    fn undersized_input_scales_up_to_min() {
        assert_eq!(fit_dimensions(100, 100), (500, 500));
        assert_eq!(fit_dimensions(64, 64), (500, 500));
        assert_eq!(fit_dimensions(499, 200), (500, 200));
        assert_eq!(fit_dimensions(120, 480), (125, 500));
    }

    #[test]
    fn square_input_takes_height_branch() {
        // Width and height tie; the rule drives by height, scaling width.
        assert_eq!(fit_dimensions(1500, 1500), (1000, 1000));
    }

    #[test]
    fn fitted_longer_side_always_lands_in_range() {
        for (w, h) in [(1, 1), (20, 3000), (4999, 17), (800, 800), (501, 2)] {
            let (fw, fh) = fit_dimensions(w, h);
            let longer = fw.max(fh);
            assert!((MIN_SIDE..=MAX_SIDE).contains(&longer), "{w}x{h} -> {fw}x{fh}");
            assert!(fw >= 1 && fh >= 1);
        }
    }

    #[test]
    fn empty_file_is_invalid_input() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.flush().expect("flush");
        let err = SourceImage::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidInput { .. }));
    }

    #[test]
    fn garbage_raster_bytes_fail_decode() {
        let source = SourceImage::new("junk.png", ImageKind::Raster, vec![0xde, 0xad, 0xbe, 0xef]);
        let err = prepare_canvas(&source).unwrap_err();
        assert!(matches!(err, ExtractError::Raster(_)));
    }

    #[test]
    fn garbage_vector_bytes_fail_parse() {
        let source = SourceImage::new("junk.svg", ImageKind::Vector, b"<not-svg".to_vec());
        let err = prepare_canvas(&source).unwrap_err();
        assert!(matches!(err, ExtractError::Vector(_)));
    }

    #[test]
    fn vector_source_lands_on_square_canvas() {
        let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20">
            <rect x="0" y="0" width="40" height="20" fill="#102030"/>
        </svg>"##;
        let source = SourceImage::new("bar.svg", ImageKind::Vector, svg.to_vec());
        let canvas = prepare_canvas(&source).expect("rasterize");
        // Stretched onto the fixed square, which is already in range.
        assert_eq!(canvas.dimensions(), (VECTOR_SIDE, VECTOR_SIDE));
        let center = canvas.get_pixel(VECTOR_SIDE / 2, VECTOR_SIDE / 2);
        assert_eq!(center.0, [0x10, 0x20, 0x30, 255]);
    }
}
