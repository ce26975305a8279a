//! Logo to liquid-metal field extraction.
//!
//! Turns a logo image into the grayscale "thickness" raster the renderer
//! maps chrome onto:
//!
//! ```text
//! bytes ──decode──► RGBA canvas ──masks──► shape / boundary
//!                                             │
//!                                           relax (Jacobi)
//!                                             │
//!                      RenderableField ◄──shade── ScalarField
//! ```
//!
//! The stages are deterministic and CPU-only. [`extract`] wires them
//! together; [`FieldCache`] remembers recent results keyed by file identity.

mod cache;
mod field;
mod mask;
mod relax;
mod source;

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

pub use cache::{FieldCache, FieldKey, DEFAULT_CAPACITY};
pub use field::{shade_field, RenderableField};
pub use mask::{boundary_mask, shape_mask, MaskGrid};
pub use relax::{relax, ScalarField, RELAX_ITERATIONS, SOURCE_TERM};
pub use source::{ImageKind, SourceImage, MAX_SIDE, MIN_SIDE};

/// Failures while turning logo bytes into a renderable field.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
    #[error("failed to decode raster image: {0}")]
    Raster(#[from] image::ImageError),
    #[error("failed to parse vector image: {0}")]
    Vector(#[from] resvg::usvg::Error),
    #[error("failed to encode field raster: {0}")]
    Encode(#[source] image::ImageError),
}

/// Everything one extraction produces: the raw scalar field and the shaded
/// raster derived from it.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub field: ScalarField,
    pub raster: RenderableField,
}

/// Runs the full pipeline: decode, fit, mask, relax, shade.
pub fn extract(source: &SourceImage) -> Result<Extraction, ExtractError> {
    let started = Instant::now();
    let canvas = source::prepare_canvas(source)?;
    debug!(
        width = canvas.width(),
        height = canvas.height(),
        "prepared working canvas"
    );

    let shape = mask::shape_mask(&canvas);
    let boundary = mask::boundary_mask(&shape);
    let field = relax::relax(&shape, &boundary);
    let raster = field::shade_field(&field, &shape);

    info!(
        name = %source.name,
        width = raster.width(),
        height = raster.height(),
        ink = shape.count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "extracted liquid-metal field"
    );
    Ok(Extraction { field, raster })
}
