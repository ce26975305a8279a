//! GPU orchestration for the liquid-metal canvas.
//!
//! - `context` owns wgpu instance/device/surface wiring and knows how to
//!   rebuild swapchain state when the backing store resizes.
//! - `texture` uploads the extracted field raster and owns its sampler.
//! - `pipeline` compiles the built-in shader pair into the render pipeline
//!   and resolves uniform handles from the parsed module.
//! - `uniforms` mirrors the std140 block on the CPU and writes individual
//!   members straight through the queue.
//! - `state` glues everything together and exposes the `GpuState` API used
//!   by `window`.

mod context;
mod pipeline;
mod state;
mod texture;
mod uniforms;

pub(crate) use state::{FrameOutcome, GpuState};
pub use texture::TextureError;
