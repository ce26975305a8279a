//! Renderer crate for liquidlogo.
//!
//! The crate glues the preview window, the `wgpu` pipeline, and the liquid
//! metal shader pair together. The overall flow is:
//!
//! ```text
//!   CLI / liquidlogo
//!          │ PreviewConfig + RenderableField
//!          ▼
//!   PreviewRuntime::spawn ──▶ winit event loop ──▶ render_frame()
//!          ▲                            │
//!          │ update_params /            └─▶ FrameClock gate ─▶ GPU UBO
//!          │ replace_field
//! ```
//!
//! `GpuState` owns all GPU resources (surface, device, pipeline, uniforms,
//! field texture), while `PreviewRuntime` is the thread-safe handle callers
//! hold. The shader pair is fixed and compiled at start-up; runtime inputs
//! are limited to the field texture and the effect parameters.

mod clock;
mod compile;
mod gpu;
mod types;
mod viewport;
mod window;

pub use clock::{FrameClock, FrameTick, MIN_FRAME_DELTA};
pub use compile::CompileError;
pub use gpu::TextureError;
pub use types::{EffectParams, PreviewConfig};
pub use viewport::{ViewportCoordinator, ViewportFrame, DEFAULT_LOGICAL_SIDE};
pub use window::PreviewRuntime;
