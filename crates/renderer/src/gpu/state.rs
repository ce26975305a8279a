use std::time::Instant;

use anyhow::Result;
use logofield::RenderableField;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, info};
use winit::dpi::PhysicalSize;

use crate::clock::{FrameClock, FrameTick};
use crate::types::EffectParams;

use super::context::GpuContext;
use super::pipeline::{LiquidPipeline, PipelineLayouts};
use super::texture::{validate_field, FieldTexture, TextureError};
use super::uniforms::{write_slot, LiquidUniforms};

/// What one pass through the frame callback produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameOutcome {
    Rendered,
    Skipped,
}

/// Everything needed to draw the animated canvas: device plumbing, the
/// compiled pipeline, the field texture, and the frame clock.
pub(crate) struct GpuState {
    context: GpuContext,
    layouts: PipelineLayouts,
    pipeline: LiquidPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: LiquidUniforms,
    field_texture: FieldTexture,
    field_bind_group: wgpu::BindGroup,
    clock: FrameClock,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        size: PhysicalSize<u32>,
        field: &RenderableField,
        params: EffectParams,
        now: Instant,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, size)?;
        let layouts = PipelineLayouts::new(&context.device);
        let pipeline = LiquidPipeline::new(&context.device, &layouts, context.surface_format)?;

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform buffer"),
            size: std::mem::size_of::<LiquidUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform bind group"),
                layout: &layouts.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let limit = context.device.limits().max_texture_dimension_2d;
        let field_texture = FieldTexture::upload(&context.device, &context.queue, field, limit)?;
        let field_bind_group = bind_field(&context.device, &layouts.field_layout, &field_texture);

        let canvas_ratio = context.size.width as f32 / context.size.height as f32;
        let uniforms = LiquidUniforms::new(params, canvas_ratio, field.aspect_ratio());
        context
            .queue
            .write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        Ok(Self {
            context,
            layouts,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            uniforms,
            field_texture,
            field_bind_group,
            clock: FrameClock::start(params.speed, now),
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    /// Applies a new parameter set. Non-speed values are written to the
    /// uniform buffer immediately rather than waiting for the next frame.
    pub(crate) fn set_params(&mut self, params: EffectParams) {
        self.clock.set_speed(params.speed);
        self.uniforms.apply(params);

        let queue = &self.context.queue;
        let buffer = &self.uniform_buffer;
        let handles = &self.pipeline.handles;
        write_slot(queue, buffer, handles.pattern_scale, params.pattern_scale);
        write_slot(queue, buffer, handles.refraction, params.refraction);
        write_slot(queue, buffer, handles.edge, params.edge);
        write_slot(queue, buffer, handles.pattern_blur, params.pattern_blur);
        write_slot(queue, buffer, handles.liquid, params.liquid);
        debug!(?params, "applied effect parameters");
    }

    /// Swaps in a freshly extracted field raster. The previous texture is
    /// released before the replacement is created; a raster that fails
    /// validation leaves the current texture in place.
    pub(crate) fn replace_field(&mut self, field: &RenderableField) -> Result<(), TextureError> {
        let limit = self.context.device.limits().max_texture_dimension_2d;
        validate_field(field, limit)?;

        self.field_texture.destroy();
        self.field_texture =
            FieldTexture::upload(&self.context.device, &self.context.queue, field, limit)?;
        self.field_bind_group = bind_field(
            &self.context.device,
            &self.layouts.field_layout,
            &self.field_texture,
        );

        self.uniforms.img_ratio = field.aspect_ratio();
        write_slot(
            &self.context.queue,
            &self.uniform_buffer,
            self.pipeline.handles.img_ratio,
            self.uniforms.img_ratio,
        );
        info!(
            width = field.width(),
            height = field.height(),
            "replaced field texture"
        );
        Ok(())
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
        self.uniforms.ratio = self.context.size.width as f32 / self.context.size.height as f32;
        write_slot(
            &self.context.queue,
            &self.uniform_buffer,
            self.pipeline.handles.ratio,
            self.uniforms.ratio,
        );
    }

    pub(crate) fn ready_for_frame(&self, now: Instant) -> bool {
        self.clock.ready_for_frame(now)
    }

    pub(crate) fn next_deadline(&self) -> Instant {
        self.clock.next_deadline()
    }

    /// Runs one animation callback. Callbacks inside the frame gate skip
    /// all GPU work; drawing callbacks advance the shader clock, render
    /// the quad, and present.
    pub(crate) fn render_frame(&mut self, now: Instant) -> Result<FrameOutcome, wgpu::SurfaceError> {
        let time_ms = match self.clock.tick(now) {
            FrameTick::Draw { time_ms } => time_ms,
            FrameTick::Skip => return Ok(FrameOutcome::Skipped),
        };

        self.uniforms.time = time_ms;
        write_slot(
            &self.context.queue,
            &self.uniform_buffer,
            self.pipeline.handles.time,
            time_ms,
        );

        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, &self.field_bind_group, &[]);
            render_pass.draw(0..4, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(FrameOutcome::Rendered)
    }
}

fn bind_field(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &FieldTexture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("field bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
    })
}
