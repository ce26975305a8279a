use wgpu::naga;

use crate::types::EffectParams;

/// CPU mirror of the shader's std140 uniform block.
///
/// Field order matches the `LiquidParams` block in the built-in fragment
/// shader; every member is a lone float, so the block packs to 32 bytes
/// with no padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct LiquidUniforms {
    pub time: f32,
    pub ratio: f32,
    pub img_ratio: f32,
    pub pattern_scale: f32,
    pub refraction: f32,
    pub edge: f32,
    pub pattern_blur: f32,
    pub liquid: f32,
}

unsafe impl bytemuck::Zeroable for LiquidUniforms {}
unsafe impl bytemuck::Pod for LiquidUniforms {}

impl LiquidUniforms {
    pub(crate) fn new(params: EffectParams, canvas_ratio: f32, image_ratio: f32) -> Self {
        Self {
            time: 0.0,
            ratio: canvas_ratio,
            img_ratio: image_ratio,
            pattern_scale: params.pattern_scale,
            refraction: params.refraction,
            edge: params.edge,
            pattern_blur: params.pattern_blur,
            liquid: params.liquid,
        }
    }

    /// Copies the tunable fields from `params`. Time and the two aspect
    /// ratios are owned by the frame loop and resize path respectively.
    pub(crate) fn apply(&mut self, params: EffectParams) {
        self.pattern_scale = params.pattern_scale;
        self.refraction = params.refraction;
        self.edge = params.edge;
        self.pattern_blur = params.pattern_blur;
        self.liquid = params.liquid;
    }
}

/// Byte offset of one member inside the uniform buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct UniformSlot {
    pub offset: u64,
}

impl UniformSlot {
    pub(crate) fn write(self, queue: &wgpu::Queue, buffer: &wgpu::Buffer, value: f32) {
        queue.write_buffer(buffer, self.offset, bytemuck::bytes_of(&value));
    }
}

/// Writes `value` into `slot` if the compiled shader kept that member.
pub(crate) fn write_slot(
    queue: &wgpu::Queue,
    buffer: &wgpu::Buffer,
    slot: Option<UniformSlot>,
    value: f32,
) {
    if let Some(slot) = slot {
        slot.write(queue, buffer, value);
    }
}

/// Uniform locations resolved from the parsed shader module.
///
/// A `None` slot means the compiled block does not carry that member;
/// writes to it become no-ops instead of buffer corruption.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct UniformHandles {
    pub time: Option<UniformSlot>,
    pub ratio: Option<UniformSlot>,
    pub img_ratio: Option<UniformSlot>,
    pub pattern_scale: Option<UniformSlot>,
    pub refraction: Option<UniformSlot>,
    pub edge: Option<UniformSlot>,
    pub pattern_blur: Option<UniformSlot>,
    pub liquid: Option<UniformSlot>,
}

impl UniformHandles {
    /// Walks the module's uniform blocks and records the byte offset of
    /// each wire-name member. Block members carry a leading underscore to
    /// dodge the macro aliases, so names are matched with it stripped.
    pub(crate) fn resolve(module: &naga::Module) -> Self {
        let mut handles = Self::default();
        for (_, variable) in module.global_variables.iter() {
            if variable.space != naga::AddressSpace::Uniform {
                continue;
            }
            let naga::TypeInner::Struct { ref members, .. } = module.types[variable.ty].inner
            else {
                continue;
            };
            for member in members {
                let Some(name) = member.name.as_deref() else {
                    continue;
                };
                let slot = Some(UniformSlot {
                    offset: u64::from(member.offset),
                });
                match name.trim_start_matches('_') {
                    "u_time" => handles.time = slot,
                    "u_ratio" => handles.ratio = slot,
                    "u_img_ratio" => handles.img_ratio = slot,
                    "u_patternScale" => handles.pattern_scale = slot,
                    "u_refraction" => handles.refraction = slot,
                    "u_edge" => handles.edge = slot,
                    "u_patternBlur" => handles.pattern_blur = slot,
                    "u_liquid" => handles.liquid = slot,
                    _ => {}
                }
            }
        }
        handles
    }

    /// Wire names that failed to resolve.
    pub(crate) fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.time.is_none() {
            missing.push("u_time");
        }
        if self.ratio.is_none() {
            missing.push("u_ratio");
        }
        if self.img_ratio.is_none() {
            missing.push("u_img_ratio");
        }
        if self.pattern_scale.is_none() {
            missing.push("u_patternScale");
        }
        if self.refraction.is_none() {
            missing.push("u_refraction");
        }
        if self.edge.is_none() {
            missing.push("u_edge");
        }
        if self.pattern_blur.is_none() {
            missing.push("u_patternBlur");
        }
        if self.liquid.is_none() {
            missing.push("u_liquid");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{parse_and_validate, FRAGMENT_SHADER_GLSL};
    use wgpu::naga::ShaderStage;

    #[test]
    fn uniform_block_matches_the_cpu_mirror_size() {
        assert_eq!(std::mem::size_of::<LiquidUniforms>(), 32);
    }

    #[test]
    fn every_wire_uniform_resolves_in_the_builtin_shader() {
        let module = parse_and_validate(FRAGMENT_SHADER_GLSL, ShaderStage::Fragment).unwrap();
        let handles = UniformHandles::resolve(&module);
        assert!(
            handles.missing().is_empty(),
            "unresolved uniforms: {:?}",
            handles.missing()
        );
    }

    #[test]
    fn member_offsets_follow_declaration_order() {
        let module = parse_and_validate(FRAGMENT_SHADER_GLSL, ShaderStage::Fragment).unwrap();
        let handles = UniformHandles::resolve(&module);
        assert_eq!(handles.time, Some(UniformSlot { offset: 0 }));
        assert_eq!(handles.ratio, Some(UniformSlot { offset: 4 }));
        assert_eq!(handles.img_ratio, Some(UniformSlot { offset: 8 }));
        assert_eq!(handles.liquid, Some(UniformSlot { offset: 28 }));
    }

    #[test]
    fn absent_members_resolve_to_none() {
        let source = "#version 450\n\
            layout(location = 0) out vec4 fragColor;\n\
            layout(std140, set = 0, binding = 0) uniform Partial { float _u_time; } ubo;\n\
            void main() { fragColor = vec4(ubo._u_time); }\n";
        let module = parse_and_validate(source, ShaderStage::Fragment).unwrap();
        let handles = UniformHandles::resolve(&module);
        assert_eq!(handles.time, Some(UniformSlot { offset: 0 }));
        assert!(handles.ratio.is_none());
        assert!(handles.liquid.is_none());
        assert_eq!(handles.missing().len(), 7);
    }

    #[test]
    fn apply_leaves_clock_and_ratios_untouched() {
        let mut uniforms = LiquidUniforms::new(EffectParams::default(), 1.0, 2.0);
        uniforms.time = 123.0;
        uniforms.apply(EffectParams::subtle());
        assert_eq!(uniforms.time, 123.0);
        assert_eq!(uniforms.ratio, 1.0);
        assert_eq!(uniforms.img_ratio, 2.0);
        assert_eq!(uniforms.pattern_scale, EffectParams::subtle().pattern_scale);
    }
}
