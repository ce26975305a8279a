use std::borrow::Cow;

use thiserror::Error;
use wgpu::naga;

/// Why a shader failed to make it through the GLSL front end.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to parse {stage} shader: {message}")]
    Parse {
        stage: &'static str,
        message: String,
    },
    #[error("{stage} shader failed validation: {message}")]
    Validate {
        stage: &'static str,
        message: String,
    },
}

fn stage_label(stage: naga::ShaderStage) -> &'static str {
    match stage {
        naga::ShaderStage::Vertex => "vertex",
        naga::ShaderStage::Fragment => "fragment",
        _ => "compute",
    }
}

/// Runs a shader through naga's GLSL front end and validator without
/// touching the GPU. Returns the parsed module so callers can inspect
/// the uniform block layout.
pub(crate) fn parse_and_validate(
    source: &str,
    stage: naga::ShaderStage,
) -> Result<naga::Module, CompileError> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(stage);
    let module = frontend
        .parse(&options, source)
        .map_err(|errors| CompileError::Parse {
            stage: stage_label(stage),
            message: errors.to_string(),
        })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|error| CompileError::Validate {
        stage: stage_label(stage),
        message: error.into_inner().to_string(),
    })?;

    Ok(module)
}

/// Validates the source up front, then hands the same GLSL to wgpu for
/// module creation. wgpu re-parses with the identical naga front end, so
/// the returned [`naga::Module`] describes exactly what the device sees.
pub(crate) fn compile_shader(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    stage: naga::ShaderStage,
) -> Result<(wgpu::ShaderModule, naga::Module), CompileError> {
    let module = parse_and_validate(source, stage)?;
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(source),
            stage,
            defines: &[],
        },
    });
    Ok((shader, module))
}

/// Vertex shader for the quad strip covering the whole canvas.
pub(crate) const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 vUv;

const vec2 positions[4] = vec2[4](
    vec2(-1.0, -1.0),
    vec2(1.0, -1.0),
    vec2(-1.0, 1.0),
    vec2(1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    vUv = 0.5 * (pos + 1.0);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Fragment shader that turns the distance-field raster into animated
/// chrome. The uniform block layout must match `LiquidUniforms` in
/// `gpu/uniforms.rs`, member for member.
pub(crate) const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 vUv;
layout(location = 0) out vec4 fragColor;

layout(std140, set = 0, binding = 0) uniform LiquidParams {
    float _u_time;
    float _u_ratio;
    float _u_img_ratio;
    float _u_patternScale;
    float _u_refraction;
    float _u_edge;
    float _u_patternBlur;
    float _u_liquid;
} ubo;

// Map wire names to UBO members via macros to avoid name clashes.
#define u_time ubo._u_time
#define u_ratio ubo._u_ratio
#define u_img_ratio ubo._u_img_ratio
#define u_patternScale ubo._u_patternScale
#define u_refraction ubo._u_refraction
#define u_edge ubo._u_edge
#define u_patternBlur ubo._u_patternBlur
#define u_liquid ubo._u_liquid

layout(set = 1, binding = 0) uniform texture2D liquid_field_texture;
layout(set = 1, binding = 1) uniform sampler liquid_field_sampler;

#define u_image_texture sampler2D(liquid_field_texture, liquid_field_sampler)

#define TWO_PI 6.28318530718
#define PI 3.14159265358979323846

vec3 mod289(vec3 x) { return x - floor(x * (1. / 289.)) * 289.; }
vec2 mod289(vec2 x) { return x - floor(x * (1. / 289.)) * 289.; }
vec3 permute(vec3 x) { return mod289(((x*34.)+1.)*x); }
float snoise(vec2 v) {
    const vec4 C = vec4(0.211324865405187, 0.366025403784439, -0.577350269189626, 0.024390243902439);
    vec2 i = floor(v + dot(v, C.yy));
    vec2 x0 = v - i + dot(i, C.xx);
    vec2 i1;
    i1 = (x0.x > x0.y) ? vec2(1., 0.) : vec2(0., 1.);
    vec4 x12 = x0.xyxy + C.xxzz;
    x12.xy -= i1;
    i = mod289(i);
    vec3 p = permute(permute(i.y + vec3(0., i1.y, 1.)) + i.x + vec3(0., i1.x, 1.));
    vec3 m = max(.5 - vec3(dot(x0, x0), dot(x12.xy, x12.xy), dot(x12.zw, x12.zw)), 0.);
    m = m*m;
    m = m*m;
    vec3 x = 2. * fract(p * C.www) - 1.;
    vec3 h = abs(x) - .5;
    vec3 ox = floor(x + .5);
    vec3 a0 = x - ox;
    m *= 1.79284291400159 - 0.85373472095314 * (a0*a0 + h*h);
    vec3 g;
    g.x = a0.x * x0.x + h.x * x0.y;
    g.yz = a0.yz * x12.xz + h.yz * x12.yw;
    return 130. * dot(m, g);
}

vec2 get_img_uv() {
    vec2 img_uv = vUv;
    img_uv -= .5;
    if (u_ratio > u_img_ratio) {
        img_uv.x = img_uv.x * u_ratio / u_img_ratio;
    } else {
        img_uv.y = img_uv.y * u_img_ratio / u_ratio;
    }
    float scale_factor = 1.;
    img_uv *= scale_factor;
    img_uv += .5;

    img_uv.y = 1. - img_uv.y;

    return img_uv;
}
vec2 rotate(vec2 uv, float th) {
    return mat2(cos(th), sin(th), -sin(th), cos(th)) * uv;
}
float get_color_channel(float c1, float c2, float stripe_p, vec3 w, float extra_blur, float b) {
    float ch = c2;
    float border = 0.;
    float blur = u_patternBlur + extra_blur;

    ch = mix(ch, c1, smoothstep(.0, blur, stripe_p));

    border = w[0];
    ch = mix(ch, c2, smoothstep(border - blur, border + blur, stripe_p));

    b = smoothstep(.2, .8, b);
    border = w[0] + .4 * (1. - b) * w[1];
    ch = mix(ch, c1, smoothstep(border - blur, border + blur, stripe_p));

    border = w[0] + .5 * (1. - b) * w[1];
    ch = mix(ch, c2, smoothstep(border - blur, border + blur, stripe_p));

    border = w[0] + w[1];
    ch = mix(ch, c1, smoothstep(border - blur, border + blur, stripe_p));

    float gradient_t = (stripe_p - w[0] - w[1]) / w[2];
    float gradient = mix(c1, c2, smoothstep(0., 1., gradient_t));
    ch = mix(ch, gradient, smoothstep(border - blur, border + blur, stripe_p));

    return ch;
}

float get_img_frame_alpha(vec2 uv, float img_frame_width) {
    float img_frame_alpha = smoothstep(0., img_frame_width, uv.x) * smoothstep(1., 1. - img_frame_width, uv.x);
    img_frame_alpha *= smoothstep(0., img_frame_width, uv.y) * smoothstep(1., 1. - img_frame_width, uv.y);
    return img_frame_alpha;
}

void main() {
    vec2 uv = vUv;
    uv.y = 1. - uv.y;
    uv.x *= u_ratio;

    float diagonal = uv.x - uv.y;

    float t = .001 * u_time;

    vec2 img_uv = get_img_uv();
    vec4 img = texture(u_image_texture, img_uv);

    vec3 color = vec3(0.);
    float opacity = 1.;

    vec3 color1 = vec3(.98, 0.98, 1.);
    vec3 color2 = vec3(.1, .1, .1 + .1 * smoothstep(.7, 1.3, uv.x + uv.y));

    float edge = img.r;

    vec2 grad_uv = uv;
    grad_uv -= .5;

    float dist = length(grad_uv + vec2(0., .2 * diagonal));

    grad_uv = rotate(grad_uv, (.25 - .2 * diagonal) * PI);

    float bulge = pow(1.8 * dist, 1.2);
    bulge = 1. - bulge;
    bulge *= pow(uv.y, .3);

    float cycle_width = u_patternScale;
    float thin_strip_1_ratio = .12 / cycle_width * (1. - .4 * bulge);
    float thin_strip_2_ratio = .07 / cycle_width * (1. + .4 * bulge);
    float wide_strip_ratio = (1. - thin_strip_1_ratio - thin_strip_2_ratio);

    float thin_strip_1_width = cycle_width * thin_strip_1_ratio;
    float thin_strip_2_width = cycle_width * thin_strip_2_ratio;

    opacity = 1. - smoothstep(.9 - .5 * u_edge, 1. - .5 * u_edge, edge);
    opacity *= get_img_frame_alpha(img_uv, 0.01);

    float noise = snoise(uv - t);

    edge += (1. - edge) * u_liquid * noise;

    float refr = 0.;
    refr += (1. - bulge);
    refr = clamp(refr, 0., 1.);

    float dir = grad_uv.x;

    dir += diagonal;

    dir -= 2. * noise * diagonal * (smoothstep(0., 1., edge) * smoothstep(1., 0., edge));

    bulge *= clamp(pow(uv.y, .1), .3, 1.);
    dir *= (.1 + (1.1 - edge) * bulge);

    dir *= smoothstep(1., .7, edge);

    dir += .18 * (smoothstep(.1, .2, uv.y) * smoothstep(.4, .2, uv.y));
    dir += .03 * (smoothstep(.1, .2, 1. - uv.y) * smoothstep(.4, .2, 1. - uv.y));

    dir *= (.5 + .5 * pow(uv.y, 2.));

    dir *= cycle_width;

    dir -= t;

    float refr_r = refr;
    refr_r += .03 * bulge * noise;
    float refr_b = 1.3 * refr;

    refr_r += 5. * (smoothstep(-.1, .2, uv.y) * smoothstep(.5, .1, uv.y)) * (smoothstep(.4, .6, bulge) * smoothstep(1., .4, bulge));
    refr_r -= diagonal;

    refr_b += (smoothstep(0., .4, uv.y) * smoothstep(.8, .1, uv.y)) * (smoothstep(.4, .6, bulge) * smoothstep(.8, .4, bulge));
    refr_b -= .2 * edge;

    refr_r *= u_refraction;
    refr_b *= u_refraction;

    vec3 w = vec3(thin_strip_1_width, thin_strip_2_width, wide_strip_ratio);
    w[1] -= .02 * smoothstep(.0, 1., edge + bulge);
    float stripe_r = mod(dir + refr_r, 1.);
    float r = get_color_channel(color1.r, color2.r, stripe_r, w, 0.02 + .03 * u_refraction * bulge, bulge);
    float stripe_g = mod(dir, 1.);
    float g = get_color_channel(color1.g, color2.g, stripe_g, w, 0.01 / (1. - diagonal), bulge);
    float stripe_b = mod(dir - refr_b, 1.);
    float b = get_color_channel(color1.b, color2.b, stripe_b, w, .01, bulge);

    color = vec3(r, g, b);
    color *= opacity;

    fragColor = vec4(color, opacity);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_vertex_shader_passes_validation() {
        parse_and_validate(VERTEX_SHADER_GLSL, naga::ShaderStage::Vertex).unwrap();
    }

    #[test]
    fn builtin_fragment_shader_passes_validation() {
        let module = parse_and_validate(FRAGMENT_SHADER_GLSL, naga::ShaderStage::Fragment).unwrap();
        let uniform_blocks = module
            .global_variables
            .iter()
            .filter(|(_, var)| var.space == naga::AddressSpace::Uniform)
            .count();
        assert_eq!(uniform_blocks, 1);
    }

    #[test]
    fn stripe_borders_narrow_as_bulge_rises() {
        // Both intermediate ladder steps shrink the second strip as b grows.
        assert_eq!(FRAGMENT_SHADER_GLSL.matches("(1. - b) * w[1]").count(), 2);
        assert!(!FRAGMENT_SHADER_GLSL.contains("(1. + b)"));
    }

    #[test]
    fn parse_failure_names_the_stage() {
        let err = parse_and_validate("#version 450\nvoid main() { nonsense }", naga::ShaderStage::Fragment)
            .unwrap_err();
        match err {
            CompileError::Parse { stage, .. } => assert_eq!(stage, "fragment"),
            other => panic!("expected a parse error, got {other}"),
        }
    }
}
