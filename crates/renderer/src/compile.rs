use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error};

use crate::error::InitError;
use crate::graphics::Graphics;
use crate::types::ShaderStage;

/// Both compiled stages plus the program linked from them.
pub(crate) struct ProgramParts<G: Graphics> {
    pub program: G::Program,
    pub vertex: G::Shader,
    pub fragment: G::Shader,
}

/// Returns the vendored GLSL source for `stage`.
pub fn stage_source(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => VERTEX_SHADER_GLSL,
        ShaderStage::Fragment => FRAGMENT_SHADER_GLSL,
    }
}

/// Creates and compiles one stage. On failure the driver log is reported and
/// the half-built stage is released before returning.
pub(crate) fn compile_stage<G: Graphics>(
    graphics: &mut G,
    stage: ShaderStage,
    source: &str,
) -> Result<G::Shader, InitError> {
    let mut shader = graphics.create_shader(stage);
    match graphics.compile_shader(&mut shader, source) {
        Ok(()) => {
            debug!(%stage, "compiled shader stage");
            Ok(shader)
        }
        Err(log) => {
            error!(%stage, log = %log, "shader compile failed");
            graphics.delete_shader(shader);
            Err(InitError::Compile { stage, log })
        }
    }
}

/// Links two compiled stages. On failure the driver log is reported and the
/// program object is released before returning.
pub(crate) fn link_program<G: Graphics>(
    graphics: &mut G,
    vertex: &G::Shader,
    fragment: &G::Shader,
) -> Result<G::Program, InitError> {
    let mut program = graphics.create_program();
    match graphics.link_program(&mut program, vertex, fragment) {
        Ok(()) => {
            debug!("linked shader program");
            Ok(program)
        }
        Err(log) => {
            error!(log = %log, "shader program link failed");
            graphics.delete_program(program);
            Err(InitError::Link { log })
        }
    }
}

/// Compiles both vendored stages and links them. Nothing created here
/// survives a failure.
pub(crate) fn build_program<G: Graphics>(graphics: &mut G) -> Result<ProgramParts<G>, InitError> {
    let vertex = compile_stage(graphics, ShaderStage::Vertex, VERTEX_SHADER_GLSL)?;
    let fragment = match compile_stage(graphics, ShaderStage::Fragment, FRAGMENT_SHADER_GLSL) {
        Ok(fragment) => fragment,
        Err(err) => {
            graphics.delete_shader(vertex);
            return Err(err);
        }
    };
    match link_program(graphics, &vertex, &fragment) {
        Ok(program) => Ok(ProgramParts {
            program,
            vertex,
            fragment,
        }),
        Err(err) => {
            graphics.delete_shader(vertex);
            graphics.delete_shader(fragment);
            Err(err)
        }
    }
}

/// Writes both stage sources into `dir` (`backdrop.vert` / `backdrop.frag`)
/// so they can be inspected or fed to external validators.
pub fn dump_shaders(dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create shader dump dir {}", dir.display()))?;
    let mut written = Vec::with_capacity(2);
    for (stage, file_name) in [
        (ShaderStage::Vertex, "backdrop.vert"),
        (ShaderStage::Fragment, "backdrop.frag"),
    ] {
        let path = dir.join(file_name);
        fs::write(&path, stage_source(stage))
            .with_context(|| format!("failed to write {stage} shader to {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

/// Passthrough for the full-screen quad; clip-space positions come straight
/// from attribute slot 0.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 position;

void main() {
    gl_Position = vec4(position, 0.0, 1.0);
}
";

/// Layered fBm nebula. `r` is the surface resolution in pixels and `t` the
/// seconds elapsed since mount; the block layout must match `ProgramUniforms`.
const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(std140, set = 0, binding = 0) uniform Params {
    vec2 r;
    float t;
} params;

layout(location = 0) out vec4 fragColor;

float hash(vec2 p) {
    p = fract(p * vec2(123.34, 456.21));
    p += vec2(dot(p, p + vec2(45.32)));
    return fract(p.x * p.y);
}

float noise(vec2 p) {
    vec2 cell = floor(p);
    vec2 f = fract(p);
    vec2 u = f * f * (vec2(3.0) - 2.0 * f);
    float a = hash(cell);
    float b = hash(cell + vec2(1.0, 0.0));
    float c = hash(cell + vec2(0.0, 1.0));
    float d = hash(cell + vec2(1.0, 1.0));
    return mix(mix(a, b, u.x), mix(c, d, u.x), u.y);
}

float fbm(vec2 p) {
    float value = 0.0;
    float amplitude = 0.5;
    mat2 rotation = mat2(0.8, -0.6, 0.6, 0.8);
    for (int octave = 0; octave < 6; octave++) {
        value += amplitude * noise(p);
        p = rotation * p * 2.02;
        amplitude *= 0.5;
    }
    return value;
}

void main() {
    vec2 uv = (gl_FragCoord.xy * 2.0 - params.r) / min(params.r.x, params.r.y);
    float drift = params.t * 0.15;
    vec3 color = vec3(0.0);
    float depth = 0.0;
    for (int layer = 0; layer < 24; layer++) {
        float fraction = float(layer) / 24.0;
        vec2 q = uv * (1.0 + depth) + vec2(drift, -drift * 0.7);
        float density = fbm(q + vec2(fbm(q + vec2(drift))));
        vec3 phase = vec3(fraction) + vec3(0.0, 0.33, 0.67);
        vec3 tint = vec3(0.5) + 0.5 * cos(6.2831 * phase + vec3(params.t * 0.2));
        color += tint * (density * density * 0.06 * (1.0 - fraction));
        depth += 0.12 + 0.05 * density;
    }
    color = color / (vec3(1.0) + color);
    fragColor = vec4(pow(color, vec3(0.4545)), 1.0);
}
";
