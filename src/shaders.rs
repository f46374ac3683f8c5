//! GLSL ES 3.0 sources for the two passes.
//!
//! Both passes share [`QUAD_VERTEX`]: a unit quad at attribute location 0,
//! transformed by `u_transform` (identity for the blend pass).

pub const U_TRANSFORM: &str = "u_transform";
pub const U_CURRENT: &str = "u_current";
pub const U_ACCUM: &str = "u_accum";
pub const U_DECAY: &str = "u_decay";
pub const U_CONTRAST: &str = "u_contrast";
pub const U_BRIGHTNESS: &str = "u_brightness";
pub const U_IMAGE: &str = "u_image";

/// Triangle-strip corners of the unit quad.
pub const QUAD_CORNERS: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

pub const IDENTITY: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

pub const QUAD_VERTEX: &str = r#"#version 300 es
layout(location = 0) in vec2 a_position;
uniform mat2 u_transform;
out vec2 v_uv;

void main() {
    v_uv = a_position * 0.5 + 0.5;
    gl_Position = vec4(u_transform * a_position, 0.0, 1.0);
}
"#;

/// Feedback blend; mirrors `blend::blend_texel`.
pub const BLEND_FRAGMENT: &str = r#"#version 300 es
precision highp float;

uniform sampler2D u_current;
uniform sampler2D u_accum;
uniform float u_decay;
uniform float u_contrast;
uniform float u_brightness;

in vec2 v_uv;
out vec4 out_color;

const vec3 LUMA = vec3(0.299, 0.587, 0.114);

void main() {
    vec4 cur = texture(u_current, v_uv);
    vec4 acc = texture(u_accum, v_uv);

    vec4 accumulated = mix(cur, acc, u_decay);

    float target_lum = mix(dot(cur.rgb, LUMA), dot(acc.rgb, LUMA), u_decay);
    float boost = 1.0;
    if (target_lum < 0.1) {
        boost = mix(1.0, 1.5, 0.1 - target_lum);
    }

    accumulated.rgb = (accumulated.rgb - 0.5) * u_contrast + 0.5 + u_brightness;
    accumulated.rgb *= boost;

    out_color = clamp(accumulated, 0.0, 1.0);
}
"#;

/// Copies the accumulation texture onto the transformed quad.
pub const PRESENT_FRAGMENT: &str = r#"#version 300 es
precision mediump float;

uniform sampler2D u_image;

in vec2 v_uv;
out vec4 out_color;

void main() {
    out_color = vec4(texture(u_image, v_uv).rgb, 1.0);
}
"#;
