//! Scalar reference of the feedback blend.
//!
//! `shaders::BLEND_FRAGMENT` evaluates the same expression per fragment on
//! the GPU; [`blend_texel`] is what the software backend and the tests run.

use serde::Deserialize;

/// Rec. 601 luma weights.
pub const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

/// Below this rolling luminance the trail gets brightened.
pub const BOOST_THRESHOLD: f32 = 0.1;

/// Boost reached when `mix` weight is 1.
pub const BOOST_CEILING: f32 = 1.5;

/// Live blend controls, read from the sliders every frame.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BlendParameters {
    /// Persistence of the accumulated trail in `[0, 1]`.
    pub decay: f32,
    pub contrast: f32,
    pub brightness: f32,
}

impl Default for BlendParameters {
    fn default() -> Self {
        BlendParameters {
            decay: 0.93,
            contrast: 1.0,
            brightness: 0.0,
        }
    }
}

pub type Texel = [f32; 4];

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

pub fn luminance(t: &Texel) -> f32 {
    t[0] * LUMA[0] + t[1] * LUMA[1] + t[2] * LUMA[2]
}

/// Gain applied when the blended luminance estimate drops below the threshold.
pub fn luminance_boost(target_lum: f32) -> f32 {
    if target_lum < BOOST_THRESHOLD {
        mix(1.0, BOOST_CEILING, BOOST_THRESHOLD - target_lum)
    } else {
        1.0
    }
}

/// Blend one texel of the current frame into the accumulated trail.
///
/// Contrast and brightness act on the post-blend value, so they shape the
/// persisted trail. The result is saturated to `[0, 1]` per channel.
pub fn blend_texel(current: &Texel, accum: &Texel, params: &BlendParameters) -> Texel {
    let decay = params.decay;
    let target_lum = mix(luminance(current), luminance(accum), decay);
    let boost = luminance_boost(target_lum);

    let mut out = [0.0; 4];
    for c in 0..3 {
        let blended = mix(current[c], accum[c], decay);
        let toned = (blended - 0.5) * params.contrast + 0.5 + params.brightness;
        out[c] = (toned * boost).clamp(0.0, 1.0);
    }
    out[3] = mix(current[3], accum[3], decay).clamp(0.0, 1.0);
    out
}
