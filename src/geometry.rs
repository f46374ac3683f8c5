//! Letterbox fitting of the source image inside the viewport.
//!
//! The present pass draws a unit quad (clip space `[-1, 1]²`) transformed by
//! `R(rotation) · S(scale_x, scale_y)`. `fit` picks the scale so the visible
//! content keeps the source aspect ratio whatever the rotation, shrinking
//! exactly one axis and leaving the other at full extent.

/// Quarter-turn rotation applied to the presented image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// The next quarter turn; four calls return to the start.
    pub fn next(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// True when the visual bounding box swaps width and height.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Exact `(cos, sin)` so quarter turns stay free of float noise.
    pub fn cos_sin(self) -> (f32, f32) {
        match self {
            Rotation::Deg0 => (1.0, 0.0),
            Rotation::Deg90 => (0.0, 1.0),
            Rotation::Deg180 => (-1.0, 0.0),
            Rotation::Deg270 => (0.0, -1.0),
        }
    }
}

/// Non-uniform quad scale produced by [`fit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Default for Fit {
    fn default() -> Self {
        Fit {
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// Letterbox `source` inside `viewport` under `rotation`.
///
/// Returns `None` while any dimension is still zero; the source has not
/// decoded a frame yet and the caller should retry later.
pub fn fit(source: (u32, u32), viewport: (u32, u32), rotation: Rotation) -> Option<Fit> {
    let (sw, sh) = source;
    let (vw, vh) = viewport;
    if sw == 0 || sh == 0 || vw == 0 || vh == 0 {
        return None;
    }

    let video_aspect = sw as f32 / sh as f32;
    let screen_aspect = if rotation.swaps_axes() {
        vh as f32 / vw as f32
    } else {
        vw as f32 / vh as f32
    };

    Some(if video_aspect > screen_aspect {
        Fit {
            scale_x: 1.0,
            scale_y: screen_aspect / video_aspect,
        }
    } else {
        Fit {
            scale_x: video_aspect / screen_aspect,
            scale_y: 1.0,
        }
    })
}

/// Rotation plus the fit last computed for it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryState {
    pub rotation: Rotation,
    pub fit: Fit,
}

impl GeometryState {
    /// Column-major 2x2 matrix `R · S`, laid out for `uniformMatrix2fv`.
    pub fn transform(&self) -> [f32; 4] {
        let (c, s) = self.rotation.cos_sin();
        let Fit { scale_x, scale_y } = self.fit;
        [c * scale_x, s * scale_x, -s * scale_y, c * scale_y]
    }

    /// Map a clip-space point back onto the unit quad.
    ///
    /// Returns quad coordinates in `[-1, 1]²` when `p` lands on the content
    /// and `None` when it falls in the letterbox margin.
    pub fn unproject(&self, p: [f32; 2]) -> Option<[f32; 2]> {
        let (c, s) = self.rotation.cos_sin();
        let Fit { scale_x, scale_y } = self.fit;
        if scale_x <= 0.0 || scale_y <= 0.0 {
            return None;
        }
        let qx = (c * p[0] + s * p[1]) / scale_x;
        let qy = (-s * p[0] + c * p[1]) / scale_y;
        if qx.abs() <= 1.0 && qy.abs() <= 1.0 {
            Some([qx, qy])
        } else {
            None
        }
    }
}
