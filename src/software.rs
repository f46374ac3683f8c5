//! CPU backend that runs both passes on plain `f32` images.
//!
//! It produces the same pixels the WebGL2 backend would (nearest sampling
//! instead of linear), which makes the whole render loop observable on the
//! host.

use crate::blend::{blend_texel, BlendParameters, Texel};
use crate::geometry::GeometryState;
use crate::pipeline::{Backend, RenderTarget};
use crate::Result;

pub const BLACK: Texel = [0.0, 0.0, 0.0, 1.0];

/// Row-major RGBA image, row 0 at the bottom like a GL texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    texels: Vec<Texel>,
}

impl Image {
    /// A zeroed image.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0.0; 4])
    }

    pub fn filled(width: u32, height: u32, texel: Texel) -> Self {
        Image {
            width,
            height,
            texels: vec![texel; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texels(&self) -> &[Texel] {
        &self.texels
    }

    pub fn texel(&self, x: u32, y: u32) -> Texel {
        self.texels[(y * self.width + x) as usize]
    }

    pub fn set_texel(&mut self, x: u32, y: u32, texel: Texel) {
        let idx = (y * self.width + x) as usize;
        self.texels[idx] = texel;
    }

    /// Nearest-neighbour lookup at normalized `uv`, clamped to the edge.
    pub fn sample(&self, u: f32, v: f32) -> Texel {
        if self.width == 0 || self.height == 0 {
            return [0.0; 4];
        }
        let x = ((u * self.width as f32) as i64).clamp(0, self.width as i64 - 1) as u32;
        let y = ((v * self.height as f32) as i64).clamp(0, self.height as i64 - 1) as u32;
        self.texel(x, y)
    }

    pub fn is_uniform(&self, texel: Texel) -> bool {
        self.texels.iter().all(|t| *t == texel)
    }
}

impl RenderTarget for Image {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        *self = Image::new(width, height);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.texels.fill([0.0; 4]);
        Ok(())
    }
}

fn texel_center(i: u32, extent: u32) -> f32 {
    (i as f32 + 0.5) / extent as f32
}

/// Software rendition of the blend and present passes.
pub struct SoftwareBackend {
    screen: Image,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        SoftwareBackend {
            screen: Image::new(0, 0),
        }
    }

    /// What the last present call put on screen.
    pub fn screen(&self) -> &Image {
        &self.screen
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for SoftwareBackend {
    type Target = Image;
    type Frame = Image;

    fn create_target(&mut self, width: u32, height: u32) -> Result<Image> {
        Ok(Image::new(width, height))
    }

    fn resize_viewport(&mut self, width: u32, height: u32) {
        self.screen = Image::new(width, height);
    }

    fn blend(
        &mut self,
        frame: &Image,
        front: &Image,
        back: &mut Image,
        params: &BlendParameters,
    ) -> Result<()> {
        let (w, h) = back.size();
        for y in 0..h {
            for x in 0..w {
                let (u, v) = (texel_center(x, w), texel_center(y, h));
                let out = blend_texel(&frame.sample(u, v), &front.sample(u, v), params);
                back.set_texel(x, y, out);
            }
        }
        Ok(())
    }

    fn present(&mut self, target: &Image, geometry: &GeometryState) -> Result<()> {
        let (w, h) = self.screen.size();
        for y in 0..h {
            for x in 0..w {
                let p = [
                    texel_center(x, w) * 2.0 - 1.0,
                    texel_center(y, h) * 2.0 - 1.0,
                ];
                let out = match geometry.unproject(p) {
                    Some([qx, qy]) => {
                        let t = target.sample(qx * 0.5 + 0.5, qy * 0.5 + 0.5);
                        [t[0], t[1], t[2], 1.0]
                    }
                    None => BLACK,
                };
                self.screen.set_texel(x, y, out);
            }
        }
        Ok(())
    }

    fn present_blank(&mut self) -> Result<()> {
        self.screen.texels.fill(BLACK);
        Ok(())
    }
}
