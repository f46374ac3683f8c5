use crate::blend::BlendParameters;
use crate::geometry::GeometryState;
use crate::Result;

/// An off-screen image the blend pass can write into.
pub trait RenderTarget {
    fn size(&self) -> (u32, u32);

    /// Reallocate at `width x height`; previous content is discarded.
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Fill with zero.
    fn clear(&mut self) -> Result<()>;
}

/// The two GPU passes and the surface they draw to.
pub trait Backend {
    type Target: RenderTarget;
    /// Decoded frame handed over by a `FrameSource`.
    type Frame: ?Sized;

    fn create_target(&mut self, width: u32, height: u32) -> Result<Self::Target>;

    /// The visible surface changed size.
    fn resize_viewport(&mut self, width: u32, height: u32);

    /// Blend `frame` with `front` into `back`. `front` and `back` are never
    /// the same target.
    fn blend(
        &mut self,
        frame: &Self::Frame,
        front: &Self::Target,
        back: &mut Self::Target,
        params: &BlendParameters,
    ) -> Result<()>;

    /// Draw `target` onto the visible surface under `geometry`.
    fn present(&mut self, target: &Self::Target, geometry: &GeometryState) -> Result<()>;

    /// Clear the visible surface to opaque black.
    fn present_blank(&mut self) -> Result<()>;
}
