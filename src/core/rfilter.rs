// Copyright @yucwang 2026

use crate::math::constants::Float;

/// Separable pixel reconstruction filter used when splatting samples.
pub trait ReconstructionFilter: Send + Sync {
    /// Half-width of the filter support, in pixels.
    fn radius(&self) -> Float;

    /// 1D filter weight at offset `x` from a pixel centre.
    fn eval(&self, x: Float) -> Float;

    /// Extra pixels an image block needs on each side to hold every splat
    /// of a sample that lies inside the block.
    fn border_size(&self) -> u32 {
        (self.radius() - 0.5).ceil().max(0.0) as u32
    }

    fn describe(&self) -> String {
        String::from("ReconstructionFilter")
    }
}
