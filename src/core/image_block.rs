// Copyright @yucwang 2026

use crate::core::rfilter::ReconstructionFilter;
use crate::math::constants::{Float, Vector2f, Vector2i, Vector2u};
use crate::math::spectrum::{RGBSpectrum, Wavelengths};
use std::sync::Arc;

/// Channels stored per pixel: R, G, B, alpha, filter weight.
pub const CHANNEL_COUNT: usize = 5;

pub type Pixel = [Float; CHANNEL_COUNT];

/// Rectangular accumulation buffer for filtered samples. Storage extends
/// `border_size` pixels past `size` on every side so that splats of samples
/// near the block edge are kept and merged into the neighbours later.
pub struct ImageBlock {
    offset: Vector2i,
    size: Vector2u,
    border_size: u32,
    filter: Arc<dyn ReconstructionFilter>,
    data: Vec<Pixel>,
}

impl ImageBlock {
    pub fn new(size: Vector2u, filter: Arc<dyn ReconstructionFilter>) -> Self {
        let border_size = filter.border_size();
        let storage = Self::storage_extent(size, border_size);
        Self {
            offset: Vector2i::zeros(),
            size,
            border_size,
            filter,
            data: vec![[0.0; CHANNEL_COUNT]; storage.x as usize * storage.y as usize],
        }
    }

    fn storage_extent(size: Vector2u, border_size: u32) -> Vector2u {
        size + Vector2u::new(2 * border_size, 2 * border_size)
    }

    pub fn clear(&mut self) {
        for p in self.data.iter_mut() {
            *p = [0.0; CHANNEL_COUNT];
        }
    }

    pub fn set_offset(&mut self, offset: Vector2i) {
        self.offset = offset;
    }

    pub fn offset(&self) -> Vector2i {
        self.offset
    }

    pub fn size(&self) -> Vector2u {
        self.size
    }

    pub fn border_size(&self) -> u32 {
        self.border_size
    }

    pub fn reconstruction_filter(&self) -> &Arc<dyn ReconstructionFilter> {
        &self.filter
    }

    fn storage_size(&self) -> Vector2u {
        Self::storage_extent(self.size, self.border_size)
    }

    /// Splat one sample at image-space position `pos`. Samples with NaN or
    /// infinite values and inactive lanes are dropped; returns whether the
    /// sample was recorded.
    pub fn put(&mut self, pos: &Vector2f, _wavelengths: &Wavelengths,
               value: &RGBSpectrum, alpha: Float, active: bool) -> bool {
        if !active {
            return false;
        }
        if !value.is_valid() || !alpha.is_finite() {
            log::warn!("ImageBlock::put(): invalid sample value {:?} at ({}, {}), dropped.",
                       value, pos.x, pos.y);
            return false;
        }

        let storage = self.storage_size();
        let radius = self.filter.radius();
        // Continuous storage coordinates, pixel centres on integers.
        let border = self.border_size as Float;
        let px = pos.x - self.offset.x as Float + border - 0.5;
        let py = pos.y - self.offset.y as Float + border - 0.5;

        let x0 = ((px - radius).ceil() as i64).max(0);
        let y0 = ((py - radius).ceil() as i64).max(0);
        let x1 = ((px + radius).floor() as i64).min(storage.x as i64 - 1);
        let y1 = ((py + radius).floor() as i64).min(storage.y as i64 - 1);
        if x0 > x1 || y0 > y1 {
            return false;
        }

        for y in y0..=y1 {
            let wy = self.filter.eval(y as Float - py);
            if wy == 0.0 {
                continue;
            }
            for x in x0..=x1 {
                let weight = self.filter.eval(x as Float - px) * wy;
                if weight == 0.0 {
                    continue;
                }
                let pixel = &mut self.data[(x + y * storage.x as i64) as usize];
                pixel[0] += value[0] * weight;
                pixel[1] += value[1] * weight;
                pixel[2] += value[2] * weight;
                pixel[3] += alpha * weight;
                pixel[4] += weight;
            }
        }
        true
    }

    /// Add the overlapping part of `other` (border included) into this block.
    pub fn accumulate(&mut self, other: &ImageBlock) {
        let self_origin = self.offset - Vector2i::new(self.border_size as i32, self.border_size as i32);
        let other_origin = other.offset - Vector2i::new(other.border_size as i32, other.border_size as i32);
        let self_storage = self.storage_size();
        let other_storage = other.storage_size();

        let x0 = self_origin.x.max(other_origin.x);
        let y0 = self_origin.y.max(other_origin.y);
        let x1 = (self_origin.x + self_storage.x as i32).min(other_origin.x + other_storage.x as i32);
        let y1 = (self_origin.y + self_storage.y as i32).min(other_origin.y + other_storage.y as i32);

        for y in y0..y1 {
            for x in x0..x1 {
                let src = ((x - other_origin.x) + (y - other_origin.y) * other_storage.x as i32) as usize;
                let dst = ((x - self_origin.x) + (y - self_origin.y) * self_storage.x as i32) as usize;
                let source = other.data[src];
                let target = &mut self.data[dst];
                for c in 0..CHANNEL_COUNT {
                    target[c] += source[c];
                }
            }
        }
    }

    /// Accumulated channels of pixel (x, y), relative to the block offset.
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        assert!(x < self.size.x && y < self.size.y);
        let storage = self.storage_size();
        let idx = (x + self.border_size) + (y + self.border_size) * storage.x;
        self.data[idx as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::ImageBlock;
    use crate::filters::box_filter::BoxFilter;
    use crate::filters::gaussian::GaussianFilter;
    use crate::math::constants::{Vector2f, Vector2i, Vector2u};
    use crate::math::spectrum::{RGBSpectrum, Wavelengths};
    use std::sync::Arc;

    #[test]
    fn test_box_put_hits_single_pixel() {
        let mut block = ImageBlock::new(Vector2u::new(4, 4), Arc::new(BoxFilter::new()));
        block.set_offset(Vector2i::new(8, 4));
        let recorded = block.put(&Vector2f::new(9.3, 6.7), &Wavelengths::zeros(),
                                 &RGBSpectrum::new(1.0, 2.0, 3.0), 1.0, true);
        assert!(recorded);
        assert_eq!(block.pixel(1, 2), [1.0, 2.0, 3.0, 1.0, 1.0]);
        assert_eq!(block.pixel(0, 0), [0.0; 5]);

        block.clear();
        assert_eq!(block.pixel(1, 2), [0.0; 5]);
    }

    #[test]
    fn test_put_drops_inactive_and_invalid() {
        let mut block = ImageBlock::new(Vector2u::new(2, 2), Arc::new(BoxFilter::new()));
        let pos = Vector2f::new(0.5, 0.5);
        assert!(!block.put(&pos, &Wavelengths::zeros(), &RGBSpectrum::splat(1.0), 1.0, false));
        assert!(!block.put(&pos, &Wavelengths::zeros(), &RGBSpectrum::splat(f32::NAN), 1.0, true));
        assert_eq!(block.pixel(0, 0), [0.0; 5]);
    }

    #[test]
    fn test_gaussian_put_spreads_into_border() {
        let mut block = ImageBlock::new(Vector2u::new(2, 2), Arc::new(GaussianFilter::new(0.5)));
        assert_eq!(block.border_size(), 2);
        block.put(&Vector2f::new(0.5, 0.5), &Wavelengths::zeros(), &RGBSpectrum::splat(1.0), 1.0, true);
        let centre = block.pixel(0, 0);
        let neighbour = block.pixel(1, 0);
        assert!(centre[4] > neighbour[4]);
        assert!(neighbour[4] > 0.0);
    }

    #[test]
    fn test_accumulate_respects_offsets() {
        let filter = Arc::new(BoxFilter::new());
        let mut target = ImageBlock::new(Vector2u::new(4, 4), filter.clone());
        let mut source = ImageBlock::new(Vector2u::new(2, 2), filter);
        source.set_offset(Vector2i::new(2, 2));
        source.put(&Vector2f::new(3.5, 2.5), &Wavelengths::zeros(), &RGBSpectrum::splat(2.0), 1.0, true);

        target.accumulate(&source);
        target.accumulate(&source);
        assert_eq!(target.pixel(3, 2), [4.0, 4.0, 4.0, 2.0, 2.0]);
        assert_eq!(target.pixel(2, 2), [0.0; 5]);
    }
}
