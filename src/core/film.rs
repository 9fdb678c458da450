// Copyright @yucwang 2026

use crate::core::error::RenderError;
use crate::core::image_block::{ImageBlock, Pixel};
use crate::core::properties::Properties;
use crate::core::rfilter::ReconstructionFilter;
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Vector2i, Vector2u, Vector4f};
use std::sync::{Arc, Mutex, MutexGuard};

/// Framebuffer of a sensor. Render workers merge finished blocks into the
/// shared storage concurrently; merges are additive so their order does not
/// matter.
pub struct Film {
    size: Vector2u,
    crop_offset: Vector2u,
    crop_size: Vector2u,
    filter: Arc<dyn ReconstructionFilter>,
    storage: Mutex<ImageBlock>,
}

impl Film {
    pub fn new(width: u32, height: u32, filter: Arc<dyn ReconstructionFilter>) -> Self {
        let size = Vector2u::new(width, height);
        Self {
            size,
            crop_offset: Vector2u::zeros(),
            crop_size: size,
            storage: Mutex::new(ImageBlock::new(size, filter.clone())),
            filter,
        }
    }

    /// Restrict rendering to a sub-window of the full resolution.
    pub fn with_crop(mut self, offset: Vector2u, size: Vector2u) -> Result<Self, RenderError> {
        if size.x == 0 || size.y == 0
            || offset.x + size.x > self.size.x || offset.y + size.y > self.size.y {
            return Err(RenderError::Config(format!(
                "crop window ({}, {}) + ({}, {}) does not fit a {}x{} film",
                offset.x, offset.y, size.x, size.y, self.size.x, self.size.y)));
        }
        let mut storage = ImageBlock::new(size, self.filter.clone());
        storage.set_offset(Vector2i::new(offset.x as i32, offset.y as i32));
        self.crop_offset = offset;
        self.crop_size = size;
        self.storage = Mutex::new(storage);
        Ok(self)
    }

    pub fn from_properties(props: &Properties, filter: Arc<dyn ReconstructionFilter>) -> Result<Self, RenderError> {
        let width = props.size_("width", 768)? as u32;
        let height = props.size_("height", 576)? as u32;
        if width == 0 || height == 0 {
            return Err(RenderError::Config(format!("film resolution {}x{} is empty", width, height)));
        }
        let film = Film::new(width, height, filter);
        let crop_size = Vector2u::new(props.size_("crop_width", width as usize)? as u32,
                                      props.size_("crop_height", height as usize)? as u32);
        let crop_offset = Vector2u::new(props.size_("crop_offset_x", 0)? as u32,
                                        props.size_("crop_offset_y", 0)? as u32);
        if crop_size == film.size && crop_offset == Vector2u::zeros() {
            return Ok(film);
        }
        film.with_crop(crop_offset, crop_size)
    }

    pub fn size(&self) -> Vector2u {
        self.size
    }

    pub fn crop_offset(&self) -> Vector2u {
        self.crop_offset
    }

    pub fn crop_size(&self) -> Vector2u {
        self.crop_size
    }

    pub fn reconstruction_filter(&self) -> &Arc<dyn ReconstructionFilter> {
        &self.filter
    }

    fn lock_storage(&self) -> MutexGuard<'_, ImageBlock> {
        // A panicking worker aborts the render anyway; keep the data usable.
        self.storage.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn clear(&self) {
        self.lock_storage().clear();
    }

    /// Merge a finished block.
    pub fn put(&self, block: &ImageBlock) {
        self.lock_storage().accumulate(block);
    }

    /// Raw accumulated channels of a crop-relative pixel.
    pub fn raw_pixel(&self, x: u32, y: u32) -> Pixel {
        self.lock_storage().pixel(x, y)
    }

    /// Weight-normalised RGBA image of the crop window.
    pub fn develop(&self) -> Bitmap {
        let storage = self.lock_storage();
        let mut bitmap = Bitmap::new(self.crop_size.x as usize, self.crop_size.y as usize);
        for y in 0..self.crop_size.y {
            for x in 0..self.crop_size.x {
                let p = storage.pixel(x, y);
                if p[4] > 0.0 {
                    let inv_weight = 1.0 / p[4];
                    bitmap[(x as usize, y as usize)] =
                        Vector4f::new(p[0] * inv_weight, p[1] * inv_weight, p[2] * inv_weight, p[3] * inv_weight);
                }
            }
        }
        bitmap
    }
}

#[cfg(test)]
mod tests {
    use super::Film;
    use crate::core::image_block::ImageBlock;
    use crate::filters::box_filter::BoxFilter;
    use crate::math::constants::{Vector2f, Vector2i, Vector2u, Vector4f};
    use crate::math::spectrum::{RGBSpectrum, Wavelengths};
    use std::sync::Arc;

    #[test]
    fn test_film_put_and_develop() {
        let filter = Arc::new(BoxFilter::new());
        let film = Film::new(4, 4, filter.clone());
        let mut block = ImageBlock::new(Vector2u::new(2, 2), filter);
        block.set_offset(Vector2i::new(2, 0));
        block.put(&Vector2f::new(2.5, 0.5), &Wavelengths::zeros(), &RGBSpectrum::splat(2.0), 1.0, true);
        block.put(&Vector2f::new(2.5, 0.5), &Wavelengths::zeros(), &RGBSpectrum::splat(4.0), 1.0, true);
        film.put(&block);

        let image = film.develop();
        assert_eq!(image[(2, 0)], Vector4f::new(3.0, 3.0, 3.0, 1.0));
        assert_eq!(image[(0, 0)], Vector4f::zeros());

        film.clear();
        assert_eq!(film.raw_pixel(2, 0), [0.0; 5]);
    }

    #[test]
    fn test_film_crop_window() {
        let filter = Arc::new(BoxFilter::new());
        let film = Film::new(8, 8, filter.clone())
            .with_crop(Vector2u::new(2, 3), Vector2u::new(4, 2))
            .unwrap();
        assert_eq!(film.crop_offset(), Vector2u::new(2, 3));
        assert_eq!(film.crop_size(), Vector2u::new(4, 2));

        let mut block = ImageBlock::new(Vector2u::new(4, 2), filter.clone());
        block.set_offset(Vector2i::new(2, 3));
        block.put(&Vector2f::new(2.5, 3.5), &Wavelengths::zeros(), &RGBSpectrum::splat(1.0), 1.0, true);
        film.put(&block);
        assert_eq!(film.raw_pixel(0, 0)[4], 1.0);
        assert_eq!(film.develop().width(), 4);

        assert!(Film::new(8, 8, filter).with_crop(Vector2u::new(6, 0), Vector2u::new(4, 4)).is_err());
    }
}
