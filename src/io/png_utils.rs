// Copyright @yucwang 2026

use crate::core::error::RenderError;
use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;

use image::{Rgb, RgbImage};

/// Linear to 8-bit sRGB, clamped.
pub fn to_srgb8(linear: Float) -> u8 {
    let v = linear.max(0.0).min(1.0);
    let encoded = if v <= 0.0031308 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0 + 0.5).floor().min(255.0) as u8
}

/// Tone-mapped preview of a developed image.
pub fn write_png_to_file(bitmap: &Bitmap, file_path: &str) -> Result<(), RenderError> {
    log::info!("Writing sRGB preview: {}.", file_path);
    let image = RgbImage::from_fn(bitmap.width() as u32, bitmap.height() as u32, |x, y| {
        let p = bitmap[(x as usize, y as usize)];
        Rgb([to_srgb8(p.x), to_srgb8(p.y), to_srgb8(p.z)])
    });
    image.save(file_path).map_err(|e| RenderError::Output(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::Vector4f;

    #[test]
    fn test_srgb_encoding() {
        assert_eq!(to_srgb8(0.0), 0);
        assert_eq!(to_srgb8(1.0), 255);
        assert_eq!(to_srgb8(4.0), 255);
        assert_eq!(to_srgb8(-1.0), 0);
        assert_eq!(to_srgb8(0.5), 188);
    }

    #[test]
    fn test_write_png() {
        let mut bitmap = Bitmap::new(2, 2);
        bitmap[(1, 0)] = Vector4f::new(1.0, 0.0, 0.0, 1.0);
        let path = std::env::temp_dir().join("praline_write_png_test.png");
        let path = path.to_string_lossy().to_string();
        write_png_to_file(&bitmap, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.get_pixel(1, 0), &Rgb([255, 0, 0]));
        std::fs::remove_file(&path).ok();
    }
}
