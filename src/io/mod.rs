// Copyright @yucwang 2026

pub mod exr_utils;
pub mod png_utils;

use crate::core::error::RenderError;
use crate::math::bitmap::Bitmap;

/// Write `bitmap` as linear EXR, or as an sRGB PNG preview when the path
/// ends in `.png`.
pub fn write_image(bitmap: &Bitmap, file_path: &str) -> Result<(), RenderError> {
    if file_path.to_ascii_lowercase().ends_with(".png") {
        png_utils::write_png_to_file(bitmap, file_path)
    } else {
        exr_utils::write_exr_to_file(&bitmap.raw_copy(), bitmap.width(), bitmap.height(), file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::Vector4f;

    #[test]
    fn test_write_image_picks_format_from_extension() {
        let mut bitmap = Bitmap::new(3, 2);
        bitmap[(2, 1)] = Vector4f::new(0.25, 0.5, 1.0, 1.0);

        let exr_path = std::env::temp_dir().join("praline_write_image_test.exr");
        let exr_path = exr_path.to_string_lossy().to_string();
        write_image(&bitmap, &exr_path).unwrap();
        let header = std::fs::read(&exr_path).unwrap();
        assert_eq!(&header[..4], &[0x76, 0x2f, 0x31, 0x01]);
        std::fs::remove_file(&exr_path).ok();

        let png_path = std::env::temp_dir().join("praline_write_image_test.png");
        let png_path = png_path.to_string_lossy().to_string();
        write_image(&bitmap, &png_path).unwrap();
        let loaded = image::open(&png_path).unwrap().to_rgb8();
        assert_eq!((loaded.width(), loaded.height()), (3, 2));
        std::fs::remove_file(&png_path).ok();
    }
}
