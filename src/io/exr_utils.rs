/* Copyright 2020 @TwoCookingMice */

use crate::core::error::RenderError;
use crate::math::constants::Float;

use exr::prelude::write_rgb_file;

// Write EXR Image to file
pub fn write_exr_to_file(image: &std::vec::Vec<(Float, Float, Float)>,
                         width: usize,
                         height: usize,
                         file_path: &str) -> Result<(), RenderError> {
    log::info!("Starting writing openexr images: {}.", file_path);
    if image.len() != width * height {
        return Err(RenderError::Output(format!(
            "{} pixels do not make a {}x{} image", image.len(), width, height)));
    }

    write_rgb_file(file_path, width, height, |x,y| {
        (
            image[y*width+x].0,
            image[y*width+x].1,
            image[y*width+x].2
        )
    }).map_err(|e| RenderError::Output(e.to_string()))?;

    log::info!("EXR written to: {}.", file_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::write_exr_to_file;

    #[test]
    fn test_write_exr() {
        let path = std::env::temp_dir().join("praline_write_exr_test.exr");
        let path = path.to_string_lossy().to_string();
        let image = vec![(0.25, 0.5, 1.0); 6];
        write_exr_to_file(&image, 3, 2, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        std::fs::remove_file(&path).ok();

        assert!(write_exr_to_file(&image, 4, 2, &path).is_err());
    }
}
