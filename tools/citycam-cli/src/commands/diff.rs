//! Score the change between two still images.

use std::path::{Path, PathBuf};

use citycam_motion_core::frame::{FRAME_HEIGHT, FRAME_WIDTH};
use citycam_motion_core::{frame_difference, FrameSample};
use image::imageops::{self, FilterType};
use image::RgbImage;

/// Stretch an image onto the fixed motion grid.
fn sample_from_image(img: &RgbImage) -> Option<FrameSample> {
    let resized = imageops::resize(
        img,
        FRAME_WIDTH as u32,
        FRAME_HEIGHT as u32,
        FilterType::Triangle,
    );
    FrameSample::from_packed(resized.into_raw())
}

fn load_sample(path: &Path) -> anyhow::Result<FrameSample> {
    let img = image::open(path)
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {e}", path.display()))?
        .to_rgb8();
    sample_from_image(&img).ok_or_else(|| anyhow::anyhow!("{} has no pixels", path.display()))
}

pub fn run(a: PathBuf, b: PathBuf) -> anyhow::Result<()> {
    let first = load_sample(&a)?;
    let second = load_sample(&b)?;
    let score = frame_difference(Some(&first), Some(&second));
    tracing::debug!(a = %a.display(), b = %b.display(), score, "Images compared");
    println!("{score:.4}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn test_solid_image_maps_to_solid_sample() {
        let img = RgbImage::from_pixel(320, 180, Rgb([10, 20, 30]));
        let sample = sample_from_image(&img).unwrap();
        assert_eq!(sample, FrameSample::filled([10, 20, 30]));
    }

    #[test]
    fn test_small_image_is_stretched() {
        let img = RgbImage::from_pixel(8, 5, Rgb([200, 200, 200]));
        let sample = sample_from_image(&img).unwrap();
        assert_eq!(sample.pixel(79, 44), Some([200, 200, 200]));
    }

    #[test]
    fn test_changed_half_scores_high() {
        let dark = RgbImage::from_pixel(640, 360, Rgb([0, 0, 0]));
        let mut lit = dark.clone();
        for y in 0..180 {
            for x in 0..640 {
                lit.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let a = sample_from_image(&dark).unwrap();
        let b = sample_from_image(&lit).unwrap();
        assert_eq!(frame_difference(Some(&a), Some(&a)), 0.0);
        assert_eq!(frame_difference(Some(&a), Some(&b)), 1.0);
    }
}
