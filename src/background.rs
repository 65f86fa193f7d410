use crate::error::{Result, TrackError};
use crate::frame::{common_dimensions, Frame};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::gaussian_blur_f32;

/// Single channel `f32` image used for intermediate intensity maps.
pub type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/*-----------------------------------------------------------------------------
BackgroundModel
-----------------------------------------------------------------------------*/

/// Blurred temporal mean of every frame of one video.
#[derive(Debug, Clone)]
pub struct BackgroundModel {
    image: FloatImage,
    blur_sigma: f32,
}

impl BackgroundModel {
    /// Average all frames pixel by pixel and blur the result.
    ///
    /// # Arguments
    /// * `frames` - Every frame of the video, all of the same size
    /// * `blur_sigma` - Standard deviation of the Gaussian blur (default: 3)
    ///
    /// # Errors
    /// `InvalidInput` for an empty sequence or mismatched frame sizes,
    /// `InvalidConfig` for a non-positive sigma.
    pub fn from_frames(frames: &[Frame], blur_sigma: f32) -> Result<Self> {
        if !(blur_sigma > 0.0) {
            return Err(TrackError::InvalidConfig(format!(
                "blur_sigma must be positive, got {blur_sigma}"
            )));
        }
        let (width, height) = common_dimensions(frames)?;

        let mut sums = vec![0.0f64; (width as usize) * (height as usize)];
        for frame in frames {
            for (sum, pixel) in sums.iter_mut().zip(frame.image().pixels()) {
                *sum += pixel[0] as f64;
            }
        }
        let count = frames.len() as f64;
        let mean: Vec<f32> =
            sums.into_iter().map(|s| (s / count) as f32).collect();
        let mean = FloatImage::from_raw(width, height, mean).ok_or_else(|| {
            TrackError::InvalidInput(format!(
                "cannot build a {width}x{height} mean image"
            ))
        })?;

        log::debug!(
            "background model built from {} frames of {}x{}",
            frames.len(),
            width,
            height
        );

        Ok(Self {
            image: gaussian_blur_f32(&mean, blur_sigma),
            blur_sigma,
        })
    }

    pub fn image(&self) -> &FloatImage {
        &self.image
    }

    pub fn blur_sigma(&self) -> f32 {
        self.blur_sigma
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Blur a frame with the parameters the background was built with.
    pub fn blur_frame(&self, image: &GrayImage) -> FloatImage {
        let float = FloatImage::from_fn(image.width(), image.height(), |x, y| {
            Luma([image.get_pixel(x, y)[0] as f32])
        });
        gaussian_blur_f32(&float, self.blur_sigma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearly_eq::assert_nearly_eq;

    fn flat(index: usize, value: u8) -> Frame {
        Frame::new(index, GrayImage::from_pixel(8, 8, Luma([value])))
    }

    #[test]
    fn test_mean_of_flat_frames() {
        let frames = vec![flat(0, 100), flat(1, 200), flat(2, 150)];
        let model = BackgroundModel::from_frames(&frames, 3.0).unwrap();

        assert_eq!(model.dimensions(), (8, 8));
        // blurring a constant image keeps it constant
        for pixel in model.image().pixels() {
            assert_nearly_eq!(pixel[0], 150.0f32, 1e-3);
        }
    }

    #[test]
    fn test_empty_sequence() {
        let result = BackgroundModel::from_frames(&[], 3.0);
        assert!(matches!(result, Err(TrackError::InvalidInput(_))));
    }

    #[test]
    fn test_mismatched_dimensions() {
        let frames = vec![
            flat(0, 10),
            Frame::new(1, GrayImage::from_pixel(4, 8, Luma([10]))),
        ];
        let result = BackgroundModel::from_frames(&frames, 3.0);
        assert!(matches!(result, Err(TrackError::InvalidInput(_))));
    }

    #[test]
    fn test_non_positive_sigma() {
        let result = BackgroundModel::from_frames(&[flat(0, 1)], 0.0);
        assert!(matches!(result, Err(TrackError::InvalidConfig(_))));
    }

    #[test]
    fn test_blur_frame_keeps_size() {
        let model = BackgroundModel::from_frames(&[flat(0, 50)], 1.5).unwrap();
        let blurred = model.blur_frame(&GrayImage::from_pixel(8, 8, Luma([50])));
        assert_eq!(blurred.dimensions(), (8, 8));
        assert_nearly_eq!(blurred.get_pixel(4, 4)[0], 50.0f32, 1e-3);
    }
}
