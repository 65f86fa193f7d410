use crate::error::{Result, TrackError};
use image::{DynamicImage, GrayImage};

/*-----------------------------------------------------------------------------
Frame struct
-----------------------------------------------------------------------------*/

/// One decoded single-channel frame of a video.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    index: usize,
    image: GrayImage,
}

impl Frame {
    pub fn new(index: usize, image: GrayImage) -> Self {
        Self { index, image }
    }

    /// Build a frame from any decoded image, converting it to 8-bit luma.
    pub fn from_dynamic(index: usize, image: DynamicImage) -> Self {
        Self::new(index, image.into_luma8())
    }

    /// Number the images in sequence order.
    pub fn sequence<I>(images: I) -> Vec<Frame>
    where
        I: IntoIterator<Item = GrayImage>,
    {
        images
            .into_iter()
            .enumerate()
            .map(|(index, image)| Frame::new(index, image))
            .collect()
    }

    #[inline(always)]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline(always)]
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    #[inline(always)]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Returns the shared dimensions of `frames`.
///
/// Fails when the sequence is empty or any frame differs in size from the
/// first one.
pub fn common_dimensions(frames: &[Frame]) -> Result<(u32, u32)> {
    let first = frames.first().ok_or_else(|| {
        TrackError::InvalidInput("frame sequence is empty".to_string())
    })?;
    let dims = first.dimensions();
    if let Some(bad) = frames.iter().find(|f| f.dimensions() != dims) {
        let (w, h) = bad.dimensions();
        return Err(TrackError::InvalidInput(format!(
            "frame {} is {}x{}, expected {}x{}",
            bad.index(),
            w,
            h,
            dims.0,
            dims.1
        )));
    }
    Ok(dims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn test_sequence_numbers_frames() {
        let frames = Frame::sequence(vec![
            GrayImage::new(4, 4),
            GrayImage::new(4, 4),
            GrayImage::new(4, 4),
        ]);
        let indices: Vec<usize> = frames.iter().map(|f| f.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_from_dynamic_converts_to_luma() {
        let rgb = RgbImage::from_pixel(3, 2, Rgb([255, 255, 255]));
        let frame = Frame::from_dynamic(7, DynamicImage::ImageRgb8(rgb));
        assert_eq!(frame.index(), 7);
        assert_eq!(frame.dimensions(), (3, 2));
        assert_eq!(*frame.image().get_pixel(0, 0), Luma([255]));
    }

    #[test]
    fn test_common_dimensions_empty() {
        let result = common_dimensions(&[]);
        assert!(matches!(result, Err(TrackError::InvalidInput(_))));
    }

    #[test]
    fn test_common_dimensions_mismatch() {
        let frames = vec![
            Frame::new(0, GrayImage::new(4, 4)),
            Frame::new(1, GrayImage::new(5, 4)),
        ];
        let result = common_dimensions(&frames);
        assert!(matches!(result, Err(TrackError::InvalidInput(_))));
    }

    #[test]
    fn test_common_dimensions_ok() {
        let frames = Frame::sequence(vec![GrayImage::new(6, 3); 2]);
        assert_eq!(common_dimensions(&frames).unwrap(), (6, 3));
    }
}
