use crate::background::{BackgroundModel, FloatImage};
use crate::error::{Result, TrackError};
use crate::frame::Frame;
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};

/// Lower bound of the difference counted as foreground.
const MASK_LOW: f32 = 1.0;
/// Upper bound of the difference counted as foreground.
const MASK_HIGH: f32 = 256.0;

/*-----------------------------------------------------------------------------
Mask
-----------------------------------------------------------------------------*/

/// Binary foreground mask, 255 for foreground and 0 for background.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    pub fn new(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// True when no pixel is set.
    pub fn is_empty(&self) -> bool {
        self.image.pixels().all(|p| p[0] == 0)
    }

    pub fn foreground_pixels(&self) -> usize {
        self.image.pixels().filter(|p| p[0] != 0).count()
    }
}

/*-----------------------------------------------------------------------------
ForegroundSegmenter
-----------------------------------------------------------------------------*/

/// Background subtraction against a fixed [`BackgroundModel`].
#[derive(Debug)]
pub struct ForegroundSegmenter<'a> {
    background: &'a BackgroundModel,
    bias: f32,
}

impl<'a> ForegroundSegmenter<'a> {
    /// # Arguments
    /// * `background` - Blurred mean of the video
    /// * `bias` - Minimum intensity drop counted as foreground (default: 30)
    pub fn new(background: &'a BackgroundModel, bias: f32) -> Self {
        Self { background, bias }
    }

    /// `(background - bias) - blur(frame)` for every pixel.
    pub fn difference(&self, frame: &Frame) -> Result<FloatImage> {
        if frame.dimensions() != self.background.dimensions() {
            let (w, h) = frame.dimensions();
            let (bw, bh) = self.background.dimensions();
            return Err(TrackError::InvalidInput(format!(
                "frame {} is {}x{}, background is {}x{}",
                frame.index(),
                w,
                h,
                bw,
                bh
            )));
        }

        let blurred = self.background.blur_frame(frame.image());
        let background = self.background.image();
        let bias = self.bias;
        Ok(FloatImage::from_fn(blurred.width(), blurred.height(), |x, y| {
            let bg = background.get_pixel(x, y)[0];
            let fg = blurred.get_pixel(x, y)[0];
            Luma([(bg - bias) - fg])
        }))
    }

    /// Difference image clamped to 8 bits, for inspection.
    pub fn difference_image(&self, frame: &Frame) -> Result<GrayImage> {
        let diff = self.difference(frame)?;
        Ok(GrayImage::from_fn(diff.width(), diff.height(), |x, y| {
            Luma([diff.get_pixel(x, y)[0].clamp(0.0, 255.0) as u8])
        }))
    }

    /// Threshold the difference and clean it with one dilation followed by
    /// one erosion over a 3x3 neighbourhood.
    pub fn segment(&self, frame: &Frame) -> Result<Mask> {
        let diff = self.difference(frame)?;
        let raw = GrayImage::from_fn(diff.width(), diff.height(), |x, y| {
            let value = diff.get_pixel(x, y)[0];
            if (MASK_LOW..=MASK_HIGH).contains(&value) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        let closed = erode(&dilate(&raw, Norm::LInf, 1), Norm::LInf, 1);
        Ok(Mask::new(closed))
    }
}
