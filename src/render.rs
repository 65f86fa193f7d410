//! Track overlays. Nothing here feeds back into tracking.

use crate::frame::Frame;
use crate::pipeline::FrameObserver;
use crate::point::Point;
use crate::track::TrackSet;
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use std::collections::VecDeque;

/// Radius of the marker drawn around the current point.
pub const MARKER_RADIUS: i32 = 15;
/// Number of past points kept in the preview trail.
pub const TRAIL_LENGTH: usize = 1000;

/// Fully saturated, full value color at `hue` in `[0, 1)`.
pub fn hue_color(hue: f64) -> Rgb<u8> {
    let h = hue.rem_euclid(1.0) * 6.0;
    let sector = h.floor() as u32;
    let f = h - h.floor();
    let (r, g, b) = match sector {
        0 => (1.0, f, 0.0),
        1 => (1.0 - f, 1.0, 0.0),
        2 => (0.0, 1.0, f),
        3 => (0.0, 1.0 - f, 1.0),
        4 => (f, 0.0, 1.0),
        _ => (1.0, 0.0, 1.0 - f),
    };
    Rgb([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8])
}

fn to_rgb(image: &GrayImage) -> RgbImage {
    DynamicImage::ImageLuma8(image.clone()).into_rgb8()
}

/// Draw every track as a polyline over `reference`, one hue per track.
pub fn render_track_image(reference: &GrayImage, tracks: &TrackSet) -> RgbImage {
    let mut canvas = to_rgb(reference);
    let count = tracks.len().max(1) as f64;
    for (i, track) in tracks.tracks().iter().enumerate() {
        let color = hue_color(i as f64 / count);
        for pair in track.points().windows(2) {
            draw_line_segment_mut(
                &mut canvas,
                (pair[0].x as f32, pair[0].y as f32),
                (pair[1].x as f32, pair[1].y as f32),
                color,
            );
        }
    }
    canvas
}

/*-----------------------------------------------------------------------------
TrailRenderer
-----------------------------------------------------------------------------*/

/// Live preview: circles the current point and draws a rainbow trail of the
/// recent points on each frame, then hands the picture to a sink.
pub struct TrailRenderer<F>
where
    F: FnMut(usize, &RgbImage),
{
    trail: VecDeque<(f64, f64)>,
    capacity: usize,
    sink: F,
}

impl<F> TrailRenderer<F>
where
    F: FnMut(usize, &RgbImage),
{
    pub fn new(sink: F) -> Self {
        Self::with_capacity(TRAIL_LENGTH, sink)
    }

    pub fn with_capacity(capacity: usize, sink: F) -> Self {
        Self {
            trail: VecDeque::with_capacity(capacity.min(TRAIL_LENGTH)),
            capacity: capacity.max(1),
            sink,
        }
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    fn draw(&self, frame: &Frame, point: &Point) -> RgbImage {
        let mut canvas = to_rgb(frame.image());
        draw_hollow_circle_mut(
            &mut canvas,
            (point.x.round() as i32, point.y.round() as i32),
            MARKER_RADIUS,
            Rgb([255, 0, 0]),
        );
        let n = self.trail.len() as f64;
        for (j, (a, b)) in self.trail.iter().zip(self.trail.iter().skip(1)).enumerate() {
            draw_line_segment_mut(
                &mut canvas,
                (a.0 as f32, a.1 as f32),
                (b.0 as f32, b.1 as f32),
                hue_color((j + 1) as f64 / n),
            );
        }
        canvas
    }
}

impl<F> FrameObserver for TrailRenderer<F>
where
    F: FnMut(usize, &RgbImage),
{
    fn on_frame(&mut self, frame: &Frame, point: Option<&Point>) {
        // frames without an association are not shown
        let Some(point) = point else {
            return;
        };
        if self.trail.len() == self.capacity {
            self.trail.pop_front();
        }
        self.trail.push_back(point.coords());
        let canvas = self.draw(frame, point);
        (self.sink)(frame.index(), &canvas);
    }
}
