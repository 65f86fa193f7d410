use crate::config::SmoothingMethod;
use crate::point::Point;
use crate::track::{Track, TrackSet};
use num::Float;

/*-----------------------------------------------------------------------------
Aggregation helpers
-----------------------------------------------------------------------------*/

pub fn mean<T: Float>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let sum = values.iter().fold(T::zero(), |acc, &v| acc + v);
    T::from(values.len()).map(|n| sum / n)
}

/// Median; the mean of the two middle values for an even count.
pub fn median<T: Float>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        let two = T::one() + T::one();
        Some((sorted[mid - 1] + sorted[mid]) / two)
    }
}

impl SmoothingMethod {
    pub fn aggregate(&self, values: &[f64]) -> Option<f64> {
        match self {
            SmoothingMethod::Mean => mean(values),
            SmoothingMethod::Median => median(values),
        }
    }

    /// Collapse a window of points into one representative point.
    ///
    /// Coordinates and area are aggregated independently. The point takes
    /// the frame of the first point of the window and has no score.
    pub fn collapse(&self, window: &[Point]) -> Option<Point> {
        let first = window.first()?;
        let xs: Vec<f64> = window.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = window.iter().map(|p| p.y).collect();
        let areas: Vec<f64> = window.iter().map(|p| p.area).collect();
        Some(Point {
            x: self.aggregate(&xs)?,
            y: self.aggregate(&ys)?,
            area: self.aggregate(&areas)?,
            frame: first.frame,
            distance: 0.0,
            score: 0.0,
        })
    }
}

/// Sum of the distances between neighbouring points of the window, leaving
/// out the step into the last point.
pub fn window_jitter(window: &[Point]) -> f64 {
    window
        .windows(2)
        .take(window.len().saturating_sub(2))
        .map(|pair| pair[0].distance_to(&pair[1]))
        .sum()
}

/*-----------------------------------------------------------------------------
Track smoothing
-----------------------------------------------------------------------------*/

/// Smooth a track over non-overlapping windows of `window_size` points.
///
/// A full window whose jitter (see [`window_jitter`]) stays below
/// `jitter_threshold` is replaced by one representative point; a faster
/// window is kept as is. A trailing window shorter than `window_size` is
/// always collapsed. Distances of the
/// returned points are measured between consecutive output points.
pub fn smooth_track(
    track: &Track,
    method: SmoothingMethod,
    window_size: usize,
    jitter_threshold: f64,
) -> Track {
    let window_size = window_size.max(1);
    let mut smoothed: Vec<Point> = Vec::with_capacity(track.len());

    for window in track.points().chunks(window_size) {
        let collapse = window.len() < window_size
            || window_jitter(window) < jitter_threshold;
        if collapse {
            if let Some(point) = method.collapse(window) {
                push_chained(&mut smoothed, point);
            }
        } else {
            for point in window {
                push_chained(&mut smoothed, *point);
            }
        }
    }

    log::trace!(
        "smoothed track of {} points into {} points",
        track.len(),
        smoothed.len()
    );
    Track::new(smoothed)
}

pub fn smooth_tracks(
    tracks: &TrackSet,
    method: SmoothingMethod,
    window_size: usize,
    jitter_threshold: f64,
) -> TrackSet {
    tracks.map_tracks(|t| smooth_track(t, method, window_size, jitter_threshold))
}

fn push_chained(points: &mut Vec<Point>, point: Point) {
    let chained = point.rechained(points.last());
    points.push(chained);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoreParams;
    use nearly_eq::assert_nearly_eq;

    fn linear_track(n: usize, step: f64) -> Track {
        let params = ScoreParams::default();
        let mut points: Vec<Point> = Vec::new();
        for i in 0..n {
            let prev = points.last().copied();
            points.push(Point::new(
                10.0,
                10.0 + step * i as f64,
                5.0,
                i,
                prev.as_ref(),
                &params,
            ));
        }
        Track::new(points)
    }

    #[test]
    fn test_mean_and_median() {
        assert_nearly_eq!(mean(&[1.0, 2.0, 6.0]).unwrap(), 3.0);
        assert_nearly_eq!(median(&[9.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_nearly_eq!(median(&[4.0, 1.0, 2.0, 3.0]).unwrap(), 2.5);
        assert!(mean::<f64>(&[]).is_none());
        assert!(median::<f32>(&[]).is_none());
    }

    #[test]
    fn test_slow_windows_collapse() {
        let track = linear_track(20, 0.5);
        let smoothed = smooth_track(&track, SmoothingMethod::Mean, 10, 10.0);

        assert_eq!(smoothed.len(), 2);
        let p = smoothed.points();
        assert_eq!(p[0].frame, 0);
        assert_eq!(p[1].frame, 10);
        // mean of 10 + 0.5 * (0..10)
        assert_nearly_eq!(p[0].y, 12.25, 1e-9);
        assert_nearly_eq!(p[1].y, 17.25, 1e-9);
        assert_eq!(p[0].distance, 0.0);
        assert_nearly_eq!(p[1].distance, 5.0, 1e-9);
    }

    #[test]
    fn test_fast_windows_kept() {
        let track = linear_track(20, 12.0);
        let smoothed = smooth_track(&track, SmoothingMethod::Mean, 10, 10.0);

        assert_eq!(smoothed.len(), 20);
        for (a, b) in smoothed.points().iter().zip(track.points()) {
            assert_eq!(a.coords(), b.coords());
            assert_nearly_eq!(a.distance, b.distance, 1e-9);
        }
    }

    #[test]
    fn test_trailing_partial_window_always_collapses() {
        let track = linear_track(13, 12.0);
        let smoothed = smooth_track(&track, SmoothingMethod::Median, 10, 10.0);

        assert_eq!(smoothed.len(), 11);
        let last = smoothed.points()[10];
        assert_eq!(last.frame, 10);
        // median of frames 10..13
        assert_nearly_eq!(last.y, 10.0 + 12.0 * 11.0, 1e-9);
        assert_nearly_eq!(last.distance, 24.0, 1e-9);
    }

    #[test]
    fn test_short_track_collapses_to_one_point() {
        let track = linear_track(3, 50.0);
        let smoothed = smooth_track(&track, SmoothingMethod::Mean, 10, 10.0);
        assert_eq!(smoothed.len(), 1);
        assert_nearly_eq!(smoothed.points()[0].y, 60.0, 1e-9);
    }

    #[test]
    fn test_jitter_skips_last_step() {
        let track = linear_track(4, 3.0);
        assert_nearly_eq!(window_jitter(track.points()), 6.0, 1e-9);
        assert_eq!(window_jitter(&track.points()[..2]), 0.0);
        assert_eq!(window_jitter(&track.points()[..1]), 0.0);
    }

    #[test]
    fn test_window_below_threshold_without_last_step_collapses() {
        // eight steps of 1.2 px stay under 10 px, nine would not
        let track = linear_track(11, 1.2);
        let smoothed = smooth_track(&track, SmoothingMethod::Mean, 10, 10.0);

        assert_eq!(smoothed.len(), 2);
        assert_eq!(smoothed.points()[0].frame, 0);
        assert_eq!(smoothed.points()[1].frame, 10);
        assert_nearly_eq!(smoothed.points()[0].y, 10.0 + 1.2 * 4.5, 1e-9);
    }

    #[test]
    fn test_smooth_tracks_keeps_order() {
        let set = TrackSet::new(vec![linear_track(10, 0.1), linear_track(10, 20.0)]);
        let smoothed = smooth_tracks(&set, SmoothingMethod::Mean, 10, 10.0);

        assert_eq!(smoothed.len(), 2);
        assert_eq!(smoothed.tracks()[0].len(), 1);
        assert_eq!(smoothed.tracks()[1].len(), 10);
    }
}
