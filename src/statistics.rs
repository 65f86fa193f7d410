use crate::error::{Result, TrackError};
use crate::point::Point;
use crate::smoother::mean;
use crate::track::TrackSet;
use serde::{Deserialize, Serialize};

/*-----------------------------------------------------------------------------
Records
-----------------------------------------------------------------------------*/

/// Free-form description of the experiment a video belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentMeta {
    pub date: String,
    /// Symbiont or any other group label.
    pub label: String,
    /// Days post fertilization.
    pub dpf: u32,
    /// Days post infection.
    pub dpi: u32,
}

/// One results table row. Field names are the table's column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRecord {
    #[serde(rename = "video")]
    pub video_id: String,
    pub date: String,
    #[serde(rename = "symbiont")]
    pub label: String,
    pub dpf: u32,
    pub dpi: u32,
    #[serde(rename = "average velocity [px/s]")]
    pub avg_velocity: f64,
    #[serde(rename = "total distance")]
    pub total_distance: f64,
    #[serde(rename = "average static time")]
    pub avg_static_time: f64,
}

/// Kinematic summary of one video.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub total_distance: f64,
    pub avg_velocity: f64,
    /// Lengths, in points, of every static run that ended.
    pub static_runs: Vec<usize>,
    pub avg_static_time: f64,
}

impl Statistics {
    pub fn into_record(
        self,
        video_id: impl Into<String>,
        meta: &ExperimentMeta,
    ) -> StatisticsRecord {
        StatisticsRecord {
            video_id: video_id.into(),
            date: meta.date.clone(),
            label: meta.label.clone(),
            dpf: meta.dpf,
            dpi: meta.dpi,
            avg_velocity: self.avg_velocity,
            total_distance: self.total_distance,
            avg_static_time: self.avg_static_time,
        }
    }
}

/*-----------------------------------------------------------------------------
Static runs
-----------------------------------------------------------------------------*/

/// Lengths of the runs of points that stay within `radius` of a reference.
///
/// The first point is the initial reference and is not part of any run. A
/// point within `radius` of the reference extends the current run, or opens
/// one of length 1. A point beyond `radius` closes the current run, if any,
/// and becomes the new reference. A run still open after the last point is
/// not reported.
pub fn static_runs<'a, I>(points: I, radius: f64) -> Vec<usize>
where
    I: IntoIterator<Item = &'a Point>,
{
    let mut runs = Vec::new();
    let mut points = points.into_iter();
    let Some(mut reference) = points.next() else {
        return runs;
    };

    let mut run = 0usize;
    for point in points {
        if point.distance_to(reference) <= radius {
            run += 1;
        } else {
            if run > 0 {
                runs.push(run);
                run = 0;
            }
            reference = point;
        }
    }
    runs
}

/*-----------------------------------------------------------------------------
Aggregation
-----------------------------------------------------------------------------*/

/// Summarize the tracks of one video.
///
/// # Arguments
/// * `tracks` - Raw or smoothed tracks
/// * `fps` - Frame rate of the video
/// * `frame_count` - Number of analyzed frames
/// * `static_radius` - Radius of a static run in pixels (default: 15)
///
/// # Errors
/// `InvalidInput` when `fps` is not positive or `frame_count` is zero.
pub fn compute_statistics(
    tracks: &TrackSet,
    fps: f64,
    frame_count: usize,
    static_radius: f64,
) -> Result<Statistics> {
    if !(fps > 0.0) || !fps.is_finite() {
        return Err(TrackError::InvalidInput(format!(
            "fps must be positive, got {fps}"
        )));
    }
    if frame_count == 0 {
        return Err(TrackError::InvalidInput(
            "frame count must be positive".to_string(),
        ));
    }

    let merged = tracks.merged_points();
    let total_distance: f64 = merged.iter().map(|(_, p)| p.distance).sum();
    let runs = static_runs(merged.iter().map(|(_, p)| *p), static_radius);

    let duration = frame_count as f64 / fps;
    let lengths: Vec<f64> = runs.iter().map(|&r| r as f64).collect();
    let avg_static_time = mean(&lengths).map_or(0.0, |m| m / fps);

    Ok(Statistics {
        total_distance,
        avg_velocity: total_distance / duration,
        static_runs: runs,
        avg_static_time,
    })
}
