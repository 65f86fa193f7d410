use crate::point::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum number of points a track needs to be kept.
pub const MIN_TRACK_LEN: usize = 2;

/*----------------------------------------------------------------------------
Track struct
----------------------------------------------------------------------------*/

/// A temporally contiguous run of associated points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    points: Vec<Point>,
}

impl Track {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_frame(&self) -> Option<usize> {
        self.points.first().map(|p| p.frame)
    }

    pub fn last_frame(&self) -> Option<usize> {
        self.points.last().map(|p| p.frame)
    }

    /// Sum of the stored per-point distances.
    pub fn path_length(&self) -> f64 {
        self.points.iter().map(|p| p.distance).sum()
    }

    pub(crate) fn push(&mut self, point: Point) {
        self.points.push(point);
    }
}

/*----------------------------------------------------------------------------
TrackSet struct
----------------------------------------------------------------------------*/

/// One row of the per-point export table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackRow {
    pub frame: usize,
    #[serde(rename = "track")]
    pub track_id: usize,
    pub x: f64,
    pub y: f64,
    pub distance: f64,
}

/// All tracks of one video in order of first appearance.
///
/// The id of a track is its position in the set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackSet {
    tracks: Vec<Track>,
}

impl TrackSet {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.tracks.iter().map(Track::len).sum()
    }

    /// Every point tagged with its track id, ordered by frame.
    ///
    /// Points of different tracks sharing a frame keep track id order.
    pub fn merged_points(&self) -> Vec<(usize, &Point)> {
        let mut merged: Vec<(usize, &Point)> = self
            .tracks
            .iter()
            .enumerate()
            .flat_map(|(id, track)| track.points().iter().map(move |p| (id, p)))
            .collect();
        merged.sort_by_key(|(id, p)| (p.frame, *id));
        merged
    }

    pub fn rows(&self) -> Vec<TrackRow> {
        self.merged_points()
            .into_iter()
            .map(|(track_id, p)| TrackRow {
                frame: p.frame,
                track_id,
                x: p.x,
                y: p.y,
                distance: p.distance,
            })
            .collect()
    }

    /// Apply `f` to every track, keeping the order.
    pub fn map_tracks<F>(&self, f: F) -> TrackSet
    where
        F: FnMut(&Track) -> Track,
    {
        TrackSet::new(self.tracks.iter().map(f).collect())
    }
}

impl IntoIterator for TrackSet {
    type Item = Track;
    type IntoIter = std::vec::IntoIter<Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.into_iter()
    }
}

/*----------------------------------------------------------------------------
Track building
----------------------------------------------------------------------------*/

/// Split the associated points into tracks.
///
/// A new track starts whenever two consecutive points are more than
/// `gap_threshold` frames apart. Points are moved as they are: the first
/// point of a later track keeps the distance measured at association time,
/// across the gap. Tracks with fewer than two points are dropped.
pub fn build_tracks(
    points: &BTreeMap<usize, Point>,
    gap_threshold: usize,
) -> TrackSet {
    let mut tracks = Vec::new();
    let mut current = Track::default();
    let mut prev_frame: Option<usize> = None;

    for (&frame, point) in points.iter() {
        if let Some(prev) = prev_frame {
            if frame - prev > gap_threshold {
                tracks.push(std::mem::take(&mut current));
            }
        }
        current.push(*point);
        prev_frame = Some(frame);
    }
    tracks.push(current);

    let before = tracks.len();
    tracks.retain(|t| t.len() >= MIN_TRACK_LEN);
    log::debug!(
        "built {} tracks from {} points ({} too short)",
        tracks.len(),
        points.len(),
        before - tracks.len()
    );
    TrackSet::new(tracks)
}
