//! Per-video processing from decoded frames to statistics.
//!
//! A [`VideoPipeline`] is immutable and can be shared between threads; all
//! mutable state of one run lives in a [`PipelineState`] created per video.

use crate::associator::Associator;
use crate::background::BackgroundModel;
use crate::candidate::extract_candidates;
use crate::config::TrackerConfig;
use crate::error::{Result, TrackError};
use crate::export::ResultsTable;
use crate::frame::{common_dimensions, Frame};
use crate::point::Point;
use crate::segmenter::{ForegroundSegmenter, Mask};
use crate::smoother::smooth_tracks;
use crate::statistics::{compute_statistics, ExperimentMeta, Statistics, StatisticsRecord};
use crate::track::{build_tracks, TrackSet};
use image::GrayImage;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Skipped frame ratio above which a run is reported as suspicious.
const SKIPPED_WARN_RATIO: f64 = 0.5;

/*-----------------------------------------------------------------------------
FrameObserver
-----------------------------------------------------------------------------*/

/// Called once per frame after its association is settled.
pub trait FrameObserver {
    fn on_frame(&mut self, frame: &Frame, point: Option<&Point>);
}

/// Observer that ignores every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl FrameObserver for NoopObserver {
    fn on_frame(&mut self, _frame: &Frame, _point: Option<&Point>) {}
}

/*-----------------------------------------------------------------------------
PipelineState
-----------------------------------------------------------------------------*/

/// Mutable state of one video run.
#[derive(Debug)]
pub struct PipelineState {
    associator: Associator,
    integer_centroids: bool,
    points: BTreeMap<usize, Point>,
    empty_frames: usize,
    processed_frames: usize,
}

impl PipelineState {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            associator: Associator::new(config.score_params()),
            integer_centroids: config.integer_centroids,
            points: BTreeMap::new(),
            empty_frames: 0,
            processed_frames: 0,
        }
    }

    /// Feed one segmented frame.
    pub fn observe(&mut self, frame_index: usize, mask: &Mask) -> Option<Point> {
        self.processed_frames += 1;
        if mask.is_empty() {
            self.empty_frames += 1;
            self.associator.mark_skipped(frame_index);
            return None;
        }
        let mut candidates = extract_candidates(mask);
        if self.integer_centroids {
            candidates = candidates.into_iter().map(|c| c.truncated()).collect();
        }
        let point = self.associator.associate(frame_index, &candidates)?;
        self.points.insert(frame_index, point);
        Some(point)
    }

    pub fn points(&self) -> &BTreeMap<usize, Point> {
        &self.points
    }

    pub fn skipped_frames(&self) -> usize {
        self.associator.skipped_frames()
    }

    /// Frames whose mask had no foreground at all.
    pub fn empty_frames(&self) -> usize {
        self.empty_frames
    }

    pub fn processed_frames(&self) -> usize {
        self.processed_frames
    }

    pub fn into_points(self) -> BTreeMap<usize, Point> {
        self.points
    }
}

/*-----------------------------------------------------------------------------
Outputs
-----------------------------------------------------------------------------*/

/// Result of tracking one video.
#[derive(Debug, Clone)]
pub struct TrackingOutcome {
    pub points: BTreeMap<usize, Point>,
    pub tracks: TrackSet,
    pub skipped_frames: usize,
    pub empty_frames: usize,
    pub frame_count: usize,
}

/// Tracks, smoothed tracks and the statistics row of one video.
#[derive(Debug, Clone)]
pub struct VideoAnalysis {
    pub outcome: TrackingOutcome,
    pub smoothed: TrackSet,
    pub statistics: Statistics,
    pub record: StatisticsRecord,
}

/// Everything needed to analyze one video of a batch.
#[derive(Debug, Clone)]
pub struct VideoInput {
    pub video_id: String,
    pub meta: ExperimentMeta,
    pub frames: Vec<Frame>,
    pub fps: f64,
    /// Analyzed frame count used for the velocity; defaults to the number of
    /// frames.
    pub frame_count: Option<usize>,
}

/*-----------------------------------------------------------------------------
VideoPipeline
-----------------------------------------------------------------------------*/

#[derive(Debug, Clone)]
pub struct VideoPipeline {
    config: TrackerConfig,
}

impl VideoPipeline {
    /// # Errors
    /// `InvalidConfig` when the configuration does not validate.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Foreground masks of every frame, without tracking.
    pub fn segment(&self, frames: &[Frame]) -> Result<Vec<Mask>> {
        let background = BackgroundModel::from_frames(frames, self.config.blur_sigma)?;
        let segmenter = ForegroundSegmenter::new(&background, self.config.background_bias);
        frames.iter().map(|f| segmenter.segment(f)).collect()
    }

    /// Background differences of every frame clamped to 8 bits.
    pub fn difference_stack(&self, frames: &[Frame]) -> Result<Vec<GrayImage>> {
        let background = BackgroundModel::from_frames(frames, self.config.blur_sigma)?;
        let segmenter = ForegroundSegmenter::new(&background, self.config.background_bias);
        frames.iter().map(|f| segmenter.difference_image(f)).collect()
    }

    pub fn track(&self, frames: &[Frame]) -> Result<TrackingOutcome> {
        self.track_with_observer(frames, &mut NoopObserver)
    }

    /// Track the target through `frames`, reporting each frame to `observer`.
    ///
    /// # Errors
    /// `InvalidInput` for an empty sequence or frames of different sizes.
    pub fn track_with_observer(
        &self,
        frames: &[Frame],
        observer: &mut dyn FrameObserver,
    ) -> Result<TrackingOutcome> {
        common_dimensions(frames)?;
        let background = BackgroundModel::from_frames(frames, self.config.blur_sigma)?;
        let segmenter = ForegroundSegmenter::new(&background, self.config.background_bias);

        let mut state = PipelineState::new(&self.config);
        for frame in frames {
            let mask = segmenter.segment(frame)?;
            let point = state.observe(frame.index(), &mask);
            observer.on_frame(frame, point.as_ref());
        }

        let skipped_frames = state.skipped_frames();
        let empty_frames = state.empty_frames();
        let frame_count = state.processed_frames();
        if skipped_frames as f64 > SKIPPED_WARN_RATIO * frame_count as f64 {
            log::warn!(
                "{} of {} frames had no detection",
                skipped_frames,
                frame_count
            );
        }

        let points = state.into_points();
        let tracks = build_tracks(&points, self.config.gap_threshold_frames);
        log::info!(
            "tracked {} points in {} tracks over {} frames ({} skipped)",
            points.len(),
            tracks.len(),
            frame_count,
            skipped_frames
        );

        Ok(TrackingOutcome {
            points,
            tracks,
            skipped_frames,
            empty_frames,
            frame_count,
        })
    }

    pub fn smooth(&self, tracks: &TrackSet) -> TrackSet {
        smooth_tracks(
            tracks,
            self.config.smoothing_method,
            self.config.smoothing_window,
            self.config.smoothing_jitter_px,
        )
    }

    /// Track, smooth and summarize one video.
    ///
    /// Statistics use the raw tracks unless `stats_on_smoothed` is set.
    pub fn analyze(&self, input: &VideoInput) -> Result<VideoAnalysis> {
        self.analyze_with_observer(input, &mut NoopObserver)
    }

    pub fn analyze_with_observer(
        &self,
        input: &VideoInput,
        observer: &mut dyn FrameObserver,
    ) -> Result<VideoAnalysis> {
        check_input(input)?;
        let outcome = self.track_with_observer(&input.frames, observer)?;
        let smoothed = self.smooth(&outcome.tracks);

        let frame_count = input.frame_count.unwrap_or(outcome.frame_count);
        let source = if self.config.stats_on_smoothed {
            &smoothed
        } else {
            &outcome.tracks
        };
        let statistics =
            compute_statistics(source, input.fps, frame_count, self.config.static_radius_px)?;
        let record = statistics.clone().into_record(input.video_id.clone(), &input.meta);

        Ok(VideoAnalysis {
            outcome,
            smoothed,
            statistics,
            record,
        })
    }

    /// Analyze one video and append its row to `table`.
    ///
    /// Nothing is written when the analysis fails.
    pub fn analyze_into(
        &self,
        input: &VideoInput,
        table: &ResultsTable,
    ) -> Result<VideoAnalysis> {
        let analysis = self.analyze(input)?;
        table.append(&analysis.record)?;
        Ok(analysis)
    }

    /// Analyze independent videos in parallel, appending one row per
    /// successful video to `table`.
    ///
    /// Results come back in input order; a failed video does not stop the
    /// others.
    pub fn analyze_batch(
        &self,
        inputs: &[VideoInput],
        table: &ResultsTable,
    ) -> Vec<(String, Result<VideoAnalysis>)> {
        inputs
            .par_iter()
            .map(|input| {
                let result = self.analyze_into(input, table);
                if let Err(err) = &result {
                    log::warn!("video {} failed: {}", input.video_id, err);
                }
                (input.video_id.clone(), result)
            })
            .collect()
    }
}

/// Reject inputs that cannot produce a statistics row before any work.
pub fn check_input(input: &VideoInput) -> Result<()> {
    common_dimensions(&input.frames)?;
    if !(input.fps > 0.0) {
        return Err(TrackError::InvalidInput(format!(
            "video {}: fps must be positive, got {}",
            input.video_id, input.fps
        )));
    }
    Ok(())
}
