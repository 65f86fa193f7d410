//! Single target association.
//!
//! The associator remembers the last point it emitted and picks, for every
//! new frame, the candidate that best matches it. It is a greedy nearest
//! plausible blob rule: a spurious blob that is closer or closer in size than
//! the real target will capture the track.

use crate::candidate::Candidate;
use crate::config::ScoreParams;
use crate::point::{select_best, Point};

/*-----------------------------------------------------------------------------
Associator
-----------------------------------------------------------------------------*/

#[derive(Debug, Clone)]
pub struct Associator {
    params: ScoreParams,
    last_point: Option<Point>,
    skipped_frames: usize,
    associated_frames: usize,
}

impl Associator {
    pub fn new(params: ScoreParams) -> Self {
        Self {
            params,
            last_point: None,
            skipped_frames: 0,
            associated_frames: 0,
        }
    }

    /// Choose the candidate representing the target in `frame`.
    ///
    /// Without a previous point the largest candidate is taken. Otherwise
    /// every candidate is scored against the last associated point and the
    /// best one wins. Returns `None` and counts the frame as skipped when
    /// there is no candidate; the last point is then kept as reference.
    pub fn associate(
        &mut self,
        frame: usize,
        candidates: &[Candidate],
    ) -> Option<Point> {
        let chosen = match self.last_point {
            None => largest(candidates)
                .map(|c| Point::from_candidate(c, frame, None, &self.params)),
            Some(prev) => select_best(candidates.iter().map(|c| {
                Point::from_candidate(c, frame, Some(&prev), &self.params)
            })),
        };

        match chosen {
            Some(point) => {
                log::trace!(
                    "frame {}: associated ({:.1}, {:.1}) area {:.1} score {:.2} out of {} candidates",
                    frame,
                    point.x,
                    point.y,
                    point.area,
                    point.score,
                    candidates.len()
                );
                self.last_point = Some(point);
                self.associated_frames += 1;
            }
            None => self.mark_skipped(frame),
        }
        chosen
    }

    /// Count a frame that produced no association.
    pub fn mark_skipped(&mut self, frame: usize) {
        log::trace!("frame {}: no candidate, skipped", frame);
        self.skipped_frames += 1;
    }

    pub fn last_point(&self) -> Option<&Point> {
        self.last_point.as_ref()
    }

    pub fn skipped_frames(&self) -> usize {
        self.skipped_frames
    }

    pub fn associated_frames(&self) -> usize {
        self.associated_frames
    }
}

/// The candidate with the largest area, the first one on ties.
fn largest(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().fold(None, |best, c| match best {
        Some(b) if c.area <= b.area => Some(b),
        _ => Some(c),
    })
}
