use crate::candidate::Candidate;
use crate::config::ScoreParams;
use nalgebra::Point2;
use std::cmp::Ordering;

/*----------------------------------------------------------------------------
Point struct
----------------------------------------------------------------------------*/

/// An observation of the target at one frame.
///
/// `distance` and `score` are fixed at construction from the previous
/// associated point and never change afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub area: f64,
    pub frame: usize,
    pub distance: f64,
    pub score: f64,
}

impl Point {
    /// Create a point, scoring it against `prev` when there is one.
    ///
    /// `score = area_weight * (1 - |norm_area - area|)
    ///          - distance_weight * distance`
    pub fn new(
        x: f64,
        y: f64,
        area: f64,
        frame: usize,
        prev: Option<&Point>,
        params: &ScoreParams,
    ) -> Self {
        let (distance, score) = match prev {
            None => (0.0, 0.0),
            Some(prev) => {
                let distance = euclidean((x, y), prev.coords());
                let score = params.area_weight
                    * (1.0 - (params.norm_area - area).abs())
                    - params.distance_weight * distance;
                (distance, score)
            }
        };
        Self {
            x,
            y,
            area,
            frame,
            distance,
            score,
        }
    }

    pub fn from_candidate(
        candidate: &Candidate,
        frame: usize,
        prev: Option<&Point>,
        params: &ScoreParams,
    ) -> Self {
        Self::new(candidate.x, candidate.y, candidate.area, frame, prev, params)
    }

    /// Copy of this point with its distance measured from `prev` instead.
    ///
    /// The score is left untouched.
    pub(crate) fn rechained(&self, prev: Option<&Point>) -> Self {
        let distance = prev.map_or(0.0, |p| self.distance_to(p));
        Self { distance, ..*self }
    }

    #[inline(always)]
    pub fn coords(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        euclidean(self.coords(), other.coords())
    }
}

pub fn euclidean(a: (f64, f64), b: (f64, f64)) -> f64 {
    nalgebra::distance(&Point2::new(a.0, a.1), &Point2::new(b.0, b.1))
}

/// Order two points by score alone.
pub fn compare_score(a: &Point, b: &Point) -> Ordering {
    a.score.total_cmp(&b.score)
}

/// The highest scoring point; the earliest one wins a tie.
pub fn select_best<I>(points: I) -> Option<Point>
where
    I: IntoIterator<Item = Point>,
{
    points.into_iter().fold(None, |best, point| match best {
        Some(best) if compare_score(&point, &best) != Ordering::Greater => {
            Some(best)
        }
        _ => Some(point),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearly_eq::assert_nearly_eq;

    fn pt(x: f64, y: f64, area: f64, prev: Option<&Point>) -> Point {
        Point::new(x, y, area, 1, prev, &ScoreParams::default())
    }

    #[test]
    fn test_first_point_has_no_distance_or_score() {
        let p = pt(3.0, 4.0, 12.0, None);
        assert_eq!(p.distance, 0.0);
        assert_eq!(p.score, 0.0);
    }

    #[test]
    fn test_score_formula() {
        let prev = pt(0.0, 0.0, 5.0, None);
        let p = pt(3.0, 4.0, 7.0, Some(&prev));

        assert_nearly_eq!(p.distance, 5.0);
        // 4 * (1 - 2) - 1 * 5
        assert_nearly_eq!(p.score, -9.0);
    }

    #[test]
    fn test_closer_candidate_scores_higher() {
        let prev = pt(0.0, 0.0, 5.0, None);
        let near = pt(0.0, 0.0, 5.0, Some(&prev));
        let far = pt(100.0, 100.0, 5.0, Some(&prev));

        assert_eq!(compare_score(&near, &far), Ordering::Greater);
        assert_eq!(select_best(vec![far, near]), Some(near));
    }

    #[test]
    fn test_select_best_keeps_first_on_tie() {
        let prev = pt(0.0, 0.0, 5.0, None);
        let a = pt(0.0, 10.0, 5.0, Some(&prev));
        let b = pt(10.0, 0.0, 5.0, Some(&prev));

        assert_eq!(compare_score(&a, &b), Ordering::Equal);
        assert_eq!(select_best(vec![a, b]), Some(a));
        assert_eq!(select_best(Vec::new()), None);
    }

    #[test]
    fn test_rechained() {
        let a = pt(0.0, 0.0, 5.0, None);
        let b = pt(30.0, 40.0, 5.0, Some(&a));
        let moved = Point { x: 6.0, y: 8.0, ..b };

        assert_nearly_eq!(moved.rechained(Some(&a)).distance, 10.0);
        assert_eq!(moved.rechained(None).distance, 0.0);
        assert_eq!(moved.rechained(Some(&a)).score, b.score);
    }
}
