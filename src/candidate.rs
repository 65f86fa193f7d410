use crate::segmenter::Mask;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point as PixelPoint;

/*-----------------------------------------------------------------------------
Moments
-----------------------------------------------------------------------------*/

/// Spatial moments of a closed polygon, up to first order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    /// Moments of the polygon traced by `points` using Green's theorem.
    ///
    /// The sign is normalized so that `m00` is the (non-negative) enclosed
    /// area regardless of the traversal direction.
    pub fn from_polygon(points: &[PixelPoint<i32>]) -> Self {
        let n = points.len();
        if n < 3 {
            return Self::default();
        }

        let mut a00 = 0.0;
        let mut a10 = 0.0;
        let mut a01 = 0.0;
        for i in 0..n {
            let p = points[i];
            let q = points[(i + 1) % n];
            let (xi, yi) = (p.x as f64, p.y as f64);
            let (xj, yj) = (q.x as f64, q.y as f64);
            let cross = xi * yj - xj * yi;
            a00 += cross;
            a10 += cross * (xi + xj);
            a01 += cross * (yi + yj);
        }

        let sign = if a00 < 0.0 { -1.0 } else { 1.0 };
        Self {
            m00: sign * a00 / 2.0,
            m10: sign * a10 / 6.0,
            m01: sign * a01 / 6.0,
        }
    }

    /// Centroid `(m10 / m00, m01 / m00)`, or `None` for a zero-area shape.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00 == 0.0 {
            return None;
        }
        Some((self.m10 / self.m00, self.m01 / self.m00))
    }
}

/*-----------------------------------------------------------------------------
Candidate
-----------------------------------------------------------------------------*/

/// One connected foreground region of a mask.
///
/// The centroid keeps sub-pixel precision, so distances between points and
/// static runs can differ slightly from a tracker working on whole pixels.
/// [`Candidate::truncated`] gives the whole-pixel position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub x: f64,
    pub y: f64,
    pub area: f64,
}

impl Candidate {
    pub fn new(x: f64, y: f64, area: f64) -> Self {
        Self { x, y, area }
    }

    /// `None` when the moments describe a degenerate, zero-area contour.
    pub fn from_moments(moments: &Moments) -> Option<Self> {
        let (x, y) = moments.centroid()?;
        Some(Self::new(x, y, moments.m00))
    }

    /// Candidate with its centroid truncated toward zero to whole pixels.
    pub fn truncated(self) -> Self {
        Self {
            x: self.x.trunc(),
            y: self.y.trunc(),
            ..self
        }
    }
}

/// Find the outermost contours of `mask` and turn each into a candidate.
///
/// Holes and regions nested inside holes are ignored. Contours enclosing no
/// area (single pixels, one pixel wide lines) are skipped.
pub fn extract_candidates(mask: &Mask) -> Vec<Candidate> {
    let contours = find_contours::<i32>(mask.image());
    let mut candidates = Vec::new();
    for contour in contours.iter() {
        if contour.border_type != BorderType::Outer || contour.parent.is_some()
        {
            continue;
        }
        let moments = Moments::from_polygon(&contour.points);
        match Candidate::from_moments(&moments) {
            Some(candidate) => candidates.push(candidate),
            None => log::trace!(
                "skipping degenerate contour with {} points",
                contour.points.len()
            ),
        }
    }
    candidates
}
