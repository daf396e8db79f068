//! Exact decomposition of a periodic B-spline into Bezier segments.
//!
//! Raising every breakpoint to multiplicity `k + 1` removes all continuity
//! constraints between neighboring polynomial pieces. At that point the
//! B-spline coefficients of each piece are exactly its Bezier control points.

use kurbo::Point;

use super::{insert_knot, Coefficients, PeriodicSpline};
use crate::error::TraceError;

/// One polynomial piece of degree `k`: start, `k - 1` inner points, end.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierSegment {
    points: Vec<Point>,
}

impl BezierSegment {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn degree(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Point at local parameter `t ∈ [0, 1]` (de Casteljau).
    pub fn eval(&self, t: f64) -> Point {
        let mut work = self.points.clone();
        for level in 1..work.len() {
            for i in 0..work.len() - level {
                work[i] = work[i].lerp(work[i + 1], t);
            }
        }
        work[0]
    }
}

/// Parameter values where the closed curve's pieces join, including both
/// ends of the domain. Segment `i` spans `[b[i], b[i + 1]]`.
pub fn breakpoints(spline: &PeriodicSpline) -> Vec<f64> {
    let k = spline.degree();
    let knots = spline.knots();
    let mut values = knots[k..knots.len() - k].to_vec();
    values.dedup();
    values
}

/// Convert a periodic parametric spline into the Bezier segments that tile
/// it, in traversal order.
pub fn to_bezier_segments(spline: &PeriodicSpline) -> Result<Vec<BezierSegment>, TraceError> {
    let Coefficients::Parametric(control) = spline.coefficients() else {
        return Err(TraceError::UnsupportedSplineKind);
    };
    let k = spline.degree();
    let order = k + 1;

    let mut knots = spline.knots().to_vec();
    let mut control = control.clone();
    for x in breakpoints(spline) {
        let multiplicity = knots.iter().filter(|&&t| t == x).count();
        let remainder = multiplicity % order;
        if remainder != 0 {
            for _ in 0..order - remainder {
                (knots, control) = insert_knot(&knots, &control, k, x)?;
            }
        }
    }

    // Rows past len(t) - (k + 1) never carry curve data; the k rows at each
    // end of what remains only exist to close the periodic wraparound.
    let rows = &control[..knots.len() - order];
    if rows.len() < 2 * k + order {
        return Err(TraceError::InvalidSpline(format!(
            "{} coefficients after knot insertion is too few for degree {}",
            rows.len(),
            k
        )));
    }
    let rows = &rows[k..rows.len() - k];
    if rows.len() % order != 0 {
        return Err(TraceError::InvalidSpline(format!(
            "{} bezier control points do not split into degree {} segments",
            rows.len(),
            k
        )));
    }

    Ok(rows
        .chunks_exact(order)
        .map(|chunk| BezierSegment::new(chunk.to_vec()))
        .collect())
}
