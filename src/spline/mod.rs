//! Periodic parametric B-splines.
//!
//! A periodic spline of degree `k` stores its knot vector with `k` extra
//! knots wrapped around at each end, and its coefficient list with the first
//! `k` control points repeated at the end, so the curve closes smoothly on the
//! parameter domain `[t[k], t[len - k - 1]]`.

pub mod bezier;
pub mod fit;

use kurbo::Point;

use crate::error::TraceError;

/// Control coefficients of a spline.
#[derive(Debug, Clone, PartialEq)]
pub enum Coefficients {
    /// One row per control point, one column per dimension.
    Parametric(Vec<Point>),
    /// A non-parametric (function-graph) spline with one value per control
    /// point. It cannot describe a closed outline.
    Scalar(Vec<f64>),
}

impl Coefficients {
    pub fn len(&self) -> usize {
        match self {
            Coefficients::Parametric(points) => points.len(),
            Coefficients::Scalar(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A periodic B-spline `(t, c, k)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicSpline {
    knots: Vec<f64>,
    coefficients: Coefficients,
    degree: usize,
}

impl PeriodicSpline {
    /// Wrap a knot vector and coefficients, checking their shapes agree.
    pub fn new(
        knots: Vec<f64>,
        coefficients: Coefficients,
        degree: usize,
    ) -> Result<Self, TraceError> {
        if degree == 0 {
            return Err(TraceError::InvalidSpline("degree must be at least 1".into()));
        }
        if knots.len() < 2 * degree + 2 {
            return Err(TraceError::InvalidSpline(format!(
                "{} knots cannot hold a degree {} periodic spline",
                knots.len(),
                degree
            )));
        }
        if knots.windows(2).any(|w| !(w[0] <= w[1])) {
            return Err(TraceError::InvalidSpline("knots must be non-decreasing".into()));
        }
        let expected = knots.len() - degree - 1;
        if coefficients.len() != expected {
            return Err(TraceError::InvalidSpline(format!(
                "expected {} coefficients for {} knots of degree {}, got {}",
                expected,
                knots.len(),
                degree,
                coefficients.len()
            )));
        }
        if knots[degree] >= knots[knots.len() - degree - 1] {
            return Err(TraceError::InvalidSpline("empty parameter domain".into()));
        }
        Ok(Self {
            knots,
            coefficients,
            degree,
        })
    }

    /// Uniform periodic spline over `[0, 1]` whose control polygon is the
    /// given closed loop.
    pub fn uniform(control: &[Point], degree: usize) -> Result<Self, TraceError> {
        let spans = control.len();
        if spans == 0 {
            return Err(TraceError::InvalidSpline("no control points".into()));
        }
        let breaks: Vec<f64> = (0..=spans).map(|i| i as f64 / spans as f64).collect();
        let knots = periodic_knots(&breaks, degree);
        let mut coefficients = control.to_vec();
        coefficients.extend((0..degree).map(|i| control[i % spans]));
        Self::new(knots, Coefficients::Parametric(coefficients), degree)
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Parameter domain `(start, end)` of the closed curve.
    pub fn domain(&self) -> (f64, f64) {
        let k = self.degree;
        (self.knots[k], self.knots[self.knots.len() - k - 1])
    }

    /// Evaluate the curve at `u` via de Boor's algorithm.
    ///
    /// `u` outside the domain wraps around, since the curve is closed.
    pub fn evaluate(&self, u: f64) -> Result<Point, TraceError> {
        let control = match &self.coefficients {
            Coefficients::Parametric(points) => points,
            Coefficients::Scalar(_) => return Err(TraceError::UnsupportedSplineKind),
        };
        let (start, end) = self.domain();
        let u = if (start..=end).contains(&u) {
            u
        } else {
            start + (u - start).rem_euclid(end - start)
        };
        let span = find_span(&self.knots, self.degree, u)
            .ok_or_else(|| TraceError::InvalidSpline(format!("no knot span contains {}", u)))?;
        Ok(de_boor(&self.knots, control, self.degree, span, u))
    }
}

/// Extend domain breakpoints `b[0] < … < b[m]` into a periodic knot vector
/// with `degree` wrapped knots on each side.
pub(crate) fn periodic_knots(breaks: &[f64], degree: usize) -> Vec<f64> {
    let m = breaks.len() - 1;
    let period = breaks[m] - breaks[0];
    let mut knots = Vec::with_capacity(m + 1 + 2 * degree);
    for j in (1..=degree).rev() {
        knots.push(breaks[(m - j % m) % m] - period * (1 + (j - 1) / m) as f64);
    }
    knots.extend_from_slice(breaks);
    for j in 1..=degree {
        knots.push(breaks[j % m] + period * (1 + j / m) as f64);
    }
    knots
}

/// Index `r` of the non-empty knot span `[t[r], t[r+1]]` containing `x`,
/// restricted to spans whose `k + 1` coefficients exist.
///
/// Prefers the span starting at `x`, and falls back to the span ending at `x`
/// for the right end of the domain.
pub(crate) fn find_span(knots: &[f64], degree: usize, x: f64) -> Option<usize> {
    let last = knots.len().checked_sub(degree + 2)?;
    (degree..=last)
        .rev()
        .find(|&r| knots[r] < knots[r + 1] && knots[r] <= x && x <= knots[r + 1])
}

fn de_boor(knots: &[f64], control: &[Point], degree: usize, span: usize, u: f64) -> Point {
    let mut d: Vec<Point> = (0..=degree).map(|j| control[span - degree + j]).collect();
    for level in 1..=degree {
        for j in (level..=degree).rev() {
            let i = span - degree + j;
            let denom = knots[i + degree + 1 - level] - knots[i];
            let alpha = if denom == 0.0 { 0.0 } else { (u - knots[i]) / denom };
            d[j] = d[j - 1].lerp(d[j], alpha);
        }
    }
    d[degree]
}

/// Insert `x` once into the knot vector (Boehm's algorithm).
///
/// The represented curve is unchanged on the whole domain; the knot vector
/// and coefficient list each grow by one.
pub(crate) fn insert_knot(
    knots: &[f64],
    control: &[Point],
    degree: usize,
    x: f64,
) -> Result<(Vec<f64>, Vec<Point>), TraceError> {
    let r = find_span(knots, degree, x)
        .ok_or_else(|| TraceError::InvalidSpline(format!("knot {} is outside the domain", x)))?;

    let mut new_knots = Vec::with_capacity(knots.len() + 1);
    new_knots.extend_from_slice(&knots[..=r]);
    new_knots.push(x);
    new_knots.extend_from_slice(&knots[r + 1..]);

    let mut new_control = Vec::with_capacity(control.len() + 1);
    new_control.extend_from_slice(&control[..=r - degree]);
    for i in r - degree + 1..=r {
        let alpha = (x - knots[i]) / (knots[i + degree] - knots[i]);
        new_control.push(control[i - 1].lerp(control[i], alpha));
    }
    new_control.extend_from_slice(&control[r..]);

    Ok((new_knots, new_control))
}
