//! Periodic spline fitting.
//!
//! The pipeline only needs *some* periodic parametric B-spline close to the
//! densified outline, so fitting sits behind the [`SplineFitter`] trait.
//! [`LeastSquaresFitter`] is the built-in implementation:
//!
//! 1. Mark corners: samples where the outline turns by more than
//!    `corner_angle`
//! 2. Chord-length parameterize the closed polygon onto `[0, 1)`, starting
//!    from a smooth sample
//! 3. Put a knot of multiplicity `k` at every corner, so the curve is only
//!    C0 there and straight runs between corners stay straight
//! 4. Solve the periodic least-squares problem for the current knots
//! 5. While the sum of squared residuals exceeds the tolerance, split the
//!    knot spans carrying the most error and solve again

use kurbo::{Point, Vec2};
use nalgebra::DMatrix;

use super::{find_span, periodic_knots, Coefficients, PeriodicSpline};
use crate::error::TraceError;

/// Fits a closed curve through points, within a smoothing tolerance.
pub trait SplineFitter: Sync {
    /// Fit a periodic parametric B-spline of the given degree to a closed
    /// point loop. `tolerance` bounds the sum of squared residuals.
    fn fit_periodic(
        &self,
        points: &[Point],
        tolerance: f64,
        degree: usize,
    ) -> Result<PeriodicSpline, TraceError>;
}

/// Periodic least-squares B-spline fit with corner knots and adaptive knot
/// refinement.
#[derive(Debug, Clone)]
pub struct LeastSquaresFitter {
    /// Knot spans of the first fit when the outline has no corners.
    pub initial_spans: usize,
    /// Upper bound on refine-and-resolve rounds.
    pub max_iterations: usize,
    /// Turning angle (radians) above which a sample is a corner.
    pub corner_angle: f64,
}

impl Default for LeastSquaresFitter {
    fn default() -> Self {
        Self {
            initial_spans: 8,
            max_iterations: 32,
            corner_angle: std::f64::consts::FRAC_PI_3,
        }
    }
}

/// Relative diagonal load keeping the normal equations positive definite
/// when a span holds too few samples. Underdetermined coefficients settle on
/// the polyline instead of drifting.
const RIDGE: f64 = 1e-9;

impl SplineFitter for LeastSquaresFitter {
    fn fit_periodic(
        &self,
        points: &[Point],
        tolerance: f64,
        degree: usize,
    ) -> Result<PeriodicSpline, TraceError> {
        let n = points.len();
        if degree == 0 || n < degree + 1 {
            return Err(TraceError::Fit(format!(
                "{} points cannot determine a degree {} closed spline",
                n, degree
            )));
        }

        let mut corners = find_corners(points, self.corner_angle);
        let mut points = points.to_vec();
        if corners.iter().any(|&c| c) {
            match smooth_origin(&corners) {
                Some(origin) => {
                    points.rotate_left(origin);
                    corners.rotate_left(origin);
                }
                None => {
                    log::debug!("  Fit         every sample is a corner, fitting smooth");
                    corners.fill(false);
                }
            }
        }
        let params = chord_parameters(&points)?;

        let corner_params: Vec<f64> = params
            .iter()
            .zip(&corners)
            .filter(|&(_, &corner)| corner)
            .map(|(&u, _)| u)
            .collect();
        let mut breaks = if corner_params.is_empty() {
            quantile_breaks(&params, self.initial_spans.max(degree + 1).min(n))
        } else {
            let mut breaks = Vec::with_capacity(corner_params.len() * degree + 2);
            breaks.push(0.0);
            for &u in &corner_params {
                breaks.extend(std::iter::repeat(u).take(degree));
            }
            breaks.push(1.0);
            breaks
        };

        let mut iteration = 0;
        loop {
            let (spline, residuals) = solve(&points, &params, &breaks, degree)?;
            let error: f64 = residuals.iter().sum();
            log::debug!(
                "  Fit         round {}: {} corners, {} spans, residual {:.3e}",
                iteration,
                corner_params.len(),
                breaks.len() - 1,
                error
            );
            if error <= tolerance {
                return Ok(spline);
            }
            iteration += 1;
            if iteration > self.max_iterations {
                log::debug!(
                    "  Fit         stopped after {} rounds above tolerance ({:.3e} > {:.3e})",
                    self.max_iterations,
                    error,
                    tolerance
                );
                return Ok(spline);
            }

            let splits = split_points(&params, &residuals, &breaks, tolerance);
            if splits.is_empty() {
                return Ok(spline);
            }
            breaks.extend(splits);
            breaks.sort_by(f64::total_cmp);
        }
    }
}

/// Unsigned angle between two vectors, in radians [0, pi].
fn angle_between(a: Vec2, b: Vec2) -> f64 {
    a.cross(b).atan2(a.dot(b)).abs()
}

/// Samples where the closed outline turns by more than `threshold`.
fn find_corners(points: &[Point], threshold: f64) -> Vec<bool> {
    let n = points.len();
    (0..n)
        .map(|i| {
            let v_in = points[i] - points[(i + n - 1) % n];
            let v_out = points[(i + 1) % n] - points[i];
            angle_between(v_in, v_out) > threshold
        })
        .collect()
}

/// Middle sample of the longest run of non-corners. The parameter origin
/// goes there so no corner knot sits on the domain ends. `None` when every
/// sample is a corner.
fn smooth_origin(corners: &[bool]) -> Option<usize> {
    let n = corners.len();
    let first = corners.iter().position(|&c| c)?;
    let mut best: Option<(usize, usize)> = None;
    let (mut run_start, mut run_len) = (0, 0);
    for step in 1..=n {
        let i = (first + step) % n;
        if corners[i] {
            if run_len > best.map_or(0, |(_, len)| len) {
                best = Some((run_start, run_len));
            }
            run_len = 0;
        } else {
            if run_len == 0 {
                run_start = i;
            }
            run_len += 1;
        }
    }
    best.map(|(start, len)| (start + len / 2) % n)
}

/// Cumulative chord length of the closed loop, scaled to `[0, 1)`.
fn chord_parameters(points: &[Point]) -> Result<Vec<f64>, TraceError> {
    let n = points.len();
    let mut params = Vec::with_capacity(n);
    let mut length = 0.0;
    for i in 0..n {
        params.push(length);
        length += points[i].distance(points[(i + 1) % n]);
    }
    if !(length.is_finite() && length > 0.0) {
        return Err(TraceError::Fit(format!("outline length is {}", length)));
    }
    for u in &mut params {
        *u /= length;
    }
    Ok(params)
}

/// Breakpoints at sample quantiles, so every span holds data.
fn quantile_breaks(params: &[f64], spans: usize) -> Vec<f64> {
    let n = params.len();
    let mut breaks = Vec::with_capacity(spans + 1);
    breaks.push(0.0);
    for j in 1..spans {
        let i = j * n / spans;
        breaks.push((params[i - 1] + params[i]) / 2.0);
    }
    breaks.push(1.0);
    breaks
}

/// Point on the closed polyline at chord parameter `u` (wrapped into `[0, 1)`).
fn polyline_at(points: &[Point], params: &[f64], u: f64) -> Point {
    let n = points.len();
    let u = u.rem_euclid(1.0);
    let i = params.partition_point(|&p| p <= u).saturating_sub(1);
    let start = params[i];
    let end = if i + 1 < n { params[i + 1] } else { 1.0 };
    let t = if end > start { (u - start) / (end - start) } else { 0.0 };
    points[i].lerp(points[(i + 1) % n], t)
}

/// Least-squares coefficients for fixed breakpoints, plus each sample's
/// squared residual.
///
/// Solves for the offset from the polyline's Greville points: the control
/// polygon that reproduces every straight run exactly. The ridge term then
/// pulls underdetermined coefficients onto the polyline, not the origin.
fn solve(
    points: &[Point],
    params: &[f64],
    breaks: &[f64],
    degree: usize,
) -> Result<(PeriodicSpline, Vec<f64>), TraceError> {
    let spans = breaks.len() - 1;
    let knots = periodic_knots(breaks, degree);

    let prior: Vec<Point> = (0..spans)
        .map(|i| {
            let greville = knots[i + 1..=i + degree].iter().sum::<f64>() / degree as f64;
            polyline_at(points, params, greville)
        })
        .collect();

    let mut normal = DMatrix::<f64>::zeros(spans, spans);
    let mut rhs = DMatrix::<f64>::zeros(spans, 2);
    for (p, &u) in points.iter().zip(params) {
        let r = find_span(&knots, degree, u)
            .ok_or_else(|| TraceError::Fit(format!("no knot span contains {}", u)))?;
        let basis = basis_functions(&knots, r, u, degree);
        let rows: Vec<usize> = (0..=degree).map(|a| (r - degree + a) % spans).collect();
        let on_prior = rows
            .iter()
            .zip(&basis)
            .fold(Vec2::ZERO, |acc, (&row, &na)| acc + prior[row].to_vec2() * na);
        let offset = p.to_vec2() - on_prior;
        for (a, &na) in basis.iter().enumerate() {
            rhs[(rows[a], 0)] += na * offset.x;
            rhs[(rows[a], 1)] += na * offset.y;
            for (b, &nb) in basis.iter().enumerate() {
                normal[(rows[a], rows[b])] += na * nb;
            }
        }
    }
    let load = RIDGE * normal.diagonal().max().max(1.0);
    for i in 0..spans {
        normal[(i, i)] += load;
    }

    let delta = match normal.clone().cholesky() {
        Some(cholesky) => cholesky.solve(&rhs),
        None => normal
            .lu()
            .solve(&rhs)
            .ok_or_else(|| TraceError::Fit("singular normal equations".into()))?,
    };

    let coefficients: Vec<Point> = (0..spans + degree)
        .map(|i| {
            let row = i % spans;
            prior[row] + Vec2::new(delta[(row, 0)], delta[(row, 1)])
        })
        .collect();
    let spline = PeriodicSpline::new(knots, Coefficients::Parametric(coefficients), degree)?;

    let residuals = points
        .iter()
        .zip(params)
        .map(|(p, &u)| Ok((*p - spline.evaluate(u)?).hypot2()))
        .collect::<Result<Vec<f64>, TraceError>>()?;

    Ok((spline, residuals))
}

/// The `degree + 1` non-zero basis functions on span `r` at `u`
/// (Cox–de Boor, triangular scheme).
fn basis_functions(knots: &[f64], r: usize, u: f64, degree: usize) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;
    for j in 1..=degree {
        left[j] = u - knots[r + 1 - j];
        right[j] = knots[r + j] - u;
        let mut saved = 0.0;
        for i in 0..j {
            let temp = n[i] / (right[i + 1] + left[j - i]);
            n[i] = saved + right[i + 1] * temp;
            saved = left[j - i] * temp;
        }
        n[j] = saved;
    }
    n
}

/// New breakpoints for every span whose share of the error is too large.
///
/// A span is only split if it holds at least two samples, and the split goes
/// between its two middle samples so both halves keep data.
fn split_points(params: &[f64], residuals: &[f64], breaks: &[f64], tolerance: f64) -> Vec<f64> {
    let spans = breaks.len() - 1;
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); spans];
    let mut error = vec![0.0; spans];
    for (i, &u) in params.iter().enumerate() {
        let span = breaks[1..].partition_point(|&b| b <= u).min(spans - 1);
        members[span].push(i);
        error[span] += residuals[i];
    }

    let share = tolerance / spans as f64;
    let mut ranked: Vec<usize> = (0..spans)
        .filter(|&s| members[s].len() >= 2 && error[s] > share)
        .collect();
    ranked.sort_by(|&a, &b| error[b].total_cmp(&error[a]));

    ranked
        .into_iter()
        .map(|s| {
            let inside = &members[s];
            let half = inside.len() / 2;
            (params[inside[half - 1]] + params[inside[half]]) / 2.0
        })
        .collect()
}
