//! Uniform oversampling of closed polygons.
//!
//! Sparse samples along straight runs let a smoothing spline oscillate.
//! Splitting every edge longer than a fraction of the median edge length
//! gives the fitter an even point density relative to the shape itself.

use kurbo::Point;

use crate::geom::median;

/// Insert evenly spaced points so no edge exceeds `median(edges) * factor`.
///
/// The closing edge `v[n-1] → v[0]` is included. Winding order is kept and
/// the original vertices are all retained. Polygons that already satisfy the
/// bound, or whose median edge length is zero, come back unchanged.
pub fn densify(points: &[Point], factor: f64) -> Vec<Point> {
    let n = points.len();
    if n < 2 {
        return points.to_vec();
    }

    let lengths: Vec<f64> = (0..n)
        .map(|i| points[i].distance(points[(i + 1) % n]))
        .collect();
    let max_dist = match median(&lengths) {
        Some(m) if m > 0.0 && factor > 0.0 => m * factor,
        _ => return points.to_vec(),
    };

    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        result.push(a);

        let length = lengths[i];
        if length > max_dist {
            let pieces = (length / max_dist).ceil() as usize;
            for j in 1..pieces {
                result.push(a.lerp(b, j as f64 / pieces as f64));
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(points: &[Point]) -> Vec<f64> {
        let n = points.len();
        (0..n)
            .map(|i| points[i].distance(points[(i + 1) % n]))
            .collect()
    }

    #[test]
    fn no_edge_exceeds_half_median() {
        let polygon = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.5, 0.5),
            Point::new(10.0, 1.0),
            Point::new(10.0, 7.0),
            Point::new(0.0, 7.0),
        ];
        let bound = median(&edges(&polygon)).unwrap() * 0.5;
        let dense = densify(&polygon, 0.5);

        assert!(dense.len() > polygon.len());
        for length in edges(&dense) {
            assert!(length <= bound + 1e-12, "edge {} > {}", length, bound);
        }
    }

    #[test]
    fn original_vertices_keep_their_order() {
        let polygon = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        let dense = densify(&polygon, 0.5);
        // Every edge equals the median, so each gets exactly one midpoint.
        assert_eq!(dense.len(), 8);
        assert_eq!(dense[0], polygon[0]);
        assert_eq!(dense[1], Point::new(2.0, 0.0));
        assert_eq!(dense[2], polygon[1]);
        assert_eq!(dense[7], Point::new(0.0, 2.0));
    }

    #[test]
    fn evenly_spaced_polygon_is_unchanged() {
        let polygon = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert_eq!(densify(&polygon, 1.0), polygon);
    }
}
