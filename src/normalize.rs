//! Shape normalization into a canonical unit frame.

use kurbo::{Point, Vec2};

use crate::error::TraceError;
use crate::geom::Polygon;

/// Inverse of a normalization: `original = normalized * scale + reverse`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub scale: f64,
    pub reverse: Vec2,
}

impl Normalization {
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.reverse.x) / self.scale,
            (p.y - self.reverse.y) / self.scale,
        )
    }

    pub fn invert(&self, p: Point) -> Point {
        (p.to_vec2() * self.scale + self.reverse).to_point()
    }
}

/// Map a polygon into the unit frame.
///
/// With `scale_fix` the polygon's own bounding box defines the frame.
/// Otherwise every shape shares the image frame: coordinates are divided by
/// `image_side`, the shorter side of the source image, so the fitter's
/// tolerance means the same thing at any image size. A zero or non-finite
/// extent cannot be normalized.
pub fn normalize(
    polygon: &Polygon,
    scale_fix: bool,
    image_side: f64,
) -> Result<(Vec<Point>, Normalization), TraceError> {
    let norm = if scale_fix {
        let (min, max) = bounds(polygon.points());
        Normalization {
            scale: (max.x - min.x).max(max.y - min.y),
            reverse: min.to_vec2(),
        }
    } else {
        Normalization {
            scale: image_side,
            reverse: Vec2::ZERO,
        }
    };
    if !(norm.scale.is_finite() && norm.scale > 0.0) {
        return Err(TraceError::DegenerateShape(format!(
            "normalization extent is {}",
            norm.scale
        )));
    }

    let points = polygon.points().iter().map(|&p| norm.apply(p)).collect();
    Ok((points, norm))
}

fn bounds(points: &[Point]) -> (Point, Point) {
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn polygon(points: &[(f64, f64)]) -> Polygon {
        Polygon::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect()).unwrap()
    }

    #[test]
    fn wide_shape_fits_unit_width() {
        let poly = polygon(&[(10.0, 20.0), (50.0, 20.0), (50.0, 30.0), (10.0, 30.0)]);
        let (points, norm) = normalize(&poly, true, 300.0).unwrap();
        assert_eq!(norm.scale, 40.0);
        assert_eq!(norm.reverse, Vec2::new(10.0, 20.0));
        assert_eq!(points[0], Point::new(0.0, 0.0));
        assert_eq!(points[2], Point::new(1.0, 0.25));
    }

    #[test]
    fn inverse_restores_original_coordinates() {
        let poly = polygon(&[(-3.25, 7.5), (112.0, 9.125), (80.5, 301.75), (1.0, 150.0)]);
        let (points, norm) = normalize(&poly, true, 300.0).unwrap();
        for (normalized, original) in points.iter().zip(poly.points()) {
            let restored = norm.invert(*normalized);
            assert_abs_diff_eq!(restored.x, original.x, epsilon = 1e-9);
            assert_abs_diff_eq!(restored.y, original.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn without_scale_fix_image_side_sets_the_frame() {
        let poly = polygon(&[(10.0, 20.0), (50.0, 20.0), (50.0, 30.0)]);
        let (points, norm) = normalize(&poly, false, 200.0).unwrap();
        assert_eq!(norm.scale, 200.0);
        assert_eq!(norm.reverse, Vec2::ZERO);
        assert_eq!(points[0], Point::new(0.05, 0.1));
        let restored = norm.invert(points[2]);
        assert_abs_diff_eq!(restored.x, 50.0, epsilon = 1e-12);
        assert_abs_diff_eq!(restored.y, 30.0, epsilon = 1e-12);
    }

    #[test]
    fn doubled_image_gives_identical_normalized_points() {
        let small = polygon(&[(10.0, 20.0), (57.3, 20.0), (41.9, 33.1)]);
        let large = polygon(&[(20.0, 40.0), (114.6, 40.0), (83.8, 66.2)]);
        let (a, _) = normalize(&small, false, 150.0).unwrap();
        let (b, _) = normalize(&large, false, 300.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_image_frame_is_degenerate() {
        let poly = polygon(&[(10.0, 20.0), (50.0, 20.0), (50.0, 30.0)]);
        assert!(matches!(
            normalize(&poly, false, 0.0),
            Err(TraceError::DegenerateShape(_))
        ));
    }

    #[test]
    fn non_finite_extent_is_degenerate() {
        // Collinear points on a vertical line still have a non-zero extent.
        let poly = polygon(&[(1.0, 0.0), (1.0, 1.0), (1.0, 2.0)]);
        assert!(normalize(&poly, true, 300.0).is_ok());

        let poly = polygon(&[(f64::INFINITY, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        assert!(matches!(
            normalize(&poly, true, 300.0),
            Err(TraceError::DegenerateShape(_))
        ));
    }
}
