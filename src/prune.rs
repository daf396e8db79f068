//! Redundant vertex removal.
//!
//! A vertex is redundant when the path from its left neighbor, through the
//! left neighbor's outgoing handle, the vertex itself, and the right
//! neighbor's incoming handle, to the right neighbor is a straight line. The
//! neighbors' handles then already describe the straight segment, so the
//! vertex and its handles can go without synthesizing a new curve.

use std::collections::VecDeque;

use kurbo::Point;

use crate::shape::Vertex;

/// Default collinearity threshold on the cross product of two chain steps.
pub const COLLINEAR_EPSILON: f64 = 1e-6;

/// Outlines are never reduced below a triangle.
pub const MIN_VERTICES: usize = 3;

/// Remove every redundant vertex, down to [`MIN_VERTICES`].
///
/// Works on a ring of live vertices with a queue of candidates. Deleting a
/// vertex re-queues its right neighbor first (it now occupies the deleted
/// position) and its left neighbor last; both have a new chain. The queue
/// drains only once no live vertex is redundant, so pruning a pruned outline
/// changes nothing.
pub fn prune(vertices: &[Vertex], epsilon: f64) -> Vec<Vertex> {
    let n = vertices.len();
    if n <= MIN_VERTICES {
        return vertices.to_vec();
    }

    let mut prev: Vec<usize> = (0..n).map(|i| (i + n - 1) % n).collect();
    let mut next: Vec<usize> = (0..n).map(|i| (i + 1) % n).collect();
    let mut alive = vec![true; n];
    let mut remaining = n;
    let mut queue: VecDeque<usize> = (0..n).collect();

    while let Some(i) = queue.pop_front() {
        if remaining <= MIN_VERTICES {
            break;
        }
        if !alive[i] {
            continue;
        }
        let (left, right) = (prev[i], next[i]);
        let chain = [
            vertices[left].point,
            vertices[left].out_handle,
            vertices[i].point,
            vertices[right].in_handle,
            vertices[right].point,
        ];
        if is_straight(&chain, epsilon) {
            alive[i] = false;
            remaining -= 1;
            next[left] = right;
            prev[right] = left;
            queue.push_front(right);
            queue.push_back(left);
        }
    }

    vertices
        .iter()
        .zip(&alive)
        .filter(|&(_, &keep)| keep)
        .map(|(v, _)| *v)
        .collect()
}

/// Every consecutive triple along the chain is collinear.
fn is_straight(chain: &[Point], epsilon: f64) -> bool {
    chain
        .windows(3)
        .all(|w| collinear(w[0], w[1], w[2], epsilon))
}

fn collinear(a: Point, b: Point, c: Point, epsilon: f64) -> bool {
    let ab = b - a;
    let ac = c - a;
    (ab.x * ac.y - ab.y * ac.x).abs() < epsilon
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::vertices_from_segments;
    use crate::spline::bezier::to_bezier_segments;
    use crate::spline::PeriodicSpline;

    /// Straight-edged outline through `corners`, each edge split into
    /// `pieces` line-like cubic segments.
    fn straight_outline(corners: &[Point], pieces: usize) -> Vec<Vertex> {
        let mut points = Vec::new();
        for i in 0..corners.len() {
            let a = corners[i];
            let b = corners[(i + 1) % corners.len()];
            for j in 0..pieces {
                points.push(a.lerp(b, j as f64 / pieces as f64));
            }
        }
        let n = points.len();
        (0..n)
            .map(|i| {
                let p = points[i];
                Vertex {
                    point: p,
                    out_handle: p.lerp(points[(i + 1) % n], 1.0 / 3.0),
                    in_handle: p.lerp(points[(i + n - 1) % n], 1.0 / 3.0),
                }
            })
            .collect()
    }

    fn rectangle() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 0.5),
            Point::new(0.0, 0.5),
        ]
    }

    #[test]
    fn densified_rectangle_keeps_its_corners() {
        let outline = straight_outline(&rectangle(), 5);
        assert_eq!(outline.len(), 20);

        let pruned = prune(&outline, COLLINEAR_EPSILON);
        let corners: Vec<Point> = pruned.iter().map(|v| v.point).collect();
        assert_eq!(corners, rectangle());
    }

    #[test]
    fn curved_outline_is_untouched() {
        let control: Vec<Point> = (0..8)
            .map(|i| {
                let a = i as f64 * std::f64::consts::TAU / 8.0;
                Point::new(a.cos(), a.sin())
            })
            .collect();
        let spline = PeriodicSpline::uniform(&control, 3).unwrap();
        let vertices = vertices_from_segments(&to_bezier_segments(&spline).unwrap());

        assert_eq!(prune(&vertices, COLLINEAR_EPSILON), vertices);
    }

    #[test]
    fn pruning_is_idempotent() {
        // Rectangle with one rounded corner mixed in.
        let mut outline = straight_outline(&rectangle(), 4);
        outline[8].out_handle = Point::new(1.1, 0.6);
        outline[9].in_handle = Point::new(0.9, 0.6);

        let once = prune(&outline, COLLINEAR_EPSILON);
        let twice = prune(&once, COLLINEAR_EPSILON);
        assert!(once.len() < outline.len());
        assert_eq!(once, twice);
    }

    #[test]
    fn never_drops_below_a_triangle() {
        let flat = straight_outline(
            &[Point::new(0.0, 0.0), Point::new(2.0, 0.0), Point::new(1.0, 0.0)],
            3,
        );
        let pruned = prune(&flat, COLLINEAR_EPSILON);
        assert_eq!(pruned.len(), MIN_VERTICES);
    }

    #[test]
    fn collinearity_uses_the_cross_product() {
        let a = Point::new(0.0, 0.0);
        assert!(collinear(a, Point::new(1.0, 1.0), Point::new(3.0, 3.0), 1e-6));
        assert!(!collinear(a, Point::new(1.0, 1.0), Point::new(3.0, 3.1), 1e-6));
    }
}
