//! Per-shape vertex records.

use kurbo::{BezPath, Point};

use crate::geom::centroid;
use crate::spline::bezier::BezierSegment;

/// A curve vertex with its two tangent handles, all in absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub point: Point,
    /// Handle leaving this vertex toward the next one.
    pub out_handle: Point,
    /// Handle arriving at this vertex from the previous one.
    pub in_handle: Point,
}

impl Vertex {
    /// Apply a point transform to the position and both handles.
    pub fn map(self, f: impl Fn(Point) -> Point) -> Self {
        Self {
            point: f(self.point),
            out_handle: f(self.out_handle),
            in_handle: f(self.in_handle),
        }
    }
}

/// Vertices of a closed run of Bezier segments.
///
/// Vertex `i` starts segment `i`: its outgoing handle is that segment's second
/// control point, its incoming handle the second-to-last control point of the
/// previous segment.
pub fn vertices_from_segments(segments: &[BezierSegment]) -> Vec<Vertex> {
    let n = segments.len();
    (0..n)
        .map(|i| {
            let current = segments[i].points();
            let previous = segments[(i + n - 1) % n].points();
            Vertex {
                point: current[0],
                out_handle: current[1],
                in_handle: previous[previous.len() - 2],
            }
        })
        .collect()
}

/// One traced platform: its outline vertices and their centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    pub vertices: Vec<Vertex>,
    pub centroid: Point,
}

impl ShapeRecord {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        let positions: Vec<Point> = vertices.iter().map(|v| v.point).collect();
        Self {
            centroid: centroid(&positions),
            vertices,
        }
    }

    /// The outline as a closed cubic `BezPath`.
    pub fn to_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        let n = self.vertices.len();
        if n == 0 {
            return path;
        }
        path.move_to(self.vertices[0].point);
        for i in 0..n {
            let from = &self.vertices[i];
            let to = &self.vertices[(i + 1) % n];
            path.curve_to(from.out_handle, to.in_handle, to.point);
        }
        path.close_path();
        path
    }
}
