//! Line-oriented record stream consumed by the editor-side importer.
//!
//! ```text
//! <shape count>
//! <vertex count>                      ┐
//! <centroid.x>\t<centroid.y>          │ per shape
//! <x>\t<y>\t<out.x>\t<out.y>\t<in.x>\t<in.y>   (one line per vertex)
//! ```
//!
//! Values are written at full `f64` precision.

use std::io::Write;

use kurbo::Point;

use crate::error::TraceError;
use crate::shape::{ShapeRecord, Vertex};

/// Write all shapes as one record stream.
pub fn write_records<W: Write>(out: &mut W, shapes: &[ShapeRecord]) -> Result<(), TraceError> {
    writeln!(out, "{}", shapes.len())?;
    for shape in shapes {
        writeln!(out, "{}", shape.vertices.len())?;
        writeln!(out, "{}\t{}", shape.centroid.x, shape.centroid.y)?;
        for v in &shape.vertices {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}",
                v.point.x, v.point.y, v.out_handle.x, v.out_handle.y, v.in_handle.x, v.in_handle.y,
            )?;
        }
    }
    Ok(())
}

/// Parse a record stream back into shapes. Blank lines are ignored.
pub fn read_records(text: &str) -> Result<Vec<ShapeRecord>, TraceError> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
    let mut next_line = |what: &str| {
        lines
            .next()
            .ok_or_else(|| TraceError::MalformedRecords(format!("missing {}", what)))
    };

    let shape_count = parse_count(next_line("shape count")?)?;
    let mut shapes = Vec::with_capacity(shape_count);
    for _ in 0..shape_count {
        let vertex_count = parse_count(next_line("vertex count")?)?;
        let centroid = match parse_values(next_line("centroid")?)?[..] {
            [x, y] => Point::new(x, y),
            _ => return Err(TraceError::MalformedRecords("centroid needs 2 values".into())),
        };
        let mut vertices = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            let vertex = match parse_values(next_line("vertex")?)?[..] {
                [x, y, ox, oy, ix, iy] => Vertex {
                    point: Point::new(x, y),
                    out_handle: Point::new(ox, oy),
                    in_handle: Point::new(ix, iy),
                },
                _ => return Err(TraceError::MalformedRecords("vertex needs 6 values".into())),
            };
            vertices.push(vertex);
        }
        shapes.push(ShapeRecord { vertices, centroid });
    }
    Ok(shapes)
}

fn parse_count(line: &str) -> Result<usize, TraceError> {
    line.parse()
        .map_err(|_| TraceError::MalformedRecords(format!("expected a count, got {:?}", line)))
}

fn parse_values(line: &str) -> Result<Vec<f64>, TraceError> {
    line.split('\t')
        .filter(|field| !field.is_empty())
        .map(|field| {
            field.parse().map_err(|_| {
                TraceError::MalformedRecords(format!("expected a number, got {:?}", field))
            })
        })
        .collect()
}
