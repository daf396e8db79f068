use geo::{LineString, Simplify};
use image::GrayImage;
use imageproc::contours::find_contours;
use kurbo::Point;

use crate::config::TracingConfig;
use crate::geom::{signed_area, Polygon};

/// Extract one closed polygon per shape boundary in a binary mask.
///
/// Every border (outer or hole) found in the mask becomes a candidate, in
/// discovery order. Boundaries enclosing `config.background_ratio` or more of
/// the image area are the background and are dropped. Straight pixel runs are
/// collapsed to their end points, staircase steps within
/// `config.simplify_epsilon` are removed, and y is flipped so the result is
/// y-up.
pub fn extract_shapes(mask: &GrayImage, config: &TracingConfig) -> Vec<Polygon> {
    let (width, height) = mask.dimensions();
    let total_area = width as f64 * height as f64;
    let image_height = height as f64;

    find_contours::<i32>(mask)
        .into_iter()
        .filter(|contour| contour.points.len() >= 3)
        .filter_map(|contour| {
            let pixels: Vec<(i32, i32)> = contour.points.iter().map(|p| (p.x, p.y)).collect();
            let corners = compress_runs(&pixels);
            let points: Vec<Point> = corners
                .iter()
                .map(|&(x, y)| Point::new(x as f64, image_height - y as f64))
                .collect();
            let points = simplify_ring(points, config.simplify_epsilon);

            let area = signed_area(&points).abs();
            if area >= total_area * config.background_ratio {
                log::debug!("  Contour     dropped background ({:.0} px²)", area);
                return None;
            }

            match Polygon::new(points) {
                Ok(polygon) => Some(polygon),
                Err(e) => {
                    log::debug!("  Contour     dropped: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Keep only the pixels where the chain changes direction.
fn compress_runs(pixels: &[(i32, i32)]) -> Vec<(i32, i32)> {
    let n = pixels.len();
    if n < 3 {
        return pixels.to_vec();
    }
    (0..n)
        .filter(|&i| {
            let prev = pixels[(i + n - 1) % n];
            let current = pixels[i];
            let next = pixels[(i + 1) % n];
            let step_in = (current.0 - prev.0, current.1 - prev.1);
            let step_out = (next.0 - current.0, next.1 - current.1);
            let cross = step_in.0 * step_out.1 - step_in.1 * step_out.0;
            let dot = step_in.0 * step_out.0 + step_in.1 * step_out.1;
            cross != 0 || dot <= 0
        })
        .map(|i| pixels[i])
        .collect()
}

/// RDP simplification of a closed ring. Rings that would collapse below a
/// triangle are returned unchanged.
fn simplify_ring(points: Vec<Point>, epsilon: f64) -> Vec<Point> {
    if points.len() <= 3 || epsilon <= 0.0 {
        return points;
    }
    let mut ring: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
    ring.push(ring[0]);
    let mut simplified: Vec<Point> = LineString::from(ring)
        .simplify(&epsilon)
        .into_inner()
        .into_iter()
        .map(|coord| Point::new(coord.x, coord.y))
        .collect();
    simplified.pop();
    if simplified.len() < 3 {
        return points;
    }
    simplified
}
