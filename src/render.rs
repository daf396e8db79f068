//! Diagnostic rendering of traced outlines.
//!
//! Converts platform outlines to tiny-skia paths and writes a side-by-side
//! PNG: the binary mask on the left, the same mask with the traced outlines
//! and their vertices drawn over it on the right.

use std::path::Path;

use image::GrayImage;
use kurbo::{BezPath, PathEl};

use crate::error::TraceError;
use crate::shape::ShapeRecord;

const PANEL_SIZE: u32 = 800;
const PADDING: u32 = 20;
const SEPARATOR: u32 = 2;
const VERTEX_RADIUS: f32 = 3.0;

/// Convert a kurbo `BezPath` to a `tiny_skia::Path`.
fn kurbo_to_tinyskia(
    bezpath: &BezPath,
    transform: tiny_skia::Transform,
) -> Option<tiny_skia::Path> {
    let mut pb = tiny_skia::PathBuilder::new();
    for el in bezpath.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                let (x, y) = transform_point(p.x, p.y, transform);
                pb.move_to(x, y);
            }
            PathEl::LineTo(p) => {
                let (x, y) = transform_point(p.x, p.y, transform);
                pb.line_to(x, y);
            }
            PathEl::QuadTo(c, p) => {
                let (cx, cy) = transform_point(c.x, c.y, transform);
                let (px, py) = transform_point(p.x, p.y, transform);
                pb.quad_to(cx, cy, px, py);
            }
            PathEl::CurveTo(c1, c2, p) => {
                let (c1x, c1y) = transform_point(c1.x, c1.y, transform);
                let (c2x, c2y) = transform_point(c2.x, c2.y, transform);
                let (px, py) = transform_point(p.x, p.y, transform);
                pb.cubic_to(c1x, c1y, c2x, c2y, px, py);
            }
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Apply transform manually to a point (f64 → f32).
fn transform_point(x: f64, y: f64, t: tiny_skia::Transform) -> (f32, f32) {
    let x = x as f32;
    let y = y as f32;
    (t.sx * x + t.kx * y + t.tx, t.ky * x + t.sy * y + t.ty)
}

/// Encode a pixmap to PNG bytes.
fn encode_png(pixmap: &tiny_skia::Pixmap) -> Result<Vec<u8>, TraceError> {
    let mut buf = Vec::new();
    let mut encoder = png::Encoder::new(&mut buf, pixmap.width(), pixmap.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(png_error)?;
    writer.write_image_data(pixmap.data()).map_err(png_error)?;
    writer.finish().map_err(png_error)?;
    Ok(buf)
}

fn png_error(e: png::EncodingError) -> TraceError {
    TraceError::Io(std::io::Error::other(e.to_string()))
}

fn new_pixmap(width: u32, height: u32) -> Result<tiny_skia::Pixmap, TraceError> {
    tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| TraceError::Io(std::io::Error::other("cannot allocate render target")))
}

/// Render the mask and the traced outlines side by side into a PNG file.
///
/// `shapes` are expected in y-up image coordinates, as produced by
/// [`crate::trace`].
pub fn render_overlay(
    mask: &GrayImage,
    shapes: &[ShapeRecord],
    output_path: &Path,
) -> Result<(), TraceError> {
    let content = (PANEL_SIZE - PADDING * 2) as f32;
    let (src_w, src_h) = mask.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(TraceError::ImageLoad("empty mask".into()));
    }

    // Shared scale: fit the mask into the panel content area.
    let scale = (content / src_w as f32).min(content / src_h as f32);
    let rendered_w = ((src_w as f32 * scale) as u32).max(1);
    let rendered_h = ((src_h as f32 * scale) as u32).max(1);
    let ox = PADDING + (content as u32 - rendered_w) / 2;
    let oy = PADDING + (content as u32 - rendered_h) / 2;

    // ── Left panel: mask ──
    let resized = image::imageops::resize(
        mask,
        rendered_w,
        rendered_h,
        image::imageops::FilterType::Nearest,
    );
    let mut mask_panel = new_pixmap(PANEL_SIZE, PANEL_SIZE)?;
    mask_panel.fill(tiny_skia::Color::WHITE);
    for y in 0..rendered_h {
        for x in 0..rendered_w {
            let luma = resized.get_pixel(x, y).0[0];
            let dst_x = ox + x;
            let dst_y = oy + y;
            if dst_x < PANEL_SIZE && dst_y < PANEL_SIZE {
                if let Some(pm) = tiny_skia::PremultipliedColorU8::from_rgba(luma, luma, luma, 255)
                {
                    mask_panel.pixels_mut()[(dst_y * PANEL_SIZE + dst_x) as usize] = pm;
                }
            }
        }
    }

    // ── Right panel: outlines over the mask ──
    //
    // Shape coordinates are y-up pixels; the panel is y-down:
    //   x_panel = ox + x * scale
    //   y_panel = oy + (src_h - y) * scale
    let transform = tiny_skia::Transform {
        sx: scale,
        kx: 0.0,
        ky: 0.0,
        sy: -scale,
        tx: ox as f32,
        ty: oy as f32 + src_h as f32 * scale,
    };

    let mut overlay_panel = mask_panel.clone();
    let mut outline_paint = tiny_skia::Paint::default();
    outline_paint.set_color(tiny_skia::Color::from_rgba8(255, 0, 0, 255));
    outline_paint.anti_alias = true;
    let mut vertex_paint = tiny_skia::Paint::default();
    vertex_paint.set_color(tiny_skia::Color::from_rgba8(0, 90, 255, 255));
    vertex_paint.anti_alias = true;
    let stroke = tiny_skia::Stroke {
        width: 2.0,
        ..tiny_skia::Stroke::default()
    };

    for shape in shapes {
        if let Some(sk_path) = kurbo_to_tinyskia(&shape.to_bezpath(), transform) {
            overlay_panel.stroke_path(
                &sk_path,
                &outline_paint,
                &stroke,
                tiny_skia::Transform::identity(),
                None,
            );
        }
        for vertex in &shape.vertices {
            let (x, y) = transform_point(vertex.point.x, vertex.point.y, transform);
            if let Some(dot) = tiny_skia::PathBuilder::from_circle(x, y, VERTEX_RADIUS) {
                overlay_panel.fill_path(
                    &dot,
                    &vertex_paint,
                    tiny_skia::FillRule::Winding,
                    tiny_skia::Transform::identity(),
                    None,
                );
            }
        }
    }

    // ── Composite ──
    let total_w = PANEL_SIZE * 2 + SEPARATOR;
    let mut final_pixmap = new_pixmap(total_w, PANEL_SIZE)?;
    final_pixmap.fill(tiny_skia::Color::from_rgba8(200, 200, 200, 255));
    for y in 0..PANEL_SIZE {
        for x in 0..PANEL_SIZE {
            let idx = (y * PANEL_SIZE + x) as usize;
            final_pixmap.pixels_mut()[(y * total_w + x) as usize] = mask_panel.pixels()[idx];
            final_pixmap.pixels_mut()[(y * total_w + PANEL_SIZE + SEPARATOR + x) as usize] =
                overlay_panel.pixels()[idx];
        }
    }

    std::fs::write(output_path, encode_png(&final_pixmap)?)?;
    log::info!("  Plot        {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn y_up_points_map_into_the_panel() {
        let transform = tiny_skia::Transform {
            sx: 2.0,
            kx: 0.0,
            ky: 0.0,
            sy: -2.0,
            tx: 10.0,
            ty: 210.0,
        };
        // Bottom-left of a 100 px tall image lands at the panel's lower edge.
        assert_eq!(transform_point(0.0, 0.0, transform), (10.0, 210.0));
        assert_eq!(transform_point(100.0, 100.0, transform), (210.0, 10.0));
    }

    #[test]
    fn closed_outline_converts_to_a_path() {
        let mut path = BezPath::new();
        path.move_to(Point::new(0.0, 0.0));
        path.curve_to(Point::new(1.0, 0.0), Point::new(2.0, 1.0), Point::new(2.0, 2.0));
        path.line_to(Point::new(0.0, 2.0));
        path.close_path();
        let sk_path = kurbo_to_tinyskia(&path, tiny_skia::Transform::identity()).unwrap();
        assert_eq!(sk_path.len(), 4);
    }
}
