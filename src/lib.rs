//! img2platform: raster image → closed cubic bezier platform outlines.
//!
//! Traces the shapes of a thresholded image into smooth closed loops of cubic
//! Bezier segments, one record per shape, for import into a game editor.
//!
//! # Example
//!
//! ```no_run
//! use img2platform::{trace, TracingConfig};
//! use std::path::Path;
//!
//! let config = TracingConfig::default();
//! let result = trace(Path::new("level.png"), &config)?;
//! img2platform::output::write_records(&mut std::io::stdout(), &result.shapes)?;
//! # Ok::<(), img2platform::TraceError>(())
//! ```

#![forbid(unsafe_code)]

mod config;

pub mod bitmap;
pub mod contour;
pub mod densify;
pub mod error;
pub mod geom;
pub mod normalize;
pub mod output;
pub mod prune;
pub mod render;
pub mod shape;
pub mod spline;

// Re-export kurbo so downstream users get the same version
// used by the records (kurbo::Point) and `ShapeRecord::to_bezpath`.
pub use kurbo;

pub use config::TracingConfig;
pub use error::TraceError;
pub use shape::{ShapeRecord, Vertex};
pub use spline::fit::{LeastSquaresFitter, SplineFitter};

use std::path::Path;
use std::time::Instant;

use image::GrayImage;
use rayon::prelude::*;

use geom::Polygon;

/// The result of tracing one image.
#[derive(Debug, Clone)]
pub struct TraceResult {
    /// Successfully traced shapes, in contour discovery order.
    pub shapes: Vec<ShapeRecord>,
    /// Shapes that were found but could not be traced.
    pub skipped: usize,
    /// The thresholded mask the shapes were traced from.
    pub mask: GrayImage,
}

/// Full pipeline with the built-in least-squares fitter.
pub fn trace(image_path: &Path, config: &TracingConfig) -> Result<TraceResult, TraceError> {
    trace_with(image_path, config, &LeastSquaresFitter::default())
}

/// Full pipeline: image path → one closed bezier loop per shape.
///
/// Configuration and input errors abort before any shape is processed.
pub fn trace_with(
    image_path: &Path,
    config: &TracingConfig,
    fitter: &dyn SplineFitter,
) -> Result<TraceResult, TraceError> {
    config.validate()?;

    let mask = bitmap::load_and_threshold(image_path, config)?;
    let (w, h) = mask.dimensions();
    log::info!(
        "  Load        {}x{} px, threshold {}{}",
        w,
        h,
        config.threshold,
        if config.invert { " (inverted)" } else { "" },
    );

    trace_mask(mask, config, fitter)
}

/// Trace an already thresholded mask.
///
/// Shapes are processed in parallel. A shape that fails is logged and
/// skipped; the others are unaffected.
pub fn trace_mask(
    mask: GrayImage,
    config: &TracingConfig,
    fitter: &dyn SplineFitter,
) -> Result<TraceResult, TraceError> {
    config.validate()?;
    let t_start = Instant::now();

    // ── Boundaries ────────────────────────────────────────
    let polygons = contour::extract_shapes(&mask, config);
    let image_side = mask.width().min(mask.height()) as f64;
    let corner_count: usize = polygons.iter().map(Polygon::len).sum();
    log::info!(
        "  Contours    {} shapes, {} boundary points",
        polygons.len(),
        corner_count,
    );

    // ── Per-shape fit ─────────────────────────────────────
    let results: Vec<Result<ShapeRecord, TraceError>> = polygons
        .par_iter()
        .map(|polygon| process_shape(polygon, image_side, config, fitter))
        .collect();

    let mut shapes = Vec::with_capacity(results.len());
    let mut skipped = 0;
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(shape) => shapes.push(shape),
            Err(e) => {
                log::warn!("  Skip        shape {}: {}", index, e);
                skipped += 1;
            }
        }
    }

    let vertex_count: usize = shapes.iter().map(|s| s.vertices.len()).sum();
    let elapsed = t_start.elapsed().as_millis();
    log::info!(
        "  Result      {} shapes \u{00b7} {} vertices \u{00b7} {} skipped  ({}ms)",
        shapes.len(),
        vertex_count,
        skipped,
        elapsed,
    );

    Ok(TraceResult {
        shapes,
        skipped,
        mask,
    })
}

/// Turn one boundary polygon into its pruned closed bezier loop.
///
/// normalize → densify → fit → bezier decomposition → prune → denormalize
///
/// `image_side` is the shorter side of the source image, the normalization
/// frame when `config.scale_fix` is off.
pub fn process_shape(
    polygon: &Polygon,
    image_side: f64,
    config: &TracingConfig,
    fitter: &dyn SplineFitter,
) -> Result<ShapeRecord, TraceError> {
    let (points, norm) = normalize::normalize(polygon, config.scale_fix, image_side)?;
    let dense = densify::densify(&points, config.densify_factor);
    let spline = fitter.fit_periodic(&dense, config.tolerance, config.degree)?;
    let segments = spline::bezier::to_bezier_segments(&spline)?;
    let vertices = shape::vertices_from_segments(&segments);
    let pruned = prune::prune(&vertices, config.collinear_epsilon);
    log::debug!(
        "  Shape       {} corners → {} points → {} segments → {} vertices",
        polygon.len(),
        dense.len(),
        segments.len(),
        pruned.len(),
    );

    let restored = pruned
        .into_iter()
        .map(|v| v.map(|p| norm.invert(p)))
        .collect();
    Ok(ShapeRecord::new(restored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn rectangle(min: Point, max: Point) -> Polygon {
        Polygon::new(vec![
            min,
            Point::new(max.x, min.y),
            max,
            Point::new(min.x, max.y),
        ])
        .unwrap()
    }

    fn square(min: f64, max: f64) -> Polygon {
        rectangle(Point::new(min, min), Point::new(max, max))
    }

    fn ellipse(center: Point, rx: f64, ry: f64) -> Polygon {
        let points = (0..120)
            .map(|i| {
                let a = i as f64 * std::f64::consts::TAU / 120.0;
                Point::new(center.x + rx * a.cos(), center.y + ry * a.sin())
            })
            .collect();
        Polygon::new(points).unwrap()
    }

    /// Fitter that always fails, to exercise the skip path.
    struct Failing;

    impl SplineFitter for Failing {
        fn fit_periodic(
            &self,
            _points: &[Point],
            _tolerance: f64,
            _degree: usize,
        ) -> Result<spline::PeriodicSpline, TraceError> {
            Err(TraceError::Fit("no".into()))
        }
    }

    #[test]
    fn shape_is_returned_in_image_coordinates() {
        let config = TracingConfig::default();
        let record = process_shape(
            &square(100.0, 200.0),
            300.0,
            &config,
            &LeastSquaresFitter::default(),
        )
        .unwrap();
        assert_eq!(record.vertices.len(), 4);
        for v in &record.vertices {
            assert!(v.point.x > 90.0 && v.point.x < 210.0, "{:?}", v.point);
            assert!(v.point.y > 90.0 && v.point.y < 210.0, "{:?}", v.point);
        }
        assert!((record.centroid.x - 150.0).abs() < 10.0);
        assert!((record.centroid.y - 150.0).abs() < 10.0);
    }

    #[test]
    fn failing_shapes_are_skipped() {
        let mut mask = GrayImage::from_pixel(300, 300, image::Luma([255]));
        for y in 100..200 {
            for x in 100..200 {
                mask.put_pixel(x, y, image::Luma([0]));
            }
        }
        let result = trace_mask(mask, &TracingConfig::default(), &Failing).unwrap();
        assert!(result.shapes.is_empty());
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn invalid_tolerance_aborts_before_tracing() {
        let config = TracingConfig {
            tolerance: 0.0,
            ..TracingConfig::default()
        };
        let mask = GrayImage::new(10, 10);
        let err = trace_mask(mask, &config, &LeastSquaresFitter::default()).unwrap_err();
        assert!(matches!(err, TraceError::InvalidTolerance(_)));
    }

    #[test]
    fn rectangle_prunes_to_its_four_corners() {
        let min = Point::new(20.0, 40.0);
        let max = Point::new(120.0, 90.0);
        let record = process_shape(
            &rectangle(min, max),
            300.0,
            &TracingConfig::default(),
            &LeastSquaresFitter::default(),
        )
        .unwrap();

        assert_eq!(record.vertices.len(), 4);
        let corners = [min, Point::new(max.x, min.y), max, Point::new(min.x, max.y)];
        for corner in corners {
            assert!(
                record.vertices.iter().any(|v| v.point.distance(corner) < 1e-6),
                "no vertex at {:?}",
                corner
            );
        }
    }

    #[test]
    fn doubled_image_keeps_vertex_count() {
        let config = TracingConfig {
            scale_fix: false,
            ..TracingConfig::default()
        };
        let fitter = LeastSquaresFitter::default();
        let small = process_shape(
            &ellipse(Point::new(150.0, 120.0), 60.0, 35.0),
            300.0,
            &config,
            &fitter,
        )
        .unwrap();
        let large = process_shape(
            &ellipse(Point::new(300.0, 240.0), 120.0, 70.0),
            600.0,
            &config,
            &fitter,
        )
        .unwrap();

        assert_eq!(small.vertices.len(), large.vertices.len());
        for (a, b) in small.vertices.iter().zip(&large.vertices) {
            let halved = (b.point.to_vec2() / 2.0).to_point();
            assert!(a.point.distance(halved) < 1e-6, "{:?} vs {:?}", a.point, halved);
        }
    }
}
