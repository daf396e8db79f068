use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while turning an image into platform outlines.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceError {
    #[error("image file does not exist: {}", .0.display())]
    InvalidInputPath(PathBuf),

    #[error("smoothing tolerance must be a positive number, got {0}")]
    InvalidTolerance(f64),

    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("only parametric b-splines can be converted to bezier segments")]
    UnsupportedSplineKind,

    #[error("invalid spline: {0}")]
    InvalidSpline(String),

    #[error("degenerate shape: {0}")]
    DegenerateShape(String),

    #[error("spline fit failed: {0}")]
    Fit(String),

    #[error("malformed record stream: {0}")]
    MalformedRecords(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
