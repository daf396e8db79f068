use clap::builder::BoolishValueParser;
use clap::Parser;
use img2platform::{output, render, LeastSquaresFitter, TracingConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "img2platform",
    about = "Raster image to closed cubic bezier platform outlines"
)]
struct Cli {
    /// Input image path (PNG, JPEG, BMP)
    image: PathBuf,

    /// Gray level (0-255); brighter pixels are foreground
    #[arg(default_value = "110")]
    gray_threshold: u8,

    /// Smoothing tolerance for the spline fit (sum of squared residuals,
    /// in normalized coordinates). Lower = tighter fit, more vertices.
    #[arg(default_value = "1e-4", allow_hyphen_values = true)]
    tolerance: f64,

    /// Normalize each shape by its own bounding box (1/0/true/false)
    #[arg(default_value = "1", value_parser = BoolishValueParser::new())]
    scale_fix: bool,

    /// Invert the mask before tracing
    #[arg(long)]
    invert: bool,

    /// Write records to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a diagnostic overlay PNG (mask plus traced outlines)
    #[arg(long)]
    plot: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = TracingConfig {
        threshold: cli.gray_threshold,
        invert: cli.invert,
        tolerance: cli.tolerance,
        scale_fix: cli.scale_fix,
        ..TracingConfig::default()
    };

    log::info!("");
    log::info!("  img2platform \u{00b7} {}", cli.image.display());
    log::info!("");

    // Pipeline (lib logs step-by-step progress)
    let result = img2platform::trace_with(&cli.image, &config, &LeastSquaresFitter::default())?;

    match &cli.output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            output::write_records(&mut out, &result.shapes)?;
            out.flush()?;
            log::info!("  \u{2713} {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            output::write_records(&mut out, &result.shapes)?;
            out.flush()?;
        }
    }

    if let Some(plot_path) = &cli.plot {
        render::render_overlay(&result.mask, &result.shapes, plot_path)?;
    }

    Ok(())
}
