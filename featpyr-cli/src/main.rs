use clap::Parser;
use featpyr::image::io::load_gray_image;
use featpyr::{
    harris_pyramid, hessian_pyramid, shi_tomasi_pyramid, CachedDerivative, DerivativeKernel,
    FeatResult, FeatureExtractor, FeatureIntensity, FeaturePyramid, HessianBlobKind,
    ImagePyramid, PyramidDetectorConfig, ScalePoint,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Featpyr CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DetectorKind {
    Harris,
    ShiTomasi,
    HessianDeterminant,
    HessianTrace,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum KernelConfig {
    Three,
    Sobel,
}

impl From<KernelConfig> for DerivativeKernel {
    fn from(value: KernelConfig) -> Self {
        match value {
            KernelConfig::Three => DerivativeKernel::Three,
            KernelConfig::Sobel => DerivativeKernel::Sobel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectorConfigJson {
    kind: DetectorKind,
    feature_radius: usize,
    threshold: f32,
    max_features: usize,
    kernel: KernelConfig,
    parallel: bool,
}

impl Default for DetectorConfigJson {
    fn default() -> Self {
        let cfg = PyramidDetectorConfig::default();
        Self {
            kind: DetectorKind::Harris,
            feature_radius: cfg.feature_radius,
            threshold: cfg.threshold,
            max_features: cfg.max_features,
            kernel: KernelConfig::Sobel,
            parallel: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    image_path: String,
    output_path: Option<String>,
    max_levels: usize,
    detector: DetectorConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_path: String::new(),
            output_path: None,
            max_levels: 5,
            detector: DetectorConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PointRecord {
    x: usize,
    y: usize,
    scale: f64,
}

impl From<ScalePoint> for PointRecord {
    fn from(value: ScalePoint) -> Self {
        Self {
            x: value.x,
            y: value.y,
            scale: value.scale,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    count: usize,
    points: Vec<PointRecord>,
}

fn run<I, E>(
    mut detector: FeaturePyramid<I, E, CachedDerivative>,
    pyramid: &ImagePyramid<u8>,
    parallel: bool,
) -> FeatResult<Vec<ScalePoint>>
where
    I: FeatureIntensity<Deriv = f32>,
    E: FeatureExtractor,
{
    detector.derivative_mut().set_parallel(parallel);
    detector.detect(pyramid)?;
    Ok(detector.interest_points().to_vec())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("featpyr=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() {
        return Err("image_path must be set in the config".into());
    }
    if config.max_levels < 3 {
        return Err("max_levels must be at least 3".into());
    }

    let image = load_gray_image(&config.image_path)?;
    let pyramid = ImagePyramid::build(image.view(), config.max_levels)?;
    tracing::info!(
        width = image.width(),
        height = image.height(),
        levels = pyramid.levels().len(),
        "pyramid built"
    );

    let det = &config.detector;
    let params = PyramidDetectorConfig {
        feature_radius: det.feature_radius,
        threshold: det.threshold,
        max_features: det.max_features,
        kernel: det.kernel.into(),
    };
    let points = match det.kind {
        DetectorKind::Harris => run(harris_pyramid(&params), &pyramid, det.parallel)?,
        DetectorKind::ShiTomasi => run(shi_tomasi_pyramid(&params), &pyramid, det.parallel)?,
        DetectorKind::HessianDeterminant => run(
            hessian_pyramid(&params, HessianBlobKind::Determinant),
            &pyramid,
            det.parallel,
        )?,
        DetectorKind::HessianTrace => run(
            hessian_pyramid(&params, HessianBlobKind::Trace),
            &pyramid,
            det.parallel,
        )?,
    };

    let output = Output {
        count: points.len(),
        points: points.into_iter().map(PointRecord::from).collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
