use featpyr::{
    harris_pyramid, DerivativeKernel, Image, ImagePyramid, PyramidDetectorConfig,
};
use serde::Deserialize;

const EXAMPLE_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/featpyr-cli/config.example.json"
));

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
enum KernelConfig {
    Three,
    #[default]
    Sobel,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectorJson {
    kind: String,
    feature_radius: usize,
    threshold: f32,
    max_features: usize,
    kernel: KernelConfig,
    parallel: bool,
}

impl Default for DetectorJson {
    fn default() -> Self {
        let cfg = PyramidDetectorConfig::default();
        Self {
            kind: "harris".to_string(),
            feature_radius: cfg.feature_radius,
            threshold: cfg.threshold,
            max_features: cfg.max_features,
            kernel: KernelConfig::Sobel,
            parallel: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigJson {
    image_path: String,
    output_path: Option<String>,
    max_levels: usize,
    detector: DetectorJson,
}

impl DetectorJson {
    fn to_config(&self) -> PyramidDetectorConfig {
        PyramidDetectorConfig {
            feature_radius: self.feature_radius,
            threshold: self.threshold,
            max_features: self.max_features,
            kernel: match self.kernel {
                KernelConfig::Three => DerivativeKernel::Three,
                KernelConfig::Sobel => DerivativeKernel::Sobel,
            },
        }
    }
}

#[test]
fn example_config_parses() {
    let config: ConfigJson = serde_json::from_str(EXAMPLE_JSON).unwrap();
    assert!(!config.image_path.is_empty());
    assert!(config.output_path.is_some());
    assert!(config.max_levels >= 3);
    assert_eq!(config.detector.kind, "harris");
    assert!(!config.detector.parallel);
    assert_eq!(config.detector.to_config(), PyramidDetectorConfig::default());
}

#[test]
fn partial_config_falls_back_to_defaults() {
    let config: ConfigJson =
        serde_json::from_str(r#"{ "detector": { "feature_radius": 4 } }"#).unwrap();
    let params = config.detector.to_config();
    assert_eq!(params.feature_radius, 4);
    assert_eq!(params.threshold, PyramidDetectorConfig::default().threshold);
    assert_eq!(params.kernel, DerivativeKernel::Sobel);
}

#[test]
fn example_config_runs_on_a_synthetic_image() {
    let config: ConfigJson = serde_json::from_str(EXAMPLE_JSON).unwrap();
    let mut img = Image::<u8>::new(96, 80);
    for y in 24..56 {
        for x in 30..70 {
            img.set(x, y, 220);
        }
    }
    let pyramid = ImagePyramid::build(img.view(), config.max_levels).unwrap();
    let mut detector = harris_pyramid(&config.detector.to_config());
    detector.detect(&pyramid).unwrap();
    for point in detector.interest_points() {
        assert!(point.x < 96 && point.y < 80, "{point:?}");
        assert!(point.scale > 1.0);
    }
}
