use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use plantport_device::{SerialConfig, DEFAULT_BAUD};
use plantport_runtime::{EngineOptions, FloatNorm, PostprocessOptions, DEFAULT_BOOST};

#[derive(Parser, Debug)]
#[command(
    name = "plantportd",
    version,
    about = "PlantPort plant identification and watering controller"
)]
pub struct Cli {
    /// Log level (RUST_LOG syntax)
    #[arg(long, default_value = "info", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify an image and print the top predictions
    Classify {
        #[command(flatten)]
        model: ModelArgs,

        /// Image to classify
        #[arg(long)]
        image: PathBuf,

        #[arg(long, default_value_t = plantport_runtime::DIAGNOSTIC_TOP_K)]
        top_k: usize,
    },
    /// Store a resized copy of an image in the photo directory, then classify it
    Scan {
        #[command(flatten)]
        model: ModelArgs,

        /// Captured image
        #[arg(long)]
        image: PathBuf,

        #[arg(long, default_value = "photos")]
        photos_dir: PathBuf,

        #[arg(long, default_value_t = plantport_runtime::SCAN_TOP_K)]
        top_k: usize,
    },
    /// Ask the controller for its sensor readings
    Status {
        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Run one watering cycle
    Water {
        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Keep model and device open and answer `scan <path>`, `status`, `water` lines from stdin
    Serve {
        #[command(flatten)]
        model: ModelArgs,

        #[command(flatten)]
        device: DeviceArgs,

        #[arg(long, default_value = "photos")]
        photos_dir: PathBuf,

        #[arg(long, default_value_t = plantport_runtime::SCAN_TOP_K)]
        top_k: usize,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Path to the ONNX classifier
    #[arg(long, default_value = "models/plant_classifier.onnx")]
    pub model: PathBuf,

    /// Class names, one per line, in model output order
    #[arg(long, default_value = "models/labels.txt")]
    pub labels: PathBuf,

    /// Boost classes whose name contains this text (e.g. 'kalanchoe')
    #[arg(long)]
    pub prefer: Option<String>,

    /// Boost factor for preferred classes (0.25 = +25%)
    #[arg(long, default_value_t = DEFAULT_BOOST)]
    pub boost: f64,

    /// Temperature for output smoothing (0.7-1.5 recommended)
    #[arg(long, default_value_t = 1.0)]
    pub temp: f64,

    /// Brightness adjustment (1.0 = none, 1.1 = slightly brighter)
    #[arg(long, default_value_t = 1.0)]
    pub brighten: f32,

    /// Pixel mapping for float models
    #[arg(long, value_enum, default_value_t = FloatNormArg::SignedUnit)]
    pub float_norm: FloatNormArg,

    /// ONNX Runtime intra-op threads
    #[arg(long)]
    pub threads: Option<usize>,
}

impl ModelArgs {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            float_norm: self.float_norm.into(),
            brightness: self.brighten,
        }
    }

    pub fn postprocess_options(&self) -> PostprocessOptions {
        PostprocessOptions {
            temperature: self.temp,
            prefer: self.prefer.clone(),
            boost: self.boost,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatNormArg {
    /// Map pixels into [-1, 1]
    SignedUnit,
    /// Feed raw 0-255 values
    Passthrough,
}

impl From<FloatNormArg> for FloatNorm {
    fn from(arg: FloatNormArg) -> Self {
        match arg {
            FloatNormArg::SignedUnit => FloatNorm::SignedUnit,
            FloatNormArg::Passthrough => FloatNorm::Passthrough,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Serial port of the controller
    #[arg(long, default_value = "/dev/ttyACM0")]
    pub port: String,

    #[arg(long, default_value_t = DEFAULT_BAUD)]
    pub baud: u32,

    /// Delay after opening the port before the first command
    #[arg(long, default_value_t = 2000)]
    pub settle_ms: u64,

    /// Override the per-command reply window
    #[arg(long)]
    pub wait_ms: Option<u64>,
}

impl DeviceArgs {
    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig {
            baud: self.baud,
            settle: Duration::from_millis(self.settle_ms),
            ..SerialConfig::new(&self.port)
        }
    }

    pub fn wait(&self) -> Option<Duration> {
        self.wait_ms.map(Duration::from_millis)
    }
}
