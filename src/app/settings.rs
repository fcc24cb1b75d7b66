use crate::entrypoints::cli::parse_args;
use clap::{Parser, ValueEnum};
use geo::Rect;
use shape_lod_lib::builder::DEFAULT_SAMPLE_INTERVAL;
use shape_lod_lib::{BuildMethod, Config, utils};
use std::path::PathBuf;

/// Tree construction method as named on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Evict least important vertices first (best quality)
    Sort,
    /// Evict every n-th vertex (linear time)
    Sample,
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Shape LOD - Decode a shapefile and print its geometry at a level of detail
pub struct Settings {
    /// Shapefile (.shp) to load
    #[clap(value_name = "FILE")]
    pub file: PathBuf,

    /// Tree construction method
    #[clap(short, long, value_enum, default_value_t = Method::Sort)]
    pub method: Method,

    /// Stride for the sample method
    #[clap(long, default_value_t = DEFAULT_SAMPLE_INTERVAL)]
    pub interval: usize,

    /// Keep at least three vertices per polygon ring
    #[clap(long)]
    pub polygon_floor: bool,

    /// Importance threshold in squared map units (overrides the viewport)
    #[clap(short, long)]
    pub threshold: Option<f64>,

    /// Viewport width in pixels used to derive the threshold
    #[clap(long, default_value = "1920")]
    pub viewport_width: u32,

    /// Viewport height in pixels used to derive the threshold
    #[clap(long, default_value = "1080")]
    pub viewport_height: u32,

    /// LOD bias (higher = more detail)
    #[clap(short, long, default_value = "1.0")]
    pub bias: f64,

    /// Print the simplified geometry as JSON on stdout
    #[clap(long)]
    pub json: bool,
}

impl Settings {
    /// Parse settings, exiting with usage on error
    pub fn from_cli() -> Self {
        match parse_args::<Settings>() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    pub fn config(&self) -> Config {
        let method = match self.method {
            Method::Sort => BuildMethod::Sort,
            Method::Sample => BuildMethod::Sample {
                interval: self.interval,
            },
        };
        Config {
            method,
            polygon_floor: self.polygon_floor,
        }
    }

    /// Explicit threshold, or the one that fits `bounds` into the viewport
    pub fn threshold_for(&self, bounds: Rect<f64>) -> f64 {
        self.threshold.unwrap_or_else(|| {
            utils::importance_threshold(
                bounds,
                (self.viewport_width as f64, self.viewport_height as f64),
                self.bias,
            )
        })
    }
}
