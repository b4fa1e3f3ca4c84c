use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};

pub const DEFAULT_MIN_QUALITY: i32 = 4;
pub const DEFAULT_QUALITY_WINDOW: usize = 3;
pub const DEFAULT_MIN_LENGTH_FRACTION: f64 = 0.75;
pub const DEFAULT_MAX_AMBIGUOUS: usize = 0;

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(
    name = "qfilter",
    version,
    about = "Filter and truncate demultiplexed reads by PHRED score and ambiguous base calls"
)]
pub struct Cli {
    /// Demultiplexed input directory (MANIFEST, metadata.yml, *.fastq.gz)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output directory for the filtered reads; must not exist yet
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Per-sample filtering statistics (CSV)
    #[arg(short = 's', long = "stats", default_value = "stats.csv")]
    pub stats: PathBuf,
    /// Optional JSON summary report
    #[arg(short = 'j', long = "json")]
    pub json: Option<PathBuf>,

    /// Minimum acceptable PHRED score; lower scores count as low quality
    #[arg(short = 'q', long = "min-quality", default_value_t = DEFAULT_MIN_QUALITY, allow_hyphen_values = true)]
    pub min_quality: i32,
    /// Maximum number of consecutive low scores tolerated before truncating
    #[arg(short = 'w', long = "quality-window", default_value_t = DEFAULT_QUALITY_WINDOW)]
    pub quality_window: usize,
    /// Minimum retained length after truncation, as a fraction of the input length
    #[arg(short = 'l', long = "min-length-fraction", default_value_t = DEFAULT_MIN_LENGTH_FRACTION)]
    pub min_length_fraction: f64,
    /// Maximum number of ambiguous (N) base calls, applied after truncation
    #[arg(short = 'n', long = "max-ambiguous", default_value_t = DEFAULT_MAX_AMBIGUOUS)]
    pub max_ambiguous: usize,

    /// Worker threads; 0 uses every available core
    #[arg(short = 't', long = "thread", default_value_t = 0)]
    pub thread: usize,
    /// Gzip level for the filtered reads
    #[arg(short = 'z', long = "compression", default_value_t = 4, value_parser = clap::value_parser!(u32).range(0..=9))]
    pub compression: u32,
}

impl Cli {
    pub fn filter_params(&self) -> Result<FilterParams> {
        FilterParams::new(
            self.min_quality,
            self.quality_window,
            self.min_length_fraction,
            self.max_ambiguous,
        )
    }

    pub fn threads(&self) -> usize {
        if self.thread == 0 {
            num_cpus::get()
        } else {
            self.thread
        }
    }
}

/// Thresholds shared read-only by every sample of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub min_quality: i32,
    pub quality_window: usize,
    pub min_length_fraction: f64,
    pub max_ambiguous: usize,
}

impl FilterParams {
    pub fn new(
        min_quality: i32,
        quality_window: usize,
        min_length_fraction: f64,
        max_ambiguous: usize,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&min_length_fraction) {
            return Err(FilterError::InvalidParameter {
                name: "min_length_fraction",
                reason: format!("must be within [0, 1], got {}", min_length_fraction),
            });
        }
        Ok(Self {
            min_quality,
            quality_window,
            min_length_fraction,
            max_ambiguous,
        })
    }
}

impl Default for FilterParams {
    /// Bokulich et al., Nature Methods 2013.
    fn default() -> Self {
        Self {
            min_quality: DEFAULT_MIN_QUALITY,
            quality_window: DEFAULT_QUALITY_WINDOW,
            min_length_fraction: DEFAULT_MIN_LENGTH_FRACTION,
            max_ambiguous: DEFAULT_MAX_AMBIGUOUS,
        }
    }
}
