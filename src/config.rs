//! Tunable parameters for color extraction.
//!
//! Configuration can be loaded from JSON files or constructed programmatically:
//!
//! ```no_run
//! use piccolor::AnalyzerConfig;
//! use std::path::Path;
//!
//! let config = AnalyzerConfig::from_json_file(Path::new("piccolor.json"))?;
//! let defaults = AnalyzerConfig::default();
//! # Ok::<(), piccolor::AnalysisError>(())
//! ```
//!
//! Missing keys fall back to their defaults, so a file containing only
//! `{"max_colors": 8}` is valid.

use crate::cluster::MAX_CLUSTERS;
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_MAX_COLORS: usize = 16;
pub const DEFAULT_MIN_PIXEL_THRESHOLD: u32 = 100;
/// Longest side of the sample the histogram is computed on
pub const DEFAULT_MAX_DIMENSION: u32 = 800;
/// Euclidean RGB distance under which a pixel counts as "this color" when locating it
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 30.0;
pub const DEFAULT_MAX_FILE_SIZE_MB: f64 = 50.0;

/// How pixels are grouped into palette entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// Every distinct RGB triple is its own entry
    #[default]
    Exact,
    /// Near colors are merged by k-means in Lab space
    KMeans,
}

impl FromStr for Grouping {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(Grouping::Exact),
            "kmeans" | "k-means" => Ok(Grouping::KMeans),
            other => Err(AnalysisError::invalid_config("grouping", other)),
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grouping::Exact => f.write_str("exact"),
            Grouping::KMeans => f.write_str("kmeans"),
        }
    }
}

/// Complete analyzer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Cap on returned palette entries
    pub max_colors: usize,

    /// Minimum count in the downscaled sample for a color to be kept
    pub min_pixel_threshold: u32,

    /// Images whose longer side exceeds this are resampled before counting
    pub max_dimension: u32,

    /// Mask radius used by the position locator
    pub similarity_threshold: f32,

    /// Files above this size are rejected before decoding
    pub max_file_size_mb: f64,

    pub grouping: Grouping,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_colors: DEFAULT_MAX_COLORS,
            min_pixel_threshold: DEFAULT_MIN_PIXEL_THRESHOLD,
            max_dimension: DEFAULT_MAX_DIMENSION,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            grouping: Grouping::Exact,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_max_colors(mut self, max_colors: usize) -> Self {
        self.max_colors = max_colors;
        self
    }

    pub fn with_min_pixel_threshold(mut self, threshold: u32) -> Self {
        self.min_pixel_threshold = threshold;
        self
    }

    pub fn with_grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = grouping;
        self
    }

    /// Reject values the extractor cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_colors == 0 {
            return Err(AnalysisError::invalid_config("max_colors", self.max_colors));
        }
        if self.grouping == Grouping::KMeans && self.max_colors > MAX_CLUSTERS {
            return Err(AnalysisError::invalid_config("max_colors", self.max_colors));
        }
        if self.max_dimension == 0 {
            return Err(AnalysisError::invalid_config(
                "max_dimension",
                self.max_dimension,
            ));
        }
        if !self.similarity_threshold.is_finite() || self.similarity_threshold <= 0.0 {
            return Err(AnalysisError::invalid_config(
                "similarity_threshold",
                self.similarity_threshold,
            ));
        }
        if !self.max_file_size_mb.is_finite() || self.max_file_size_mb <= 0.0 {
            return Err(AnalysisError::invalid_config(
                "max_file_size_mb",
                self.max_file_size_mb,
            ));
        }
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            AnalysisError::config(format!("cannot parse {}", path.display()), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::config("cannot serialize configuration", e))?;
        std::fs::write(path, json).map_err(|e| AnalysisError::io(path, e))?;
        Ok(())
    }
}
