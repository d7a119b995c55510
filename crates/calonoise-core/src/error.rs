//! Initialization errors.
//!
//! Every variant here is raised while the tool is being set up. Once a
//! [`NoiseTable`](crate::NoiseTable) and geometry exist, per-cell estimation
//! is total and never produces an error.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading noise data, resolving geometry, or validating configuration.
#[derive(Debug, Error)]
pub enum NoiseError {
    /// Missing or contradictory configuration option.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A file could not be opened or read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document (noise curves, config, cells) could not be parsed.
    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// A required per-layer curve is absent from the noise source.
    #[error("noise curve {name} not found in the noise source")]
    MissingCurve { name: String },

    /// A per-layer curve exists but has zero bins.
    #[error("noise curve {name} has 0 bins, check the noise file and the curve name")]
    EmptyCurve { name: String },

    /// A curve record in the noise source is structurally invalid.
    #[error("noise curve {name} is malformed: {reason}")]
    MalformedCurve { name: String, reason: String },

    /// Zero electronic noise curves were loaded.
    #[error("no noise curves found")]
    NoNoiseData,

    /// Pileup is enabled but its curve count differs from the electronic one.
    #[error(
        "different number of curves for electronic noise ({electronic}) and pileup ({pileup})"
    )]
    LayerCountMismatch { electronic: usize, pileup: usize },

    /// Pileup curve of a layer is binned differently from its electronic curve.
    #[error(
        "layer {layer}: electronic curve has {electronic} bins but pileup curve has {pileup}"
    )]
    BinCountMismatch {
        layer: usize,
        electronic: usize,
        pileup: usize,
    },

    /// No usable eta segmentation could be found for the readout.
    #[error("geometry resolution failed: {0}")]
    GeometryResolution(String),

    /// A bit-field description is invalid or names an unknown field.
    #[error("bit field error: {0}")]
    BitField(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, NoiseError>;
