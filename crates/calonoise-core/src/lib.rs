//! # calonoise-core
//!
//! **Electronic and pileup noise for calorimeter cells.**
//!
//! `calonoise-core` looks up the expected noise of every calorimeter cell from
//! per-layer noise curves binned in |eta|, smears cell energies with that
//! noise, and drops cells whose energy is not significant above it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use calonoise_core::{CellEnergyMap, NoiseConfig, NoiseTool};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let config = NoiseConfig {
//!     noise_file: "noise.json".into(),
//!     ..NoiseConfig::default()
//! };
//! let tool = NoiseTool::initialize(&config).expect("noise tool");
//!
//! let mut cells = CellEnergyMap::new();
//! cells.insert(0x1234, 0.25);
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! tool.add_random_cell_noise(&mut cells, &mut rng);
//! let removed = tool.filter_cell_noise(&mut cells);
//! println!("{removed} cells below {}*sigma", tool.threshold());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Noise file → NoiseTable ─┐
//!                          ├→ NoiseEstimator → CellCollectionProcessor
//! Readout → CellGeometry ──┘
//! ```
//!
//! Everything that can fail does so in [`NoiseTool::initialize`]. Per-cell
//! estimation is total: unresolvable cells and layers without curves get zero
//! noise, eta past the last bin uses the last bin.

pub mod bitfield;
pub mod config;
pub mod curve;
pub mod error;
pub mod estimator;
pub mod geometry;
pub mod positions;
pub mod processor;
pub mod segmentation;
pub mod source;
pub mod table;
pub mod tool;

/// Opaque 64-bit calorimeter cell identifier.
pub type CellId = u64;

pub use bitfield::{BitField, BitFieldCoder};
pub use config::{NoiseConfig, ReadoutConfig, load_config_from_path};
pub use curve::{CurveRecord, NoiseCurve};
pub use error::{NoiseError, Result};
pub use estimator::{NoiseComponents, NoiseEstimator, ZERO_NOISE_EPSILON};
pub use geometry::{CellGeometry, EtaResolution, ReadoutGeometry};
pub use positions::{
    BarrelPositions, CellPositions, EndcapPositions, Position, PositionedCell, PositionsSpec,
    SystemDispatch, SystemPositionsSpec, position_cells,
};
pub use processor::{CellCollectionProcessor, CellEnergyMap, GaussianSource};
pub use segmentation::{
    CartesianGridXySpec, EtaSegmentation, GridPhiEtaSpec, MultiSegmentationSpec,
    ResolvedSegmentation, SegmentationSpec, SubSegmentSpec, resolve_eta_segmentation,
};
pub use source::{CurveFile, CurveSource};
pub use table::{CurveFamily, EtaBinning, LayerNoiseCurve, NoiseTable};
pub use tool::NoiseTool;

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
