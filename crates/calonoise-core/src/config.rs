//! Tool configuration.
//!
//! Loaded from JSON (every field optional, defaults below) and usually
//! adjusted from command-line flags before [`NoiseTool::initialize`] runs.
//!
//! [`NoiseTool::initialize`]: crate::NoiseTool::initialize

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NoiseError, Result};
use crate::positions::PositionsSpec;
use crate::segmentation::{GridPhiEtaSpec, SegmentationSpec};

/// Readout the cells belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadoutConfig {
    /// Readout name, used in diagnostics.
    pub name: String,
    /// Bit-field layout of cell ids, e.g. `"system:4,layer:8,eta:-10,phi:10"`.
    pub id_spec: String,
    /// Segmentation of the readout.
    pub segmentation: SegmentationSpec,
}

impl Default for ReadoutConfig {
    fn default() -> Self {
        Self {
            name: "ECalBarrelPhiEta".into(),
            id_spec: "system:4,cryo:1,type:3,subtype:3,layer:8,eta:-10,phi:10".into(),
            segmentation: SegmentationSpec::PhiEta(GridPhiEtaSpec {
                grid_size_eta: 0.01,
                offset_eta: 0.0,
                phi_bins: 704,
                offset_phi: 0.0,
                eta_field: "eta".into(),
                phi_field: "phi".into(),
            }),
        }
    }
}

/// Noise tool configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// JSON (or `.json.gz`) file with the per-layer noise curves.
    pub noise_file: PathBuf,
    /// Base name of electronic noise curves; the 1-based layer number is appended.
    pub elec_noise_curve_name: String,
    /// Base name of pileup noise curves; the 1-based layer number is appended.
    pub pileup_curve_name: String,
    /// Number of radial layers to load curves for.
    pub num_radial_layers: usize,
    /// Add pileup noise in quadrature to electronic noise.
    pub add_pileup: bool,
    /// Cells with energy below `filter_threshold * sigma` are dropped; `<= 0` keeps all.
    pub filter_threshold: f64,
    /// Take eta from the segmentation formula instead of cell positions.
    pub use_segmentation: bool,
    /// Id field holding the radial layer.
    pub active_field_name: String,
    pub readout: ReadoutConfig,
    /// Position provider, needed when `use_segmentation` is false.
    pub positions: Option<PositionsSpec>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            noise_file: PathBuf::new(),
            elec_noise_curve_name: "h_elecNoise_layer".into(),
            pileup_curve_name: "h_pileup_layer".into(),
            num_radial_layers: 3,
            add_pileup: true,
            filter_threshold: 3.0,
            use_segmentation: true,
            active_field_name: "layer".into(),
            readout: ReadoutConfig::default(),
            positions: None,
        }
    }
}

impl NoiseConfig {
    /// Reject configurations that cannot produce a working tool.
    pub fn validate(&self) -> Result<()> {
        if self.noise_file.as_os_str().is_empty() {
            return Err(NoiseError::Configuration(
                "name of the file with noise values not set".into(),
            ));
        }
        if self.elec_noise_curve_name.trim().is_empty() {
            return Err(NoiseError::Configuration(
                "electronic noise curve name not set".into(),
            ));
        }
        if self.add_pileup && self.pileup_curve_name.trim().is_empty() {
            return Err(NoiseError::Configuration(
                "pileup enabled but pileup curve name not set".into(),
            ));
        }
        if !self.filter_threshold.is_finite() {
            return Err(NoiseError::Configuration(format!(
                "filter threshold must be finite, got {}",
                self.filter_threshold
            )));
        }
        if self.active_field_name.trim().is_empty() {
            return Err(NoiseError::Configuration("active field name not set".into()));
        }
        Ok(())
    }
}

/// Load a configuration JSON file.
pub fn load_config_from_path(path: &Path) -> Result<NoiseConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| NoiseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str::<NoiseConfig>(&raw).map_err(|source| NoiseError::Parse {
        what: format!("configuration {}", path.display()),
        source,
    })
}
