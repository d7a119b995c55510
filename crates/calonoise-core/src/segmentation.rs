//! Readout segmentations and eta resolution.
//!
//! A readout description ([`SegmentationSpec`]) may name any segmentation
//! type, but noise lookup needs a phi-eta grid. [`resolve_eta_segmentation`]
//! checks this once at initialization and produces an [`EtaSegmentation`]:
//!
//! - a plain phi-eta grid becomes [`EtaSegmentation::DirectGrid`],
//! - a multi-segmentation whose every region is a phi-eta grid becomes
//!   [`EtaSegmentation::CompositeByRegion`],
//! - anything else is a [`NoiseError::GeometryResolution`].

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::bitfield::BitFieldCoder;
use crate::error::{NoiseError, Result};

fn default_eta_field() -> String {
    "eta".into()
}

fn default_phi_field() -> String {
    "phi".into()
}

/// Phi-eta grid parameters as written in a readout description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPhiEtaSpec {
    pub grid_size_eta: f64,
    #[serde(default)]
    pub offset_eta: f64,
    pub phi_bins: u32,
    #[serde(default)]
    pub offset_phi: f64,
    #[serde(default = "default_eta_field")]
    pub eta_field: String,
    #[serde(default = "default_phi_field")]
    pub phi_field: String,
}

/// Cartesian x-y grid. Valid for a readout, but carries no eta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianGridXySpec {
    pub grid_size_x: f64,
    pub grid_size_y: f64,
}

/// One region of a multi-segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSegmentSpec {
    pub key_min: i64,
    pub key_max: i64,
    pub segmentation: SegmentationSpec,
}

/// Segmentation selected per cell by the value of a discriminator field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiSegmentationSpec {
    pub discriminator: String,
    pub segments: Vec<SubSegmentSpec>,
}

/// Segmentation of a readout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentationSpec {
    PhiEta(GridPhiEtaSpec),
    CartesianXy(CartesianGridXySpec),
    Multi(MultiSegmentationSpec),
}

impl SegmentationSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PhiEta(_) => "phi-eta grid",
            Self::CartesianXy(_) => "cartesian x-y grid",
            Self::Multi(_) => "multi-segmentation",
        }
    }
}

/// Phi-eta grid bound to the field positions of a decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct PhiEtaGrid {
    eta_index: usize,
    phi_index: usize,
    grid_size_eta: f64,
    offset_eta: f64,
    phi_bins: u32,
    offset_phi: f64,
}

impl PhiEtaGrid {
    fn bind(spec: &GridPhiEtaSpec, decoder: &BitFieldCoder) -> Result<Self> {
        if !(spec.grid_size_eta > 0.0) {
            return Err(NoiseError::Configuration(format!(
                "eta grid size must be positive, got {}",
                spec.grid_size_eta
            )));
        }
        if spec.phi_bins == 0 {
            return Err(NoiseError::Configuration(
                "phi grid needs at least one bin".into(),
            ));
        }
        Ok(Self {
            eta_index: decoder.index(&spec.eta_field)?,
            phi_index: decoder.index(&spec.phi_field)?,
            grid_size_eta: spec.grid_size_eta,
            offset_eta: spec.offset_eta,
            phi_bins: spec.phi_bins,
            offset_phi: spec.offset_phi,
        })
    }

    /// Eta at the center of the cell's eta bin.
    pub fn eta(&self, decoder: &BitFieldCoder, id: u64) -> f64 {
        decoder.get_at(id, self.eta_index) as f64 * self.grid_size_eta + self.offset_eta
    }

    /// Phi at the center of the cell's phi bin.
    pub fn phi(&self, decoder: &BitFieldCoder, id: u64) -> f64 {
        let size = 2.0 * PI / self.phi_bins as f64;
        decoder.get_at(id, self.phi_index) as f64 * size + self.offset_phi
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Region {
    key_min: i64,
    key_max: i64,
    grid: PhiEtaGrid,
}

/// Phi-eta grids selected by key range of a discriminator field.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeGrid {
    discriminator: usize,
    regions: Vec<Region>,
}

impl CompositeGrid {
    /// Grid for the region containing this cell, if any.
    pub fn grid_for(&self, decoder: &BitFieldCoder, id: u64) -> Option<&PhiEtaGrid> {
        let key = decoder.get_at(id, self.discriminator);
        self.regions
            .iter()
            .find(|r| (r.key_min..=r.key_max).contains(&key))
            .map(|r| &r.grid)
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

/// Resolved source of eta (and phi) for a readout.
#[derive(Debug, Clone, PartialEq)]
pub enum EtaSegmentation {
    DirectGrid(PhiEtaGrid),
    CompositeByRegion(CompositeGrid),
}

/// A resolved segmentation together with the decoder it reads ids with.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSegmentation {
    pub decoder: BitFieldCoder,
    pub segmentation: EtaSegmentation,
}

impl ResolvedSegmentation {
    fn grid(&self, id: u64) -> Option<&PhiEtaGrid> {
        match &self.segmentation {
            EtaSegmentation::DirectGrid(g) => Some(g),
            EtaSegmentation::CompositeByRegion(c) => c.grid_for(&self.decoder, id),
        }
    }

    /// Eta of a cell; `None` if no region of a composite covers it.
    pub fn eta(&self, id: u64) -> Option<f64> {
        self.grid(id).map(|g| g.eta(&self.decoder, id))
    }

    /// Phi of a cell; `None` if no region of a composite covers it.
    pub fn phi(&self, id: u64) -> Option<f64> {
        self.grid(id).map(|g| g.phi(&self.decoder, id))
    }

    pub fn kind(&self) -> &'static str {
        match self.segmentation {
            EtaSegmentation::DirectGrid(_) => "phi-eta grid",
            EtaSegmentation::CompositeByRegion(_) => "multi-segmentation of phi-eta grids",
        }
    }
}

/// Find the phi-eta segmentation of a readout, failing once if there is none.
pub fn resolve_eta_segmentation(
    readout: &str,
    spec: &SegmentationSpec,
    decoder: &BitFieldCoder,
) -> Result<ResolvedSegmentation> {
    let segmentation = match spec {
        SegmentationSpec::PhiEta(grid) => {
            EtaSegmentation::DirectGrid(PhiEtaGrid::bind(grid, decoder)?)
        }
        SegmentationSpec::Multi(multi) => {
            let discriminator = decoder.index(&multi.discriminator)?;
            let mut regions = Vec::with_capacity(multi.segments.len());
            for sub in &multi.segments {
                let SegmentationSpec::PhiEta(grid) = &sub.segmentation else {
                    return Err(NoiseError::GeometryResolution(format!(
                        "at least one of the sub-segmentations in multi-segmentation {readout} is not a phi-eta grid (found {})",
                        sub.segmentation.kind()
                    )));
                };
                if sub.key_min > sub.key_max {
                    return Err(NoiseError::Configuration(format!(
                        "sub-segmentation key range {}..={} of {readout} is empty",
                        sub.key_min, sub.key_max
                    )));
                }
                regions.push(Region {
                    key_min: sub.key_min,
                    key_max: sub.key_max,
                    grid: PhiEtaGrid::bind(grid, decoder)?,
                });
            }
            if regions.is_empty() {
                return Err(NoiseError::GeometryResolution(format!(
                    "multi-segmentation {readout} has no sub-segmentations"
                )));
            }
            EtaSegmentation::CompositeByRegion(CompositeGrid {
                discriminator,
                regions,
            })
        }
        other => {
            return Err(NoiseError::GeometryResolution(format!(
                "there is no phi-eta or multi- segmentation for the readout {readout} (found {})",
                other.kind()
            )));
        }
    };
    let resolved = ResolvedSegmentation {
        decoder: decoder.clone(),
        segmentation,
    };
    log::info!("Found {} for readout {readout}", resolved.kind());
    Ok(resolved)
}
