//! Cell positions in 3D.
//!
//! Noise lookup can take eta from the full cell position instead of the
//! segmentation formula. Position providers implement [`CellPositions`];
//! [`SystemDispatch`] routes each cell to a per-system provider using the
//! `system` field of its id, and [`position_cells`] attaches positions to a
//! whole cell collection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::CellId;
use crate::bitfield::BitFieldCoder;
use crate::error::{NoiseError, Result};
use crate::processor::CellEnergyMap;
use crate::segmentation::ResolvedSegmentation;

/// Cartesian position (mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// From transverse radius, pseudorapidity and azimuth.
    pub fn from_rho_eta_phi(rho: f64, eta: f64, phi: f64) -> Self {
        Self {
            x: rho * phi.cos(),
            y: rho * phi.sin(),
            z: rho * eta.sinh(),
        }
    }

    /// Transverse radius.
    pub fn rho(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Pseudorapidity; 0 on the beam axis at z = 0.
    pub fn eta(&self) -> f64 {
        let rho = self.rho();
        if rho == 0.0 {
            return match self.z {
                z if z > 0.0 => f64::INFINITY,
                z if z < 0.0 => f64::NEG_INFINITY,
                _ => 0.0,
            };
        }
        (self.z / rho).asinh()
    }

    pub fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }
}

/// Anything that can place a cell in space.
pub trait CellPositions: Send + Sync {
    /// Center of the cell, or `None` if this provider does not know it.
    fn xyz_position(&self, cell_id: CellId) -> Option<Position>;
}

/// Barrel layers: fixed radius per layer, eta and phi from the grid.
#[derive(Debug, Clone)]
pub struct BarrelPositions {
    segmentation: ResolvedSegmentation,
    layer_index: usize,
    layer_radii: Vec<f64>,
}

impl BarrelPositions {
    pub fn new(
        segmentation: ResolvedSegmentation,
        layer_field: &str,
        layer_radii: Vec<f64>,
    ) -> Result<Self> {
        Ok(Self {
            layer_index: segmentation.decoder.index(layer_field)?,
            segmentation,
            layer_radii,
        })
    }
}

impl CellPositions for BarrelPositions {
    fn xyz_position(&self, cell_id: CellId) -> Option<Position> {
        let layer = self.segmentation.decoder.get_at(cell_id, self.layer_index);
        let rho = *self.layer_radii.get(usize::try_from(layer).ok()?)?;
        let eta = self.segmentation.eta(cell_id)?;
        let phi = self.segmentation.phi(cell_id)?;
        Some(Position::from_rho_eta_phi(rho, eta, phi))
    }
}

/// Endcap layers: fixed |z| per layer, the sign of z follows eta.
#[derive(Debug, Clone)]
pub struct EndcapPositions {
    segmentation: ResolvedSegmentation,
    layer_index: usize,
    layer_z: Vec<f64>,
}

impl EndcapPositions {
    pub fn new(
        segmentation: ResolvedSegmentation,
        layer_field: &str,
        layer_z: Vec<f64>,
    ) -> Result<Self> {
        Ok(Self {
            layer_index: segmentation.decoder.index(layer_field)?,
            segmentation,
            layer_z,
        })
    }
}

impl CellPositions for EndcapPositions {
    fn xyz_position(&self, cell_id: CellId) -> Option<Position> {
        let layer = self.segmentation.decoder.get_at(cell_id, self.layer_index);
        let abs_z = self.layer_z.get(usize::try_from(layer).ok()?)?.abs();
        let eta = self.segmentation.eta(cell_id)?;
        let phi = self.segmentation.phi(cell_id)?;
        if eta == 0.0 {
            return None;
        }
        let z = abs_z.copysign(eta);
        let rho = z / eta.sinh();
        Some(Position {
            x: rho * phi.cos(),
            y: rho * phi.sin(),
            z,
        })
    }
}

/// Routes cells to per-system providers by the value of a system field.
pub struct SystemDispatch {
    decoder: BitFieldCoder,
    system_index: usize,
    systems: BTreeMap<i64, Box<dyn CellPositions>>,
}

impl SystemDispatch {
    pub fn new(decoder: BitFieldCoder, system_field: &str) -> Result<Self> {
        Ok(Self {
            system_index: decoder.index(system_field)?,
            decoder,
            systems: BTreeMap::new(),
        })
    }

    /// Register the provider for one system id, replacing any previous one.
    pub fn add_system(&mut self, system_id: i64, provider: Box<dyn CellPositions>) {
        self.systems.insert(system_id, provider);
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }
}

impl CellPositions for SystemDispatch {
    fn xyz_position(&self, cell_id: CellId) -> Option<Position> {
        let system = self.decoder.get_at(cell_id, self.system_index);
        match self.systems.get(&system) {
            Some(provider) => provider.xyz_position(cell_id),
            None => {
                log::debug!("No position provider for system {system} (cell {cell_id})");
                None
            }
        }
    }
}

/// Position provider as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionsSpec {
    Barrel { layer_radii: Vec<f64> },
    Endcap { layer_z: Vec<f64> },
    BySystem {
        #[serde(default = "default_system_field")]
        system_field: String,
        systems: Vec<SystemPositionsSpec>,
    },
}

fn default_system_field() -> String {
    "system".into()
}

/// Provider for one system id inside [`PositionsSpec::BySystem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemPositionsSpec {
    pub system_id: i64,
    pub positions: PositionsSpec,
}

impl PositionsSpec {
    /// Instantiate the provider against a resolved segmentation.
    pub fn build(
        &self,
        segmentation: &ResolvedSegmentation,
        layer_field: &str,
    ) -> Result<Box<dyn CellPositions>> {
        match self {
            PositionsSpec::Barrel { layer_radii } => {
                check_layer_values("layer_radii", layer_radii)?;
                Ok(Box::new(BarrelPositions::new(
                    segmentation.clone(),
                    layer_field,
                    layer_radii.clone(),
                )?))
            }
            PositionsSpec::Endcap { layer_z } => {
                check_layer_values("layer_z", layer_z)?;
                Ok(Box::new(EndcapPositions::new(
                    segmentation.clone(),
                    layer_field,
                    layer_z.clone(),
                )?))
            }
            PositionsSpec::BySystem {
                system_field,
                systems,
            } => {
                let mut dispatch = SystemDispatch::new(segmentation.decoder.clone(), system_field)?;
                for system in systems {
                    let provider = system.positions.build(segmentation, layer_field)?;
                    dispatch.add_system(system.system_id, provider);
                }
                Ok(Box::new(dispatch))
            }
        }
    }
}

fn check_layer_values(what: &str, values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(NoiseError::Configuration(format!("{what} must not be empty")));
    }
    if let Some(v) = values.iter().find(|v| !(v.abs() > 0.0) || !v.is_finite()) {
        return Err(NoiseError::Configuration(format!(
            "{what} entries must be finite and non-zero, got {v}"
        )));
    }
    Ok(())
}

/// A cell with its energy and position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedCell {
    pub cell_id: CellId,
    pub energy: f64,
    pub position: Position,
}

/// Attach positions to every cell the provider can place, sorted by cell id.
pub fn position_cells(provider: &dyn CellPositions, cells: &CellEnergyMap) -> Vec<PositionedCell> {
    log::debug!("Input cell collection size: {}", cells.len());
    let mut out: Vec<PositionedCell> = cells
        .iter()
        .filter_map(|(&cell_id, &energy)| match provider.xyz_position(cell_id) {
            Some(position) => {
                log::debug!(
                    "Cell {cell_id} energy {energy}: position ({:.2}, {:.2}, {:.2}) mm",
                    position.x,
                    position.y,
                    position.z
                );
                Some(PositionedCell {
                    cell_id,
                    energy,
                    position,
                })
            }
            None => {
                log::debug!("No position for cell {cell_id}, skipped");
                None
            }
        })
        .collect();
    out.sort_by_key(|c| c.cell_id);
    log::debug!("Output positioned cell collection size: {}", out.len());
    out
}
