//! Per-cell noise lookup.
//!
//! For a cell at |eta| in layer `l`:
//!
//! ```text
//! bin   = floor((|eta| - first_low_edge) / bin_width) + 1, clamped to [1, n_bins]
//! elec  = electronic[l][bin]
//! pu    = pileup[l][bin]            (0 when pileup is disabled)
//! noise = sqrt(elec^2 + pu^2)
//! ```
//!
//! Binning always comes from layer 0. Cells in layers without curves, and
//! cells the geometry cannot resolve, get zero noise.

use serde::Serialize;

use crate::CellId;
use crate::geometry::CellGeometry;
use crate::table::NoiseTable;

/// Noise below this is reported as a diagnostic.
pub const ZERO_NOISE_EPSILON: f64 = 1e-3;

/// Breakdown of one noise lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoiseComponents {
    pub cell_id: CellId,
    /// Signed eta from the geometry, `None` if unresolved.
    pub eta: Option<f64>,
    pub layer: Option<usize>,
    /// 1-based eta bin used for the lookup.
    pub bin: Option<usize>,
    pub electronic: f64,
    pub pileup: f64,
    pub total: f64,
}

/// Combines a noise table with cell geometry.
pub struct NoiseEstimator<G> {
    table: NoiseTable,
    geometry: G,
}

impl<G: CellGeometry> NoiseEstimator<G> {
    pub fn new(table: NoiseTable, geometry: G) -> Self {
        Self { table, geometry }
    }

    pub fn table(&self) -> &NoiseTable {
        &self.table
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Total noise (sigma) of a cell. Never fails; lookup misses give 0.
    pub fn estimate(&self, cell_id: CellId) -> f64 {
        self.components(cell_id).total
    }

    /// Full lookup breakdown for a cell.
    pub fn components(&self, cell_id: CellId) -> NoiseComponents {
        let eta = self.geometry.eta(cell_id);
        let layer = self.geometry.layer(cell_id);
        let mut out = NoiseComponents {
            cell_id,
            eta,
            layer,
            bin: None,
            electronic: 0.0,
            pileup: 0.0,
            total: 0.0,
        };

        let (Some(eta), Some(layer)) = (eta, layer) else {
            log::debug!("Cell {cell_id} could not be resolved (eta {eta:?}, layer {layer:?}), zero noise");
            return out;
        };

        let bin = self.table.binning().bin_for(eta.abs());
        out.bin = Some(bin);

        match self.table.layer(layer) {
            Some(curves) => {
                out.electronic = curves.electronic.bin_content(bin);
                if let Some(pileup) = &curves.pileup {
                    out.pileup = pileup.bin_content(bin);
                }
            }
            None => {
                log::debug!(
                    "More radial layers than we have noise for! Cell {cell_id} layer {layer}, noise curves for {} layers",
                    self.table.layer_count()
                );
            }
        }

        out.total = out.electronic.hypot(out.pileup);
        if out.total < ZERO_NOISE_EPSILON {
            log::debug!(
                "Zero noise: cell eta {eta} layer {layer} noise {}",
                out.total
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::NoiseCurve;
    use crate::table::LayerNoiseCurve;
    use std::collections::HashMap;

    /// Geometry from a fixed cell list.
    struct FixedGeometry(HashMap<CellId, (f64, usize)>);

    impl CellGeometry for FixedGeometry {
        fn eta(&self, cell_id: CellId) -> Option<f64> {
            self.0.get(&cell_id).map(|c| c.0)
        }

        fn layer(&self, cell_id: CellId) -> Option<usize> {
            self.0.get(&cell_id).map(|c| c.1)
        }
    }

    fn table(pileup: bool) -> NoiseTable {
        let layers = (0..2)
            .map(|l| LayerNoiseCurve {
                electronic: NoiseCurve::uniform(
                    0.0,
                    0.1,
                    (0..10).map(|b| (l * 10 + b + 1) as f64).collect(),
                ),
                pileup: pileup.then(|| NoiseCurve::uniform(0.0, 0.1, vec![2.0; 10])),
            })
            .collect();
        NoiseTable::from_layers(layers).unwrap()
    }

    fn geometry(cells: &[(CellId, f64, usize)]) -> FixedGeometry {
        FixedGeometry(cells.iter().map(|&(id, eta, l)| (id, (eta, l))).collect())
    }

    #[test]
    fn electronic_only_is_exact() {
        let est = NoiseEstimator::new(table(false), geometry(&[(1, 0.25, 0), (2, 0.25, 1)]));
        assert_eq!(est.estimate(1), 3.0);
        assert_eq!(est.estimate(2), 13.0);
    }

    #[test]
    fn negative_eta_uses_magnitude() {
        let est = NoiseEstimator::new(table(false), geometry(&[(1, -0.25, 0), (2, 0.25, 0)]));
        assert_eq!(est.estimate(1), est.estimate(2));
    }

    #[test]
    fn pileup_adds_in_quadrature() {
        let est = NoiseEstimator::new(table(true), geometry(&[(1, 0.05, 0)]));
        let c = est.components(1);
        assert_eq!(c.electronic, 1.0);
        assert_eq!(c.pileup, 2.0);
        assert!((c.total - 5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn eta_past_last_bin_clamps() {
        let est = NoiseEstimator::new(table(false), geometry(&[(1, 5.0, 0)]));
        let c = est.components(1);
        assert_eq!(c.bin, Some(10));
        assert_eq!(c.total, 10.0);
    }

    #[test]
    fn unknown_layer_gives_zero() {
        let est = NoiseEstimator::new(table(true), geometry(&[(1, 0.25, 2), (2, 0.25, 99)]));
        assert_eq!(est.estimate(1), 0.0);
        assert_eq!(est.estimate(2), 0.0);
        assert_eq!(est.components(1).bin, Some(3));
    }

    #[test]
    fn unresolved_cell_gives_zero() {
        let est = NoiseEstimator::new(table(false), geometry(&[]));
        let c = est.components(42);
        assert_eq!(c.total, 0.0);
        assert_eq!(c.bin, None);
        assert_eq!(c.eta, None);
    }

    #[test]
    fn every_bin_reachable() {
        let cells: Vec<(CellId, f64, usize)> =
            (0..10).map(|b| (b as CellId, b as f64 * 0.1 + 0.05, 0)).collect();
        let est = NoiseEstimator::new(table(false), geometry(&cells));
        for b in 0..10u64 {
            assert_eq!(est.estimate(b), (b + 1) as f64);
        }
    }
}
