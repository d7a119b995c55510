//! What the noise estimator needs to know about a cell.

use crate::CellId;
use crate::bitfield::BitFieldCoder;
use crate::error::Result;
use crate::positions::CellPositions;
use crate::segmentation::ResolvedSegmentation;

/// Cell geometry as seen by the noise estimator.
///
/// Returning `None` means the cell could not be resolved; the estimator then
/// reports zero noise for it instead of failing.
pub trait CellGeometry {
    /// Pseudorapidity of the cell center (signed).
    fn eta(&self, cell_id: CellId) -> Option<f64>;

    /// 0-based radial layer index.
    fn layer(&self, cell_id: CellId) -> Option<usize>;
}

impl<G: CellGeometry + ?Sized> CellGeometry for &G {
    fn eta(&self, cell_id: CellId) -> Option<f64> {
        (**self).eta(cell_id)
    }

    fn layer(&self, cell_id: CellId) -> Option<usize> {
        (**self).layer(cell_id)
    }
}

impl<G: CellGeometry + ?Sized> CellGeometry for Box<G> {
    fn eta(&self, cell_id: CellId) -> Option<f64> {
        (**self).eta(cell_id)
    }

    fn layer(&self, cell_id: CellId) -> Option<usize> {
        (**self).layer(cell_id)
    }
}

/// How a [`ReadoutGeometry`] obtains eta.
pub enum EtaResolution {
    /// Directly from the segmentation formula.
    Segmentation,
    /// From the full cell position.
    Positions(Box<dyn CellPositions>),
}

/// Geometry backed by a readout: layer from an id bit field, eta from the
/// segmentation or from a position provider.
pub struct ReadoutGeometry {
    segmentation: ResolvedSegmentation,
    layer_index: usize,
    eta_resolution: EtaResolution,
}

impl ReadoutGeometry {
    pub fn new(
        segmentation: ResolvedSegmentation,
        layer_field: &str,
        eta_resolution: EtaResolution,
    ) -> Result<Self> {
        Ok(Self {
            layer_index: segmentation.decoder.index(layer_field)?,
            segmentation,
            eta_resolution,
        })
    }

    pub fn decoder(&self) -> &BitFieldCoder {
        &self.segmentation.decoder
    }

    pub fn segmentation(&self) -> &ResolvedSegmentation {
        &self.segmentation
    }

    /// `true` when eta comes from the segmentation formula.
    pub fn uses_segmentation(&self) -> bool {
        matches!(self.eta_resolution, EtaResolution::Segmentation)
    }
}

impl CellGeometry for ReadoutGeometry {
    fn eta(&self, cell_id: CellId) -> Option<f64> {
        match &self.eta_resolution {
            EtaResolution::Segmentation => self.segmentation.eta(cell_id),
            EtaResolution::Positions(p) => p.xyz_position(cell_id).map(|pos| pos.eta()),
        }
    }

    fn layer(&self, cell_id: CellId) -> Option<usize> {
        usize::try_from(self.segmentation.decoder.get_at(cell_id, self.layer_index)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positions::BarrelPositions;
    use crate::segmentation::{GridPhiEtaSpec, SegmentationSpec, resolve_eta_segmentation};

    fn segmentation() -> ResolvedSegmentation {
        let decoder = BitFieldCoder::new("system:4,layer:-5,eta:-10,phi:10").unwrap();
        let spec = SegmentationSpec::PhiEta(GridPhiEtaSpec {
            grid_size_eta: 0.01,
            offset_eta: 0.0,
            phi_bins: 16,
            offset_phi: 0.0,
            eta_field: "eta".into(),
            phi_field: "phi".into(),
        });
        resolve_eta_segmentation("ECal", &spec, &decoder).unwrap()
    }

    #[test]
    fn eta_and_layer_from_segmentation() {
        let seg = segmentation();
        let id = seg.decoder.encode(&[("layer", 3), ("eta", -42)]).unwrap();
        let geo = ReadoutGeometry::new(seg, "layer", EtaResolution::Segmentation).unwrap();
        assert!(geo.uses_segmentation());
        assert!((geo.eta(id).unwrap() + 0.42).abs() < 1e-12);
        assert_eq!(geo.layer(id), Some(3));
    }

    #[test]
    fn eta_from_positions_matches_segmentation() {
        let seg = segmentation();
        let id = seg
            .decoder
            .encode(&[("layer", 1), ("eta", 137), ("phi", 5)])
            .unwrap();
        let barrel = BarrelPositions::new(seg.clone(), "layer", vec![1800.0, 1900.0]).unwrap();
        let geo =
            ReadoutGeometry::new(seg, "layer", EtaResolution::Positions(Box::new(barrel))).unwrap();
        assert!(!geo.uses_segmentation());
        assert!((geo.eta(id).unwrap() - 1.37).abs() < 1e-9);
    }

    #[test]
    fn negative_layer_is_unresolved() {
        let seg = segmentation();
        let id = seg.decoder.encode(&[("layer", -2)]).unwrap();
        let geo = ReadoutGeometry::new(seg, "layer", EtaResolution::Segmentation).unwrap();
        assert_eq!(geo.layer(id), None);
    }

    #[test]
    fn unknown_layer_field() {
        assert!(ReadoutGeometry::new(segmentation(), "depth", EtaResolution::Segmentation).is_err());
    }
}
