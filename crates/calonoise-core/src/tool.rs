//! Configured noise tool: noise file, table, geometry and processor wired together.

use crate::CellId;
use crate::bitfield::BitFieldCoder;
use crate::config::NoiseConfig;
use crate::error::Result;
use crate::estimator::{NoiseComponents, NoiseEstimator};
use crate::geometry::{EtaResolution, ReadoutGeometry};
use crate::processor::{CellCollectionProcessor, CellEnergyMap, GaussianSource};
use crate::segmentation::resolve_eta_segmentation;
use crate::source::{CurveFile, CurveSource};
use crate::table::{CurveFamily, NoiseTable};

/// Noise tool built from a [`NoiseConfig`].
pub struct NoiseTool {
    processor: CellCollectionProcessor<ReadoutGeometry>,
}

impl NoiseTool {
    /// Validate the configuration, load the noise file and resolve geometry.
    /// Any failure aborts; nothing partially initialized is returned.
    pub fn initialize(config: &NoiseConfig) -> Result<Self> {
        config.validate()?;
        let curves = CurveFile::open(&config.noise_file)?;
        Self::with_curves(config, &curves)
    }

    /// Like [`initialize`](Self::initialize) but with curves already in memory.
    pub fn with_curves(config: &NoiseConfig, curves: &dyn CurveSource) -> Result<Self> {
        let table = NoiseTable::build(
            config.num_radial_layers,
            CurveFamily::new(curves, &config.elec_noise_curve_name),
            config
                .add_pileup
                .then(|| CurveFamily::new(curves, &config.pileup_curve_name)),
        )?;

        let readout = &config.readout;
        let decoder = BitFieldCoder::new(&readout.id_spec)?;
        let segmentation = resolve_eta_segmentation(&readout.name, &readout.segmentation, &decoder)?;

        let eta_resolution = match (&config.positions, config.use_segmentation) {
            (_, true) => EtaResolution::Segmentation,
            (Some(spec), false) => {
                EtaResolution::Positions(spec.build(&segmentation, &config.active_field_name)?)
            }
            (None, false) => {
                log::info!("No cell positions configured, using the eta-phi segmentation");
                EtaResolution::Segmentation
            }
        };
        let geometry =
            ReadoutGeometry::new(segmentation, &config.active_field_name, eta_resolution)?;

        log::debug!("Filter noise threshold: {}*sigma", config.filter_threshold);
        Ok(Self {
            processor: CellCollectionProcessor::new(
                NoiseEstimator::new(table, geometry),
                config.filter_threshold,
            ),
        })
    }

    pub fn table(&self) -> &NoiseTable {
        self.processor.estimator().table()
    }

    pub fn geometry(&self) -> &ReadoutGeometry {
        self.processor.estimator().geometry()
    }

    pub fn threshold(&self) -> f64 {
        self.processor.threshold()
    }

    /// Total noise sigma of a cell.
    pub fn noise_for(&self, cell_id: CellId) -> f64 {
        self.processor.estimator().estimate(cell_id)
    }

    pub fn noise_components(&self, cell_id: CellId) -> NoiseComponents {
        self.processor.estimator().components(cell_id)
    }

    /// See [`CellCollectionProcessor::add_random_cell_noise`].
    pub fn add_random_cell_noise<S: GaussianSource + ?Sized>(
        &self,
        cells: &mut CellEnergyMap,
        gauss: &mut S,
    ) -> usize {
        self.processor.add_random_cell_noise(cells, gauss)
    }

    /// See [`CellCollectionProcessor::filter_cell_noise`].
    pub fn filter_cell_noise(&self, cells: &mut CellEnergyMap) -> usize {
        self.processor.filter_cell_noise(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::NoiseCurve;
    use crate::error::NoiseError;
    use crate::positions::PositionsSpec;
    use crate::segmentation::{CartesianGridXySpec, SegmentationSpec};

    fn curves(layers: usize, pileup: bool) -> CurveFile {
        let mut f = CurveFile::new();
        for l in 1..=layers {
            f.insert(
                format!("h_elecNoise_layer{l}"),
                NoiseCurve::uniform(0.0, 0.1, vec![0.3; 30]),
            );
            if pileup {
                f.insert(
                    format!("h_pileup_layer{l}"),
                    NoiseCurve::uniform(0.0, 0.1, vec![0.4; 30]),
                );
            }
        }
        f
    }

    fn config() -> NoiseConfig {
        NoiseConfig {
            noise_file: "unused.json".into(),
            ..NoiseConfig::default()
        }
    }

    fn cell(tool: &NoiseTool, layer: i64, eta: i64) -> CellId {
        tool.geometry()
            .decoder()
            .encode(&[("system", 4), ("layer", layer), ("eta", eta)])
            .unwrap()
    }

    #[test]
    fn defaults_with_pileup() {
        let tool = NoiseTool::with_curves(&config(), &curves(3, true)).unwrap();
        assert!(tool.table().pileup_enabled());
        let id = cell(&tool, 1, 57);
        assert!((tool.noise_for(id) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn missing_pileup_curves_fail_initialization() {
        let Err(err) = NoiseTool::with_curves(&config(), &curves(3, false)) else {
            panic!("initialization should fail without pileup curves");
        };
        assert!(matches!(err, NoiseError::MissingCurve { name } if name == "h_pileup_layer1"));
    }

    #[test]
    fn non_phi_eta_readout_fails() {
        let mut cfg = config();
        cfg.readout.segmentation = SegmentationSpec::CartesianXy(CartesianGridXySpec {
            grid_size_x: 1.0,
            grid_size_y: 1.0,
        });
        let Err(err) = NoiseTool::with_curves(&cfg, &curves(3, true)) else {
            panic!("initialization should fail for a cartesian readout");
        };
        assert!(matches!(err, NoiseError::GeometryResolution(_)));
    }

    #[test]
    fn positions_requested_without_provider_falls_back() {
        let mut cfg = config();
        cfg.use_segmentation = false;
        let tool = NoiseTool::with_curves(&cfg, &curves(3, true)).unwrap();
        assert!(tool.geometry().uses_segmentation());
    }

    #[test]
    fn positions_provider_used_when_configured() {
        let mut cfg = config();
        cfg.use_segmentation = false;
        cfg.add_pileup = false;
        cfg.positions = Some(PositionsSpec::Barrel {
            layer_radii: vec![1920.0, 1950.0, 1980.0],
        });
        let tool = NoiseTool::with_curves(&cfg, &curves(3, false)).unwrap();
        assert!(!tool.geometry().uses_segmentation());
        assert!((tool.noise_for(cell(&tool, 2, -120)) - 0.3).abs() < 1e-12);
        // No radius for layer 5: cell cannot be placed, noise is zero.
        assert_eq!(tool.noise_for(cell(&tool, 5, 10)), 0.0);
    }

    #[test]
    fn initialize_reports_missing_file() {
        let cfg = NoiseConfig {
            noise_file: "/nonexistent/noise.json".into(),
            ..NoiseConfig::default()
        };
        assert!(matches!(
            NoiseTool::initialize(&cfg),
            Err(NoiseError::Io { .. })
        ));
    }
}
