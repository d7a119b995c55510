//! Noise injection and significance filtering over cell collections.

use std::collections::HashMap;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::CellId;
use crate::estimator::NoiseEstimator;
use crate::geometry::CellGeometry;

/// Cell id → deposited energy.
pub type CellEnergyMap = HashMap<CellId, f64>;

/// Source of unit Gaussian draws (mean 0, sigma 1).
///
/// Every [`rand::Rng`] is one, so a seeded `StdRng` can be passed directly.
pub trait GaussianSource {
    fn sample_standard(&mut self) -> f64;
}

impl<R: Rng> GaussianSource for R {
    fn sample_standard(&mut self) -> f64 {
        self.sample(StandardNormal)
    }
}

/// Applies a [`NoiseEstimator`] across cell collections.
pub struct CellCollectionProcessor<G> {
    estimator: NoiseEstimator<G>,
    threshold: f64,
}

impl<G: CellGeometry> CellCollectionProcessor<G> {
    /// `threshold` is in units of the per-cell noise sigma; `<= 0` disables filtering.
    pub fn new(estimator: NoiseEstimator<G>, threshold: f64) -> Self {
        Self {
            estimator,
            threshold,
        }
    }

    pub fn estimator(&self) -> &NoiseEstimator<G> {
        &self.estimator
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Add `sigma(cell) * N(0, 1)` to every cell. Returns the number of draws.
    pub fn add_random_cell_noise<S: GaussianSource + ?Sized>(
        &self,
        cells: &mut CellEnergyMap,
        gauss: &mut S,
    ) -> usize {
        for (&cell_id, energy) in cells.iter_mut() {
            *energy += self.estimator.estimate(cell_id) * gauss.sample_standard();
        }
        cells.len()
    }

    /// Remove every cell with `energy < threshold * sigma(cell)`.
    /// Returns the number of removed cells.
    pub fn filter_cell_noise(&self, cells: &mut CellEnergyMap) -> usize {
        if self.threshold <= 0.0 {
            log::debug!("Filter threshold {} <= 0, no filtering", self.threshold);
            return 0;
        }
        let before = cells.len();
        // `retain` visits each entry exactly once. NaN energies are kept.
        cells.retain(|&cell_id, energy| {
            !(*energy < self.threshold * self.estimator.estimate(cell_id))
        });
        let removed = before - cells.len();
        log::debug!(
            "Filtered {removed} of {before} cells below {}*sigma",
            self.threshold
        );
        removed
    }
}
