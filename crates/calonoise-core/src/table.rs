//! Per-layer noise table.
//!
//! Built once from a [`CurveSource`] and read-only afterwards. Curves are
//! addressed by `"<base name><layer + 1>"`, so layer 0 of the detector reads
//! `h_elecNoise_layer1` from the file.

use crate::curve::NoiseCurve;
use crate::error::{NoiseError, Result};
use crate::source::CurveSource;

/// Where to fetch one family of per-layer curves from.
#[derive(Clone, Copy)]
pub struct CurveFamily<'a> {
    pub source: &'a dyn CurveSource,
    pub base_name: &'a str,
}

impl<'a> CurveFamily<'a> {
    pub fn new(source: &'a dyn CurveSource, base_name: &'a str) -> Self {
        Self { source, base_name }
    }

    /// Curve name for a 0-based layer index.
    pub fn curve_name(&self, layer: usize) -> String {
        format!("{}{}", self.base_name, layer + 1)
    }

    fn fetch(&self, layer: usize) -> Result<NoiseCurve> {
        let name = self.curve_name(layer);
        log::debug!("Getting curve with a name {name}");
        let curve = self
            .source
            .curve(&name)
            .ok_or_else(|| NoiseError::MissingCurve { name: name.clone() })?;
        if curve.n_bins() < 1 {
            return Err(NoiseError::EmptyCurve { name });
        }
        Ok(curve.clone())
    }
}

/// Electronic and (optional) pileup noise for one radial layer.
#[derive(Debug, Clone)]
pub struct LayerNoiseCurve {
    pub electronic: NoiseCurve,
    pub pileup: Option<NoiseCurve>,
}

/// Uniform eta binning shared by every layer, derived from layer 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EtaBinning {
    pub first_bin_low_edge: f64,
    pub bin_width: f64,
    pub bin_count: usize,
}

impl EtaBinning {
    fn from_curve(curve: &NoiseCurve) -> Self {
        let n = curve.n_bins();
        let first = curve.bin_low_edge(1);
        let width = (curve.bin_low_edge(n) + curve.bin_width(n) - first) / n as f64;
        Self {
            first_bin_low_edge: first,
            bin_width: width,
            bin_count: n,
        }
    }

    /// 1-based bin for an |eta| value, clamped into `[1, bin_count]`.
    ///
    /// Values past the last edge use the last bin; values below the first
    /// edge use the first bin.
    pub fn bin_for(&self, abs_eta: f64) -> usize {
        let raw = ((abs_eta - self.first_bin_low_edge) / self.bin_width).floor();
        // NaN casts to 0 and lands in bin 1.
        let ibin = raw as i64 + 1;
        if ibin > self.bin_count as i64 {
            log::debug!(
                "eta outside range of the curves! Cell eta: {abs_eta} Nbins in curve: {}",
                self.bin_count
            );
        }
        ibin.clamp(1, self.bin_count as i64) as usize
    }
}

/// Immutable per-layer noise curves.
#[derive(Debug, Clone)]
pub struct NoiseTable {
    layers: Vec<LayerNoiseCurve>,
    binning: EtaBinning,
    pileup_enabled: bool,
}

impl NoiseTable {
    /// Load `layer_count` layers of electronic noise and, when `pileup` is
    /// given, the matching pileup curves.
    pub fn build(
        layer_count: usize,
        electronic: CurveFamily<'_>,
        pileup: Option<CurveFamily<'_>>,
    ) -> Result<Self> {
        let mut elec_curves = Vec::with_capacity(layer_count);
        let mut pileup_curves = Vec::with_capacity(layer_count);

        for layer in 0..layer_count {
            elec_curves.push(electronic.fetch(layer)?);
            if let Some(family) = &pileup {
                pileup_curves.push(family.fetch(layer)?);
            }
        }

        if elec_curves.is_empty() {
            return Err(NoiseError::NoNoiseData);
        }
        if pileup.is_some() && pileup_curves.len() != elec_curves.len() {
            return Err(NoiseError::LayerCountMismatch {
                electronic: elec_curves.len(),
                pileup: pileup_curves.len(),
            });
        }

        let layers: Vec<LayerNoiseCurve> = if pileup.is_some() {
            elec_curves
                .into_iter()
                .zip(pileup_curves)
                .map(|(electronic, pileup)| LayerNoiseCurve {
                    electronic,
                    pileup: Some(pileup),
                })
                .collect()
        } else {
            elec_curves
                .into_iter()
                .map(|electronic| LayerNoiseCurve {
                    electronic,
                    pileup: None,
                })
                .collect()
        };

        Self::from_layers(layers)
    }

    /// Assemble a table from already-loaded layers.
    ///
    /// Pileup must be present on every layer or on none, and each pileup
    /// curve must have as many bins as its electronic curve.
    pub fn from_layers(layers: Vec<LayerNoiseCurve>) -> Result<Self> {
        let first = layers.first().ok_or(NoiseError::NoNoiseData)?;
        let pileup_enabled = first.pileup.is_some();

        let with_pileup = layers.iter().filter(|l| l.pileup.is_some()).count();
        if with_pileup != 0 && with_pileup != layers.len() {
            return Err(NoiseError::LayerCountMismatch {
                electronic: layers.len(),
                pileup: with_pileup,
            });
        }

        for (i, layer) in layers.iter().enumerate() {
            if layer.electronic.n_bins() < 1 {
                return Err(NoiseError::EmptyCurve {
                    name: format!("electronic layer {i}"),
                });
            }
            if let Some(p) = &layer.pileup {
                if p.n_bins() != layer.electronic.n_bins() {
                    return Err(NoiseError::BinCountMismatch {
                        layer: i,
                        electronic: layer.electronic.n_bins(),
                        pileup: p.n_bins(),
                    });
                }
            }
            if !layer.electronic.same_binning(&first.electronic) {
                log::warn!("Layer {i} noise curve is binned differently from layer 0; layer 0 binning is used for all layers");
            }
        }

        let binning = EtaBinning::from_curve(&first.electronic);
        Ok(Self {
            layers,
            binning,
            pileup_enabled,
        })
    }

    /// Number of layers with noise data.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[LayerNoiseCurve] {
        &self.layers
    }

    /// Curves for a layer, `None` past the last loaded layer.
    pub fn layer(&self, index: usize) -> Option<&LayerNoiseCurve> {
        self.layers.get(index)
    }

    pub fn binning(&self) -> EtaBinning {
        self.binning
    }

    pub fn pileup_enabled(&self) -> bool {
        self.pileup_enabled
    }
}
