//! One-dimensional binned noise curves.
//!
//! A [`NoiseCurve`] is a histogram of noise magnitude versus |eta|. Bins are
//! numbered from 1 to `n_bins()` inclusive, as in the histogram files the
//! curves come from; bin 0 and bin `n_bins() + 1` are the (empty) underflow
//! and overflow bins.

use serde::{Deserialize, Serialize};

use crate::error::{NoiseError, Result};

/// Binned noise values for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseCurve {
    edges: Vec<f64>,
    contents: Vec<f64>,
}

impl NoiseCurve {
    /// Curve with `contents.len()` bins of equal width starting at `low_edge`.
    pub fn uniform(low_edge: f64, bin_width: f64, contents: Vec<f64>) -> Self {
        let edges = (0..=contents.len())
            .map(|i| low_edge + i as f64 * bin_width)
            .collect();
        Self { edges, contents }
    }

    /// Curve from explicit bin edges. `edges` must hold one more value than
    /// `contents` and be strictly increasing.
    pub fn from_edges(edges: Vec<f64>, contents: Vec<f64>) -> std::result::Result<Self, String> {
        if contents.is_empty() {
            return Ok(Self {
                edges: Vec::new(),
                contents,
            });
        }
        if edges.len() != contents.len() + 1 {
            return Err(format!(
                "expected {} bin edges for {} bins, got {}",
                contents.len() + 1,
                contents.len(),
                edges.len()
            ));
        }
        if let Some(w) = edges.windows(2).find(|w| !(w[1] > w[0])) {
            return Err(format!("bin edges not increasing at {} -> {}", w[0], w[1]));
        }
        Ok(Self { edges, contents })
    }

    /// Number of regular bins.
    pub fn n_bins(&self) -> usize {
        self.contents.len()
    }

    /// Low edge of 1-based bin `bin`. Bins past the last one continue with
    /// the last bin's width.
    pub fn bin_low_edge(&self, bin: usize) -> f64 {
        let n = self.n_bins();
        if n == 0 {
            return 0.0;
        }
        match bin {
            0 => self.edges[0] - self.bin_width(1),
            b if b <= n + 1 => self.edges[b - 1],
            b => self.edges[n] + (b - n - 1) as f64 * self.bin_width(n),
        }
    }

    /// Width of 1-based bin `bin`; under/overflow reuse the first/last width.
    pub fn bin_width(&self, bin: usize) -> f64 {
        let n = self.n_bins();
        if n == 0 {
            return 0.0;
        }
        let b = bin.clamp(1, n);
        self.edges[b] - self.edges[b - 1]
    }

    /// Content of 1-based bin `bin`, 0 for the under/overflow bins.
    pub fn bin_content(&self, bin: usize) -> f64 {
        match bin {
            0 => 0.0,
            b => self.contents.get(b - 1).copied().unwrap_or(0.0),
        }
    }

    /// Lower edge of the first bin.
    pub fn low_edge(&self) -> f64 {
        self.bin_low_edge(1)
    }

    /// Upper edge of the last bin.
    pub fn high_edge(&self) -> f64 {
        let n = self.n_bins();
        self.bin_low_edge(n) + self.bin_width(n)
    }

    /// All bin contents in order.
    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    /// Same number of bins and the same edges (to floating tolerance).
    pub fn same_binning(&self, other: &NoiseCurve) -> bool {
        self.edges.len() == other.edges.len()
            && self
                .edges
                .iter()
                .zip(&other.edges)
                .all(|(a, b)| (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0))
    }
}

/// On-disk form of a curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CurveRecord {
    Uniform {
        low_edge: f64,
        bin_width: f64,
        contents: Vec<f64>,
    },
    Edges {
        edges: Vec<f64>,
        contents: Vec<f64>,
    },
}

impl CurveRecord {
    /// Validate and convert into a [`NoiseCurve`]. `name` is only used for errors.
    pub fn into_curve(self, name: &str) -> Result<NoiseCurve> {
        let malformed = |reason: String| NoiseError::MalformedCurve {
            name: name.to_string(),
            reason,
        };
        match self {
            CurveRecord::Uniform {
                low_edge,
                bin_width,
                contents,
            } => {
                if !low_edge.is_finite() {
                    return Err(malformed(format!("low edge {low_edge} is not finite")));
                }
                if !(bin_width > 0.0) || !bin_width.is_finite() {
                    return Err(malformed(format!("bin width {bin_width} must be positive")));
                }
                Ok(NoiseCurve::uniform(low_edge, bin_width, contents))
            }
            CurveRecord::Edges { edges, contents } => {
                NoiseCurve::from_edges(edges, contents).map_err(malformed)
            }
        }
    }
}

impl From<&NoiseCurve> for CurveRecord {
    fn from(curve: &NoiseCurve) -> Self {
        CurveRecord::Edges {
            edges: curve.edges.clone(),
            contents: curve.contents.clone(),
        }
    }
}
