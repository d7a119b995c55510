//! Named containers of noise curves.
//!
//! The noise table never reads files itself: it asks a [`CurveSource`] for
//! curves by name. [`CurveFile`] is the on-disk implementation, a JSON
//! document (optionally gzip-compressed) mapping curve names to curves:
//!
//! ```json
//! { "curves": {
//!     "h_elecNoise_layer1": { "low_edge": 0.0, "bin_width": 0.1, "contents": [0.01, 0.012] },
//!     "h_pileup_layer1":    { "edges": [0.0, 0.1, 0.2], "contents": [0.02, 0.021] }
//! } }
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};

use crate::curve::{CurveRecord, NoiseCurve};
use crate::error::{NoiseError, Result};

/// Anything that can hand out noise curves by name.
pub trait CurveSource {
    /// Look up a curve. `None` if no curve has that name.
    fn curve(&self, name: &str) -> Option<&NoiseCurve>;
}

/// In-memory set of named curves, usually loaded from a JSON noise file.
#[derive(Debug, Clone, Default)]
pub struct CurveFile {
    curves: BTreeMap<String, NoiseCurve>,
}

#[derive(Serialize, Deserialize)]
struct CurveDocument {
    curves: BTreeMap<String, CurveRecord>,
}

impl CurveFile {
    /// Empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a curve.
    pub fn insert(&mut self, name: impl Into<String>, curve: NoiseCurve) {
        self.curves.insert(name.into(), curve);
    }

    /// Number of curves held.
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Curve names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.curves.keys().map(String::as_str)
    }

    /// Open a noise file. Paths ending in `.gz` are decompressed first.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| NoiseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut text = String::new();
        let read = if path.extension().is_some_and(|ext| ext == "gz") {
            GzDecoder::new(file).read_to_string(&mut text)
        } else {
            BufReader::new(file).read_to_string(&mut text)
        };
        read.map_err(|source| NoiseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Opening the file with noise constants: {}", path.display());
        Self::from_json(&text)
    }

    /// Parse a noise document from a JSON string.
    pub fn from_json(text: &str) -> Result<Self> {
        let doc: CurveDocument = serde_json::from_str(text).map_err(|source| NoiseError::Parse {
            what: "noise curve document".into(),
            source,
        })?;
        let mut out = Self::new();
        for (name, record) in doc.curves {
            let curve = record.into_curve(&name)?;
            out.curves.insert(name, curve);
        }
        Ok(out)
    }

    /// Serialize back into the JSON document format.
    pub fn to_json(&self) -> String {
        let doc = CurveDocument {
            curves: self
                .curves
                .iter()
                .map(|(name, curve)| (name.clone(), CurveRecord::from(curve)))
                .collect(),
        };
        serde_json::to_string_pretty(&doc).unwrap_or_default()
    }
}

impl CurveSource for CurveFile {
    fn curve(&self, name: &str) -> Option<&NoiseCurve> {
        self.curves.get(name)
    }
}
