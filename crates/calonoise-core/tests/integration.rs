//! Integration tests for calonoise-core.
//!
//! These tests go through the full pipeline:
//! noise file on disk → configuration → tool initialization → injection / filtering.

use std::path::Path;

use calonoise_core::{
    CellEnergyMap, CellId, CurveFile, NoiseConfig, NoiseCurve, NoiseError, NoiseTool,
    load_config_from_path,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use statrs::distribution::{ContinuousCDF, Normal};

const ID_SPEC: &str = "system:4,layer:8,eta:-10,phi:10";

fn write_noise_file(dir: &Path, layers: usize, pileup: bool) -> std::path::PathBuf {
    let mut curves = CurveFile::new();
    for l in 1..=layers {
        curves.insert(
            format!("h_elecNoise_layer{l}"),
            NoiseCurve::uniform(0.0, 0.1, vec![1.0; 10]),
        );
        if pileup {
            curves.insert(
                format!("h_pileup_layer{l}"),
                NoiseCurve::uniform(0.0, 0.1, (1..=10).map(|b| b as f64 * 0.1).collect()),
            );
        }
    }
    let path = dir.join("noise.json");
    std::fs::write(&path, curves.to_json()).unwrap();
    path
}

fn write_config(dir: &Path, noise_file: &Path, layers: usize, pileup: bool) -> std::path::PathBuf {
    let config = serde_json::json!({
        "noise_file": noise_file,
        "num_radial_layers": layers,
        "add_pileup": pileup,
        "filter_threshold": 3.0,
        "readout": {
            "name": "ECalBarrelPhiEta",
            "id_spec": ID_SPEC,
            "segmentation": { "type": "phi_eta", "grid_size_eta": 0.01, "phi_bins": 256 }
        }
    });
    let path = dir.join("config.json");
    std::fs::write(&path, config.to_string()).unwrap();
    path
}

fn tool(layers: usize, pileup: bool) -> (tempfile::TempDir, NoiseTool) {
    let dir = tempfile::tempdir().unwrap();
    let noise = write_noise_file(dir.path(), layers, pileup);
    let config_path = write_config(dir.path(), &noise, layers, pileup);
    let config = load_config_from_path(&config_path).unwrap();
    let tool = NoiseTool::initialize(&config).unwrap();
    (dir, tool)
}

fn cell(tool: &NoiseTool, layer: i64, eta_index: i64, phi_index: i64) -> CellId {
    tool.geometry()
        .decoder()
        .encode(&[("system", 4), ("layer", layer), ("eta", eta_index), ("phi", phi_index)])
        .unwrap()
}

#[test]
fn single_layer_filter_scenario() {
    let (_dir, tool) = tool(1, false);
    let quiet = cell(&tool, 0, 25, 0);
    let loud = cell(&tool, 0, 25, 1);
    assert_eq!(tool.noise_for(quiet), 1.0);

    let mut cells: CellEnergyMap = [(quiet, 2.5), (loud, 3.5)].into_iter().collect();
    let removed = tool.filter_cell_noise(&mut cells);
    assert_eq!(removed, 1);
    assert!(!cells.contains_key(&quiet));
    assert_eq!(cells.get(&loud), Some(&3.5));
}

#[test]
fn eta_out_of_range_uses_last_bin() {
    let (_dir, tool) = tool(1, false);
    let far = cell(&tool, 0, 500, 0);
    let c = tool.noise_components(far);
    assert_eq!(c.bin, Some(10));
    assert_eq!(c.total, 1.0);
}

#[test]
fn layer_without_curves_is_noiseless() {
    let (_dir, tool) = tool(2, true);
    let outer = cell(&tool, 7, 30, 0);
    assert_eq!(tool.noise_for(outer), 0.0);

    // Zero noise never removes a cell with non-negative energy.
    let mut cells: CellEnergyMap = [(outer, 0.0)].into_iter().collect();
    assert_eq!(tool.filter_cell_noise(&mut cells), 0);
}

#[test]
fn pileup_combined_in_quadrature() {
    let (_dir, tool) = tool(2, true);
    // eta 0.35 -> bin 4, pileup 0.4, electronic 1.0
    let c = tool.noise_components(cell(&tool, 1, -35, 3));
    assert_eq!(c.bin, Some(4));
    assert!((c.pileup - 0.4).abs() < 1e-12);
    assert!((c.total - (1.0f64 + 0.16).sqrt()).abs() < 1e-12);
}

#[test]
fn missing_layer_curve_aborts_startup() {
    let dir = tempfile::tempdir().unwrap();
    let noise = write_noise_file(dir.path(), 2, false);
    let config = NoiseConfig {
        noise_file: noise,
        num_radial_layers: 3,
        add_pileup: false,
        ..NoiseConfig::default()
    };
    match NoiseTool::initialize(&config) {
        Err(NoiseError::MissingCurve { name }) => assert_eq!(name, "h_elecNoise_layer3"),
        Err(other) => panic!("expected MissingCurve, got {other}"),
        Ok(_) => panic!("expected MissingCurve, tool initialized"),
    }
}

#[test]
fn inject_then_filter_pipeline() {
    let (_dir, tool) = tool(3, true);
    let mut cells = CellEnergyMap::new();
    for layer in 0..3 {
        for eta in 0..100 {
            cells.insert(cell(&tool, layer, eta, eta % 7), 50.0);
        }
    }
    let keys: Vec<CellId> = cells.keys().copied().collect();

    let mut rng = StdRng::seed_from_u64(2024);
    let draws = tool.add_random_cell_noise(&mut cells, &mut rng);
    assert_eq!(draws, 300);
    assert_eq!(cells.len(), 300);
    assert!(keys.iter().all(|k| cells.contains_key(k)));
    assert!(cells.values().any(|e| *e != 50.0));

    let before = cells.len();
    let removed = tool.filter_cell_noise(&mut cells);
    assert_eq!(cells.len(), before - removed);
    // 50 GeV is far above 3 sigma everywhere.
    assert_eq!(removed, 0);
    assert_eq!(tool.filter_cell_noise(&mut cells), 0);
}

#[test]
fn injected_noise_is_standard_normal_in_sigma_units() {
    let (_dir, tool) = tool(3, true);
    let mut cells = CellEnergyMap::new();
    for layer in 0..3 {
        for eta in -400..400 {
            for phi in 0..2 {
                cells.insert(cell(&tool, layer, eta, phi), 0.0);
            }
        }
    }
    let mut rng = StdRng::seed_from_u64(11);
    tool.add_random_cell_noise(&mut cells, &mut rng);

    let mut pulls: Vec<f64> = cells
        .iter()
        .map(|(id, e)| e / tool.noise_for(*id))
        .collect();
    let n = pulls.len() as f64;
    let mean = pulls.iter().sum::<f64>() / n;
    let var = pulls.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (n - 1.0);
    assert!(mean.abs() < 0.1, "mean pull {mean}");
    assert!((var - 1.0).abs() < 0.1, "pull variance {var}");

    // Kolmogorov-Smirnov distance to N(0, 1).
    pulls.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let normal = Normal::new(0.0, 1.0).unwrap();
    let d = pulls
        .iter()
        .enumerate()
        .map(|(i, x)| {
            let cdf = normal.cdf(*x);
            (cdf - i as f64 / n).abs().max(((i + 1) as f64 / n - cdf).abs())
        })
        .fold(0.0, f64::max);
    assert!(d < 2.5 / n.sqrt(), "KS distance {d} for {n} pulls");
}
