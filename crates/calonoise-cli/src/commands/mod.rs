pub mod estimate;
pub mod filter;
pub mod inject;
pub mod inspect;
pub mod positions;

use std::path::{Path, PathBuf};

use calonoise_core::{CellEnergyMap, CellId, NoiseConfig, NoiseTool, load_config_from_path};
use serde::{Deserialize, Serialize};

use crate::ToolArgs;

/// One cell as read from and written to cell JSON files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub cell_id: CellId,
    pub energy: f64,
}

/// Configuration from `--config` with command-line overrides applied.
pub fn resolve_config(args: &ToolArgs) -> Result<NoiseConfig, String> {
    let mut config = match &args.config {
        Some(path) => load_config_from_path(Path::new(path)).map_err(|e| e.to_string())?,
        None => NoiseConfig::default(),
    };
    if let Some(path) = &args.noise_file {
        config.noise_file = PathBuf::from(path);
    }
    if let Some(layers) = args.layers {
        config.num_radial_layers = layers;
    }
    if args.no_pileup {
        config.add_pileup = false;
    }
    if let Some(threshold) = args.threshold {
        config.filter_threshold = threshold;
    }
    Ok(config)
}

/// Resolve the configuration and build the noise tool, or exit with the error.
pub fn load(args: &ToolArgs) -> (NoiseConfig, NoiseTool) {
    let loaded = resolve_config(args).and_then(|config| {
        let tool = NoiseTool::initialize(&config).map_err(|e| e.to_string())?;
        Ok((config, tool))
    });
    match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Build the noise tool or exit with the initialization error.
pub fn load_tool(args: &ToolArgs) -> NoiseTool {
    load(args).1
}

/// Read a cells JSON file. Later duplicates of a cell id replace earlier ones.
pub fn read_cells(path: &str) -> Result<CellEnergyMap, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}"))?;
    let records: Vec<CellRecord> =
        serde_json::from_str(&raw).map_err(|e| format!("failed to parse {path}: {e}"))?;
    Ok(records.into_iter().map(|r| (r.cell_id, r.energy)).collect())
}

/// Read cells or exit.
pub fn load_cells(path: &str) -> CellEnergyMap {
    match read_cells(path) {
        Ok(cells) => cells,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Cells as records sorted by id, for stable output.
pub fn to_records(cells: &CellEnergyMap) -> Vec<CellRecord> {
    let mut out: Vec<CellRecord> = cells
        .iter()
        .map(|(&cell_id, &energy)| CellRecord { cell_id, energy })
        .collect();
    out.sort_by_key(|r| r.cell_id);
    out
}

/// Parse `"12,0x1f, 7"` into cell ids.
pub fn parse_ids(list: &str) -> Result<Vec<CellId>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => CellId::from_str_radix(hex, 16),
                None => s.parse::<CellId>(),
            };
            parsed.map_err(|_| format!("invalid cell id '{s}'"))
        })
        .collect()
}

/// Pretty JSON to `output` or stdout.
pub fn write_json<T: Serialize>(value: &T, output: Option<&str>) {
    let json = match serde_json::to_string_pretty(value) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: failed to serialize output: {e}");
            std::process::exit(1);
        }
    };
    match output {
        Some(path) => match std::fs::write(path, json + "\n") {
            Ok(()) => eprintln!("Wrote {path}"),
            Err(e) => {
                eprintln!("Failed to write {path}: {e}");
                std::process::exit(1);
            }
        },
        None => println!("{json}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ToolArgs {
        ToolArgs {
            config: None,
            noise_file: None,
            layers: None,
            no_pileup: false,
            threshold: None,
        }
    }

    // -----------------------------------------------------------------------
    // parse_ids tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_ids_decimal_and_hex() {
        assert_eq!(parse_ids("12, 0x1f,7").unwrap(), vec![12, 31, 7]);
    }

    #[test]
    fn test_parse_ids_rejects_garbage() {
        assert!(parse_ids("12,abc").is_err());
    }

    #[test]
    fn test_parse_ids_skips_empty() {
        assert_eq!(parse_ids("1,,2,").unwrap(), vec![1, 2]);
    }

    // -----------------------------------------------------------------------
    // config override tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_overrides_apply_on_defaults() {
        let mut a = args();
        a.noise_file = Some("noise.json".into());
        a.layers = Some(8);
        a.no_pileup = true;
        a.threshold = Some(-1.0);
        let c = resolve_config(&a).unwrap();
        assert_eq!(c.noise_file, PathBuf::from("noise.json"));
        assert_eq!(c.num_radial_layers, 8);
        assert!(!c.add_pileup);
        assert_eq!(c.filter_threshold, -1.0);
    }

    #[test]
    fn test_overrides_apply_on_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        std::fs::write(&path, r#"{"noise_file":"a.json","num_radial_layers":5}"#).unwrap();
        let mut a = args();
        a.config = Some(path.display().to_string());
        a.noise_file = Some("b.json".into());
        let c = resolve_config(&a).unwrap();
        assert_eq!(c.noise_file, PathBuf::from("b.json"));
        assert_eq!(c.num_radial_layers, 5);
    }

    #[test]
    fn test_missing_config_file() {
        let mut a = args();
        a.config = Some("/nonexistent/config.json".into());
        assert!(resolve_config(&a).is_err());
    }

    // -----------------------------------------------------------------------
    // cell file tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_read_cells_and_sorted_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.json");
        std::fs::write(
            &path,
            r#"[{"cell_id":9,"energy":1.5},{"cell_id":3,"energy":0.2},{"cell_id":9,"energy":2.0}]"#,
        )
        .unwrap();
        let cells = read_cells(path.to_str().unwrap()).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[&9], 2.0);
        let records = to_records(&cells);
        assert_eq!(records[0].cell_id, 3);
        assert_eq!(records[1].cell_id, 9);
    }
}
