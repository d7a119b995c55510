use calonoise_core::{CellId, NoiseComponents};

use crate::ToolArgs;

pub fn run(args: &ToolArgs, cells_path: Option<&str>, ids: Option<&str>, output: Option<&str>) {
    let mut cell_ids: Vec<CellId> = match (cells_path, ids) {
        (Some(path), _) => super::load_cells(path).into_keys().collect(),
        (None, Some(list)) => match super::parse_ids(list) {
            Ok(ids) => ids,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        (None, None) => {
            eprintln!("Error: give cells with --cells <file> or --ids <list>");
            std::process::exit(1);
        }
    };
    cell_ids.sort_unstable();

    let tool = super::load_tool(args);
    let results: Vec<NoiseComponents> = cell_ids
        .iter()
        .map(|&id| tool.noise_components(id))
        .collect();

    let unresolved = results.iter().filter(|c| c.bin.is_none()).count();
    if unresolved > 0 {
        log::info!("{unresolved} of {} cells could not be resolved", results.len());
    }
    super::write_json(&results, output);
}
