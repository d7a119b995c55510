use calonoise_core::position_cells;

use crate::ToolArgs;

pub fn run(args: &ToolArgs, cells_path: &str, output: Option<&str>) {
    let cells = super::load_cells(cells_path);
    let (config, tool) = super::load(args);

    let Some(spec) = &config.positions else {
        eprintln!("Error: no cell positions configured (set \"positions\" in the config file)");
        std::process::exit(1);
    };
    let provider = match spec.build(tool.geometry().segmentation(), &config.active_field_name) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let positioned = position_cells(provider.as_ref(), &cells);
    if positioned.len() < cells.len() {
        log::info!(
            "{} of {} cells have no position",
            cells.len() - positioned.len(),
            cells.len()
        );
    }
    super::write_json(&positioned, output);
}
