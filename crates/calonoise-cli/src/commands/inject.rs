use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::ToolArgs;

pub fn run(args: &ToolArgs, cells_path: &str, seed: Option<u64>, output: Option<&str>, filter: bool) {
    let mut cells = super::load_cells(cells_path);
    let tool = super::load_tool(args);

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let draws = tool.add_random_cell_noise(&mut cells, &mut rng);
    log::info!("Added noise to {draws} cells");

    if filter {
        let removed = tool.filter_cell_noise(&mut cells);
        log::info!(
            "Removed {removed} cells below {}*sigma, {} left",
            tool.threshold(),
            cells.len()
        );
    }

    super::write_json(&super::to_records(&cells), output);
}
