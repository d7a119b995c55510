use crate::ToolArgs;

pub fn run(args: &ToolArgs, cells_path: &str, output: Option<&str>) {
    let mut cells = super::load_cells(cells_path);
    let tool = super::load_tool(args);

    let before = cells.len();
    let removed = tool.filter_cell_noise(&mut cells);
    log::info!(
        "Removed {removed} of {before} cells below {}*sigma",
        tool.threshold()
    );

    super::write_json(&super::to_records(&cells), output);
}
