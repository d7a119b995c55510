use crate::ToolArgs;

pub fn run(args: &ToolArgs) {
    let (config, tool) = super::load(args);
    let table = tool.table();
    let binning = table.binning();
    let geometry = tool.geometry();

    println!("Noise file: {}", config.noise_file.display());
    println!(
        "Readout:    {} ({})",
        config.readout.name,
        geometry.segmentation().kind()
    );
    println!("Id spec:    {}", geometry.decoder().description());
    println!(
        "Eta from:   {}",
        if geometry.uses_segmentation() {
            "segmentation"
        } else {
            "cell positions"
        }
    );
    println!(
        "Binning:    {} bins of {:.4} from |eta| = {:.4}",
        binning.bin_count, binning.bin_width, binning.first_bin_low_edge
    );
    println!(
        "Pileup:     {}",
        if table.pileup_enabled() { "on" } else { "off" }
    );
    if tool.threshold() > 0.0 {
        println!("Filter:     {}*sigma", tool.threshold());
    } else {
        println!("Filter:     off");
    }

    println!();
    println!(
        "  {:<6} {:>5} {:>10} {:>10} {:>10} {:>10}",
        "Layer", "Bins", "Elec min", "Elec max", "PU min", "PU max"
    );
    println!("  {}", "-".repeat(56));
    for (i, layer) in table.layers().iter().enumerate() {
        let (emin, emax) = min_max(layer.electronic.contents());
        let (pmin, pmax) = layer
            .pileup
            .as_ref()
            .map(|p| min_max(p.contents()))
            .unwrap_or((0.0, 0.0));
        println!(
            "  {:<6} {:>5} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
            i,
            layer.electronic.n_bins(),
            emin,
            emax,
            pmin,
            pmax
        );
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        })
}
