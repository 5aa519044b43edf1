//! `sta wafer` command - Wafer map and bin yield

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::connect;
use crate::cli::output::{effective_format, print_csv, print_structured};
use crate::cli::viz::render_wafer;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::project_wafer;

#[derive(clap::Args, Debug)]
pub struct WaferArgs {
    /// Stored file name
    pub file: String,

    /// Print the yield summary without the grid
    #[arg(long)]
    pub no_map: bool,
}

pub async fn run(args: WaferArgs, global: &GlobalOpts) -> Result<()> {
    let (config, client) = connect(global)?;
    let wafer = client.wafer_map(&args.file).await.into_diagnostic()?;

    let Some(projection) = project_wafer(&wafer, &config.wafer) else {
        println!("No wafer map data for {}", style(&args.file).cyan());
        return Ok(());
    };

    let format = effective_format(global.output);
    if print_structured(&projection, format)? {
        return Ok(());
    }
    if format == OutputFormat::Csv {
        return print_csv(
            &["x", "y", "hard_bin", "soft_bin", "edge"],
            projection.cells.iter().map(|c| {
                [
                    c.x.to_string(),
                    c.y.to_string(),
                    c.hard_bin.to_string(),
                    c.soft_bin.to_string(),
                    c.edge.to_string(),
                ]
            }),
        );
    }

    let title = if projection.wafer_id.is_empty() {
        args.file.clone()
    } else {
        format!("{} ({})", args.file, projection.wafer_id)
    };
    println!("{}", style(title).bold().cyan());
    println!(
        "  {} dies, {} pass, {} fail, yield {:.2}%, {} edge, {} active bins",
        projection.total_dies,
        style(projection.pass_dies).green(),
        style(projection.failed_dies).red(),
        projection.yield_rate,
        projection.edge_dies,
        projection.active_bins()
    );

    if !projection.top_fail_bins.is_empty() {
        println!();
        println!("  {}", style("Top failing bins").bold());
        for fail in &projection.top_fail_bins {
            println!(
                "    {} HBin {:<4} {:>7}  {}",
                console::Style::new().color256(fail.color.ansi).apply_to("██"),
                fail.bin,
                fail.count,
                fail.label
            );
        }
        if projection.other_bin_total > 0 {
            println!("    {:>17}  other bins", projection.other_bin_total);
        }
    }

    if !args.no_map {
        println!();
        println!("{}", render_wafer(&projection));
    }

    Ok(())
}
