//! `sta export` command - Write selected results to a CSV file

use std::path::PathBuf;

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::{load_selection, SelectionArgs};
use crate::cli::helpers::connect;
use crate::cli::GlobalOpts;
use crate::core::{records_to_csv, write_csv_file, DataSource, ResultSetAggregator};

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Stored file names; more than one requires --merge
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<String>,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Output directory (defaults to export.directory from config)
    #[arg(long, short = 'd')]
    pub dir: Option<PathBuf>,
}

/// File name scope: `merged` for multi-file selections, else the file name
pub fn export_scope<S: DataSource>(aggregator: &ResultSetAggregator<S>) -> String {
    if aggregator.is_multi_file() {
        "merged".to_string()
    } else {
        aggregator
            .files()
            .first()
            .map(|f| f.trim_end_matches(".stdf").trim_end_matches(".std").to_string())
            .unwrap_or_default()
    }
}

pub async fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let (config, client) = connect(global)?;
    let aggregator = load_selection(&config, client, &args.files, &args.selection).await?;

    let csv = records_to_csv(
        aggregator.selected_records(),
        aggregator.catalog(),
        aggregator.is_multi_file(),
    )
    .into_diagnostic()?;

    let dir = args.dir.unwrap_or_else(|| config.export.directory.clone());
    let path = write_csv_file(&dir, &export_scope(&aggregator), &csv).into_diagnostic()?;

    let rows = aggregator.selected_records().count();
    println!(
        "{} Exported {} row(s) from {} test(s) to {}",
        style("✓").green(),
        style(rows).cyan(),
        aggregator.selection().len(),
        style(path.display()).cyan()
    );

    Ok(())
}
