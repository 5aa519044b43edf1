//! `sta files` command - List stored STDF files

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{connect, truncate_str};
use crate::cli::output::{effective_format, print_csv, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct FilesArgs {
    /// Limit number of files shown
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

pub async fn run(args: FilesArgs, global: &GlobalOpts) -> Result<()> {
    let (_, client) = connect(global)?;
    let mut files = client.list_files().await.into_diagnostic()?;
    if let Some(limit) = args.limit {
        files.truncate(limit);
    }

    if args.count {
        println!("{}", files.len());
        return Ok(());
    }

    let format = effective_format(global.output);
    if print_structured(&files, format)? {
        return Ok(());
    }

    if format == OutputFormat::Csv {
        return print_csv(
            &["name", "size", "modified"],
            files
                .iter()
                .map(|f| [f.name.clone(), f.size.to_string(), f.display_modified()]),
        );
    }

    if files.is_empty() {
        println!("No STDF files on the server. Use {} to add one.", style("sta upload <PATH>").cyan());
        return Ok(());
    }

    println!(
        "{:<40} {:>10} {:<19}",
        style("NAME").bold(),
        style("SIZE").bold(),
        style("MODIFIED").bold()
    );
    println!("{}", "-".repeat(71));
    for file in &files {
        println!(
            "{:<40} {:>10} {:<19}",
            style(truncate_str(&file.name, 40)).cyan(),
            file.display_size(),
            file.display_modified()
        );
    }
    println!();
    println!("{} file(s)", style(files.len()).cyan());

    Ok(())
}
