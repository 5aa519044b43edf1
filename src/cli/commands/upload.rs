//! `sta upload` command - Upload an STDF file, optionally parsing it

use std::io::Write;
use std::path::PathBuf;

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::parse::wait_with_progress;
use crate::cli::helpers::connect;
use crate::cli::GlobalOpts;
use crate::core::upload_percent;

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    /// Local .stdf or .std file
    pub path: PathBuf,

    /// Start parsing once the upload finishes
    #[arg(long)]
    pub parse: bool,
}

pub async fn run(args: UploadArgs, global: &GlobalOpts) -> Result<()> {
    let (_, client) = connect(global)?;

    let mut last = None;
    let receipt = client
        .upload(&args.path, move |sent, total| {
            let percent = upload_percent(sent, total);
            if last != Some(percent) {
                last = Some(percent);
                eprint!("\r  uploading {:>3}%", percent);
                let _ = std::io::stderr().flush();
            }
        })
        .await
        .into_diagnostic()?;
    eprintln!();

    println!(
        "{} Uploaded {}",
        style("✓").green(),
        style(&receipt.filename).cyan()
    );

    if args.parse {
        wait_with_progress(&client, &receipt.filename).await?;
    }

    Ok(())
}
