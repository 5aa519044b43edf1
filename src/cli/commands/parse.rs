//! `sta parse` command - Run a parse job and wait for it

use std::io::Write;

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::connect;
use crate::cli::GlobalOpts;
use crate::core::HttpClient;
use crate::entities::ParseProgress;

#[derive(clap::Args, Debug)]
pub struct ParseArgs {
    /// Stored file name (see `sta files`)
    pub file: String,
}

pub async fn run(args: ParseArgs, global: &GlobalOpts) -> Result<()> {
    let (_, client) = connect(global)?;
    wait_with_progress(&client, &args.file).await
}

/// Poll a parse job, redrawing one progress line on stderr
pub(crate) async fn wait_with_progress(client: &HttpClient, file: &str) -> Result<()> {
    let outcome = client
        .wait_for_parse(file, |progress: &ParseProgress| {
            eprint!("\r  parsing {:>3}% ({})", progress.percent, progress.status);
            let _ = std::io::stderr().flush();
        })
        .await;
    eprintln!();
    outcome.into_diagnostic()?;

    println!("{} Parsed {}", style("✓").green(), style(file).cyan());
    Ok(())
}
