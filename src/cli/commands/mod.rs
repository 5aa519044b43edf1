//! CLI command implementations

pub mod completions;
pub mod export;
pub mod files;
pub mod parse;
pub mod results;
pub mod summary;
pub mod test_list;
pub mod upload;
pub mod wafer;

use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{check_selection_size, choose_tests, print_notices, resolve_sources};
use crate::core::{Config, HttpClient, ResultSetAggregator};

/// Test selection shared by `results` and `export`
#[derive(clap::Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Test numbers to load (comma-separated, at most 8); prompts when omitted
    #[arg(long, short = 't', value_delimiter = ',')]
    pub test: Vec<u32>,

    /// Merge all given files (they must come from the same test program)
    #[arg(long, short = 'm')]
    pub merge: bool,
}

/// Resolve files, load the catalog and fetch the selected tests
pub(crate) async fn load_selection(
    config: &Config,
    client: HttpClient,
    files: &[String],
    selection: &SelectionArgs,
) -> Result<ResultSetAggregator<HttpClient>> {
    check_selection_size(&selection.test)?;

    let (sources, merge) = resolve_sources(&client, files, selection.merge).await?;
    let mut aggregator = ResultSetAggregator::new(client).with_page_size(config.fetch.page_size);
    aggregator.load_catalog(&sources, merge).await.into_diagnostic()?;

    let tests = choose_tests(aggregator.catalog(), &selection.test)?;
    aggregator.select_tests(&tests).await.into_diagnostic()?;
    // Per-test fetch failures and truncation warnings
    print_notices(&aggregator.take_notices());

    Ok(aggregator)
}
