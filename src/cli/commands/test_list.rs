//! `sta tests` command - List the test catalog

use clap::ValueEnum;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{connect, format_opt, print_notices, resolve_sources, truncate_str};
use crate::cli::output::{effective_format, print_csv, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{sort_by_fail_rate, ResultSetAggregator};

#[derive(clap::Args, Debug)]
pub struct TestsArgs {
    /// Stored file names; more than one requires --merge
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<String>,

    /// Merge catalogs of all files (same test program only)
    #[arg(long, short = 'm')]
    pub merge: bool,

    /// Sort order
    #[arg(long, default_value = "test-num")]
    pub sort: TestSort,

    /// Limit number of tests shown
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TestSort {
    /// Ascending test number
    TestNum,
    /// Highest fail rate first
    FailRate,
}

pub async fn run(args: TestsArgs, global: &GlobalOpts) -> Result<()> {
    let (config, client) = connect(global)?;
    let (sources, merge) = resolve_sources(&client, &args.files, args.merge).await?;

    let mut aggregator = ResultSetAggregator::new(client).with_page_size(config.fetch.page_size);
    aggregator.load_catalog(&sources, merge).await.into_diagnostic()?;
    print_notices(&aggregator.take_notices());

    let mut tests = aggregator.catalog().to_vec();
    match args.sort {
        TestSort::TestNum => tests.sort_by_key(|t| t.test_num),
        TestSort::FailRate => sort_by_fail_rate(&mut tests),
    }
    if let Some(limit) = args.limit {
        tests.truncate(limit);
    }

    let format = effective_format(global.output);
    if print_structured(&tests, format)? {
        return Ok(());
    }
    if format == OutputFormat::Csv {
        return print_csv(
            &["test_num", "test_txt", "units", "lo_limit", "hi_limit", "count", "fail_rate"],
            tests.iter().map(|t| {
                [
                    t.test_num.to_string(),
                    t.test_txt.clone(),
                    t.units.clone(),
                    t.lo_limit.map(|v| v.to_string()).unwrap_or_default(),
                    t.hi_limit.map(|v| v.to_string()).unwrap_or_default(),
                    t.count.to_string(),
                    t.fail_rate.to_string(),
                ]
            }),
        );
    }

    if merge {
        println!(
            "Merged catalog of {} files",
            style(aggregator.files().len()).cyan()
        );
        println!();
    }

    println!(
        "{:<8} {:<32} {:<6} {:>12} {:>12} {:>9} {:>8}",
        style("TEST").bold(),
        style("NAME").bold(),
        style("UNITS").bold(),
        style("LO").bold(),
        style("HI").bold(),
        style("COUNT").bold(),
        style("FAIL%").bold()
    );
    println!("{}", "-".repeat(93));
    for test in &tests {
        let fail = format!("{:.2}", test.fail_rate);
        let fail = if test.fail_rate > 0.0 {
            style(fail).red()
        } else {
            style(fail).green()
        };
        println!(
            "{:<8} {:<32} {:<6} {:>12} {:>12} {:>9} {:>8}",
            style(test.test_num).cyan(),
            truncate_str(&test.test_txt, 32),
            truncate_str(&test.units, 6),
            format_opt(test.lo_limit, 4),
            format_opt(test.hi_limit, 4),
            test.count,
            fail
        );
    }
    println!();
    println!("{} test(s)", style(tests.len()).cyan());

    Ok(())
}
