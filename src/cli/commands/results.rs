//! `sta results` command - Results, statistics and distribution per test

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::commands::{load_selection, SelectionArgs};
use crate::cli::helpers::{connect, format_opt, truncate_str};
use crate::cli::output::{effective_format, print_structured};
use crate::cli::viz::render_histogram;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{records_to_csv, CapabilityStats, DataSource, Histogram, ResultSetAggregator};
use crate::entities::{ResultRecord, TestMetadata};

#[derive(clap::Args, Debug)]
pub struct ResultsArgs {
    /// Stored file names; more than one requires --merge
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<String>,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Draw a histogram of each test
    #[arg(long)]
    pub histogram: bool,

    /// Overlay specification limits on the histogram
    #[arg(long)]
    pub limits: bool,

    /// Result rows printed per test (0 for none)
    #[arg(long, default_value = "10")]
    pub rows: usize,
}

/// Everything shown for one selected test
#[derive(Debug, Serialize)]
pub struct TestReport<'a> {
    pub test: &'a TestMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
    pub stats: Option<CapabilityStats>,
    pub histogram: Option<Histogram>,
    pub results: &'a [ResultRecord],
}

/// Reports for the current selection, in selection order
pub fn build_reports<S: DataSource>(aggregator: &ResultSetAggregator<S>) -> Vec<TestReport<'_>> {
    aggregator
        .selection()
        .iter()
        .filter_map(|&n| {
            let test = aggregator.test_info(n)?;
            Some(TestReport {
                test,
                error: aggregator.entry(n).and_then(|e| e.error.as_deref()),
                stats: aggregator.stats(n),
                histogram: aggregator.histogram(n),
                results: aggregator.records(n),
            })
        })
        .collect()
}

pub async fn run(args: ResultsArgs, global: &GlobalOpts) -> Result<()> {
    let (config, client) = connect(global)?;
    let aggregator = load_selection(&config, client, &args.files, &args.selection).await?;
    let reports = build_reports(&aggregator);

    let format = effective_format(global.output);
    if print_structured(&reports, format)? {
        return Ok(());
    }
    if format == OutputFormat::Csv {
        let csv = records_to_csv(
            aggregator.selected_records(),
            aggregator.catalog(),
            aggregator.is_multi_file(),
        )
        .into_diagnostic()?;
        print!("{}", csv);
        return Ok(());
    }

    for report in &reports {
        print_report(report, &args, aggregator.is_multi_file());
    }

    Ok(())
}

fn print_report(report: &TestReport<'_>, args: &ResultsArgs, multi_file: bool) {
    let test = report.test;
    println!(
        "{} {} {}",
        style(format!("#{}", test.test_num)).bold().cyan(),
        style(&test.test_txt).bold(),
        style(format!("[{}]", test.units)).dim()
    );
    println!(
        "  limits {} .. {}",
        format_opt(test.lo_limit, 4),
        format_opt(test.hi_limit, 4)
    );

    if let Some(error) = report.error {
        println!("  {} {}", style("failed to load:").red(), error);
        println!();
        return;
    }

    let Some(stats) = &report.stats else {
        println!("  {}", style("no results").dim());
        println!();
        return;
    };

    println!(
        "  n={}  mean={:.4}  median={:.4}  σ={:.4}  min={:.4}  max={:.4}",
        stats.count(),
        stats.mean,
        stats.median,
        stats.std_dev,
        stats.min,
        stats.max
    );
    println!(
        "  pass={}  fail={}  Cp={}  Cpk={}  Cpu={}  Cpl={}",
        style(stats.pass_count).green(),
        if stats.fail_count > 0 {
            style(stats.fail_count).red()
        } else {
            style(stats.fail_count).dim()
        },
        format_opt(stats.cp, 3),
        format_opt(stats.cpk, 3),
        format_opt(stats.cpu, 3),
        format_opt(stats.cpl, 3)
    );

    if args.histogram {
        if let Some(hist) = &report.histogram {
            println!();
            println!(
                "{}",
                render_histogram(hist, test.lo_limit, test.hi_limit, args.limits)
            );
        }
    }

    if args.rows > 0 && !report.results.is_empty() {
        println!();
        if multi_file {
            println!(
                "  {:<24} {:>5} {:>5} {:>14} {:<6}",
                style("FILE").bold(),
                style("SITE").bold(),
                style("HEAD").bold(),
                style("RESULT").bold(),
                style("P/F").bold()
            );
        } else {
            println!(
                "  {:>5} {:>5} {:>14} {:<6}",
                style("SITE").bold(),
                style("HEAD").bold(),
                style("RESULT").bold(),
                style("P/F").bold()
            );
        }

        for record in report.results.iter().take(args.rows) {
            let verdict = if record.passes() {
                style("PASS").green()
            } else {
                style("FAIL").red()
            };
            let value = format_opt(record.result, 6);
            if multi_file {
                println!(
                    "  {:<24} {:>5} {:>5} {:>14} {:<6}",
                    truncate_str(&record.source_file, 24),
                    record.site_num,
                    record.head_num,
                    value,
                    verdict
                );
            } else {
                println!(
                    "  {:>5} {:>5} {:>14} {:<6}",
                    record.site_num, record.head_num, value, verdict
                );
            }
        }

        let hidden = report.results.len().saturating_sub(args.rows);
        if hidden > 0 {
            println!("  {} more row(s)", style(hidden).dim());
        }
    }
    println!();
}
