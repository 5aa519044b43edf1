//! `sta summary` command - File header, yield, sites and bins

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::helpers::{connect, truncate_str};
use crate::cli::output::{effective_format, print_csv, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::wafer::bin_label;
use crate::core::ProgramIdentity;
use crate::entities::FileSummary;

#[derive(clap::Args, Debug)]
pub struct SummaryArgs {
    /// Stored file name
    pub file: String,
}

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "SITE")]
    site: u16,
    #[tabled(rename = "PARTS")]
    parts: u64,
    #[tabled(rename = "PASS")]
    pass: u64,
    #[tabled(rename = "FAIL")]
    fail: u64,
    #[tabled(rename = "YIELD")]
    yield_rate: String,
}

#[derive(Tabled)]
struct BinRow {
    #[tabled(rename = "HBIN")]
    bin: u32,
    #[tabled(rename = "COUNT")]
    count: u64,
    #[tabled(rename = "SHARE")]
    share: String,
    #[tabled(rename = "MEANING")]
    meaning: &'static str,
    #[tabled(rename = "FAILED TESTS")]
    failed_tests: String,
}

/// Bin rows in bin order, with failing tests from the detail list
fn bin_rows(summary: &FileSummary) -> Vec<BinRow> {
    summary
        .hbin_counts
        .iter()
        .map(|(&bin, &count)| {
            let failed_tests = summary
                .hbin_details
                .iter()
                .find(|d| d.bin_num == bin)
                .map(|d| d.failed_tests.join(", "))
                .unwrap_or_default();
            BinRow {
                bin,
                count,
                share: summary.bin_percent(count),
                meaning: bin_label(bin),
                failed_tests: truncate_str(&failed_tests, 48),
            }
        })
        .collect()
}

pub async fn run(args: SummaryArgs, global: &GlobalOpts) -> Result<()> {
    let (_, client) = connect(global)?;
    let summary = client.summary(&args.file).await.into_diagnostic()?;

    let format = effective_format(global.output);
    if print_structured(&summary, format)? {
        return Ok(());
    }
    if format == OutputFormat::Csv {
        return print_csv(
            &["hard_bin", "count", "percent", "meaning"],
            bin_rows(&summary)
                .into_iter()
                .map(|r| [r.bin.to_string(), r.count.to_string(), r.share, r.meaning.to_string()]),
        );
    }

    println!("{}", style(&args.file).bold().cyan());
    if let Some(mir) = &summary.mir {
        let fields = [
            ("Lot", &mir.lot_id),
            ("Part type", &mir.part_type),
            ("Job", &mir.job_name),
            ("Executive", &mir.exec_type),
            ("Exec version", &mir.exec_ver),
            ("Tester", &mir.tester_type),
            ("Node", &mir.node_name),
            ("Start", &mir.start_time),
        ];
        for (label, value) in fields {
            if !value.is_empty() {
                println!("  {:<14} {}", style(label).dim(), value);
            }
        }
    }
    let identity = ProgramIdentity::from_mir(summary.mir.as_ref());
    println!("  {:<14} {}", style("Program").dim(), identity);
    if let Some(mrr) = &summary.mrr {
        if !mrr.finish_time.is_empty() {
            println!("  {:<14} {}", style("Finish").dim(), mrr.finish_time);
        }
    }
    println!();

    let yield_style = if summary.yield_rate >= 90.0 {
        style(format!("{:.2}%", summary.yield_rate)).green()
    } else {
        style(format!("{:.2}%", summary.yield_rate)).yellow()
    };
    println!(
        "  {} parts, {} pass, {} fail, yield {}  ({} tests)",
        style(summary.total_parts).cyan(),
        summary.pass_count,
        summary.fail_count,
        yield_style,
        summary.total_tests
    );

    if !summary.site_yields.is_empty() {
        let rows: Vec<SiteRow> = summary
            .site_yields
            .iter()
            .map(|s| SiteRow {
                site: s.site_num,
                parts: s.total_parts,
                pass: s.pass_count,
                fail: s.fail_count,
                yield_rate: format!("{:.2}%", s.yield_rate),
            })
            .collect();
        println!();
        println!("{}", Table::new(rows).with(Style::sharp()));
    }

    let bins = bin_rows(&summary);
    if !bins.is_empty() {
        println!();
        println!("{}", Table::new(bins).with(Style::sharp()));
    }

    Ok(())
}
