//! Command-line argument definitions

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    completions::CompletionsArgs, export::ExportArgs, files::FilesArgs, parse::ParseArgs,
    results::ResultsArgs, summary::SummaryArgs, test_list::TestsArgs, upload::UploadArgs,
    wafer::WaferArgs,
};

#[derive(Parser, Debug)]
#[command(name = "sta")]
#[command(author, version, about = "STDF test analytics against a parsing service")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Base URL of the parsing service (overrides config and STA_SERVER_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "auto")]
    pub output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List STDF files stored on the service, newest first
    Files(FilesArgs),

    /// Upload an STDF file to the service
    Upload(UploadArgs),

    /// Parse a stored file and wait for the job to finish
    Parse(ParseArgs),

    /// Show MIR/MRR, yield, site and bin summary of a file
    Summary(SummaryArgs),

    /// List the test catalog of one or more files
    Tests(TestsArgs),

    /// Show results and capability statistics for selected tests
    Results(ResultsArgs),

    /// Render the wafer map of a file
    Wafer(WaferArgs),

    /// Export results of selected tests to CSV
    Export(ExportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table on a terminal
    #[default]
    Auto,
    /// Human-readable table
    Table,
    /// JSON
    Json,
    /// YAML
    Yaml,
    /// CSV
    Csv,
}
