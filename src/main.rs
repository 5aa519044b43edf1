use clap::Parser;
use miette::Result;
use sta::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Log level from `STA_LOG`/`RUST_LOG`, else from `-v` count; warnings by default
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("STA_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(format!("sta={}", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    let global = &cli.global;

    match cli.command {
        Commands::Files(args) => sta::cli::commands::files::run(args, global).await,
        Commands::Upload(args) => sta::cli::commands::upload::run(args, global).await,
        Commands::Parse(args) => sta::cli::commands::parse::run(args, global).await,
        Commands::Summary(args) => sta::cli::commands::summary::run(args, global).await,
        Commands::Tests(args) => sta::cli::commands::test_list::run(args, global).await,
        Commands::Results(args) => sta::cli::commands::results::run(args, global).await,
        Commands::Wafer(args) => sta::cli::commands::wafer::run(args, global).await,
        Commands::Export(args) => sta::cli::commands::export::run(args, global).await,
        Commands::Completions(args) => sta::cli::commands::completions::run(args),
    }
}
