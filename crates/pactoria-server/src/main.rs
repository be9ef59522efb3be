use clap::Parser;

mod bootstrap;
mod cli;
mod commands;
mod context;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("pactoria error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();
    let config = bootstrap::load_config(&flags)?;
    context::warn_unconfigured(&config);

    match &cli.command {
        cli::Commands::Serve(args) => commands::serve::handle(args, config).await,
        cli::Commands::Migrate => commands::migrate::handle(&config).await,
        cli::Commands::Config => commands::config::handle(&config),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("PACTORIA_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
