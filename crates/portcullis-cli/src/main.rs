//! portcullis: inspect and exercise the content-view security gateway.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::CommandContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("portcullis=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    let config = portcullis_core::ConfigStore::new().load();
    let settings = cli
        .resolve_settings(&config)
        .map_err(|e| anyhow::anyhow!("Invalid settings: {e}"))?;
    tracing::debug!(?settings, "resolved settings");

    let ctx = CommandContext {
        settings,
        config,
        output_root: cli.output_root.clone(),
    };

    match cli.command {
        Commands::Check { ref url, kind } => commands::check::run(&ctx.settings, url, kind)?,
        Commands::Permission { ref name, ref origin } => commands::permission::run(name, origin)?,
        Commands::Resolve { ref url, body } => commands::resolve::run(&ctx, url, body).await?,
        Commands::Headers { window } => commands::headers::run(&ctx, window)?,
        Commands::Simulate {
            ref navigate,
            fail_load,
        } => commands::simulate::run(&ctx, navigate, fail_load).await?,
    }

    Ok(())
}
