use anyhow::Result;
use clap::Parser;

use relayforge_core::config::RelayforgeConfig;
use relayforge_core::metrics::describe_all;
use relayforge_daemon::cli::DaemonCli;
use relayforge_daemon::logging::init_tracing;
use relayforge_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let mut config = RelayforgeConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e))?;
    cli.apply_overrides(&mut config);

    init_tracing(&config.general)?;
    describe_all();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "relayforge-daemon starting"
    );

    let mut orchestrator = Orchestrator::build_from_config(config).await?;

    if cli.validate {
        tracing::info!("configuration and templates are valid");
        return Ok(());
    }

    orchestrator.run(cli.drain).await
}
