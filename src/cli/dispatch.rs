use super::commands::{Cli, Commands};
use anyhow::Result;
use infinite_adventure::Config;
use infinite_adventure::app::{build_services, collect_stats, render_status};

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            infinite_adventure::gateway::run_gateway(&host, port, config).await
        }
        Commands::Play => {
            let services = build_services(&config).await?;
            infinite_adventure::ui::run_play(services).await
        }
        Commands::Stats => {
            let services = build_services(&config).await?;
            let report = collect_stats(&services).await?;
            print!("{}", render_status(&report));
            Ok(())
        }
    }
}
