use anyhow::Result;
use clap::Parser;

use clinic_scheduler::cli::commands::{
    config::ConfigCommand, health::HealthCommand, lookup::LookupCommand, quid6::Quid6Command, records::RecordsCommand,
    schedule::ScheduleCommand, show_how_to_get_started, stats::StatsCommand,
};
use clinic_scheduler::cli::{Cli, Commands};
use clinic_scheduler::config::{config, SchedulerConfig};
use clinic_scheduler::telemetry::{init_telemetry, shutdown_telemetry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env has to be applied before the configuration is first read
    let env_file = SchedulerConfig::load_env_file();

    // Logging should come up even when the config file is broken, so the
    // failure itself gets reported.
    let observability = config()
        .map(|settings| settings.observability.clone())
        .unwrap_or_else(|_| SchedulerConfig::default().observability);
    init_telemetry(&observability)?;

    match env_file {
        Ok(true) => tracing::info!("Loaded environment variables from .env file"),
        Ok(false) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
    }

    let outcome = match cli.command {
        None => tokio::runtime::Runtime::new()?.block_on(async { show_how_to_get_started().await }),
        Some(Commands::Schedule) => tokio::runtime::Runtime::new()?
            .block_on(async { ScheduleCommand::new().execute().await }),
        Some(Commands::Quid6 { answers }) => tokio::runtime::Runtime::new()?
            .block_on(async { Quid6Command::new(answers).execute().await }),
        Some(Commands::Lookup { key }) => tokio::runtime::Runtime::new()?
            .block_on(async { LookupCommand::new(key).execute().await }),
        Some(Commands::Records { limit, offset }) => tokio::runtime::Runtime::new()?
            .block_on(async { RecordsCommand::new(limit, offset).execute().await }),
        Some(Commands::Stats) => tokio::runtime::Runtime::new()?
            .block_on(async { StatsCommand::new().execute().await }),
        Some(Commands::Health) => tokio::runtime::Runtime::new()?
            .block_on(async { HealthCommand::new().execute().await }),
        Some(Commands::Config { output }) => tokio::runtime::Runtime::new()?
            .block_on(async { ConfigCommand::new(output).execute().await }),
    };

    shutdown_telemetry();
    outcome
}
