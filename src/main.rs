// file: src/main.rs
// version: 1.0.0
// guid: f3b40d79-2aae-4e74-a1e9-ec8a9107ab33

//! cudet - main entry point

use clap::Parser;
use cudet::{
    cli::{
        args::{Cli, Commands},
        commands::*,
    },
    config::ConfigOverrides,
    logging::logger,
    Result,
};
use tokio::signal;
use tracing::warn;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logger::init_logger(cli.verbose, cli.quiet)?;

    let overrides = ConfigOverrides::from(cli.overrides);
    let config = load_config(cli.config.as_deref(), &overrides)?;

    let command = cli.command;
    let command_future = async move {
        match command {
            Commands::ShowConfig { json } => show_config_command(&config, json).await,
            Commands::UpdateDb {
                input,
                db,
                release,
                format,
                match_policy,
                dry_run,
            } => {
                update_db_command(
                    &config,
                    &input,
                    db,
                    &release,
                    format,
                    match_policy.into(),
                    dry_run,
                )
                .await
            }
            Commands::Verify {
                db,
                release,
                version_file,
            } => verify_command(&config, db, release, &version_file).await,
        }
    };

    tokio::select! {
        result = command_future => result,
        _ = signal::ctrl_c() => {
            warn!("Interrupted, database left as it was");
            std::process::exit(130);
        }
    }
}
