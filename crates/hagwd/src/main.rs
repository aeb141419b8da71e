//! hagwd - home automation gateway daemon
//!
//! Loads a command file, connects to the configured Lutron HomeWorks and
//! AMX NI controllers and offers a small console on stdin.
//!
//! Usage:
//!   hagwd --config hagwd.toml [--verbose]

use anyhow::Context;
use clap::Parser;
use hagw_core::CommandFile;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod console;
mod controller;

use config::DaemonConfig;
use console::{ConsoleCommand, Help};
use controller::Controller;

#[derive(Parser, Debug)]
#[command(name = "hagwd")]
#[command(about = "Home automation gateway daemon for Lutron HomeWorks and AMX NI")]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long, default_value = "hagwd.toml")]
    config: String,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "hagwd=debug,hagw_core=debug,hagw_lutron=debug,hagw_amx=debug"
    } else {
        "hagwd=info,hagw_core=info,hagw_lutron=info,hagw_amx=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Loading config from: {}", args.config);
    let config = DaemonConfig::load(&args.config)?;
    if config.lutron.is_none() && config.amx.is_none() {
        warn!("No gateway configured");
    }

    let file = CommandFile::load(&config.commands)
        .with_context(|| format!("Failed to load {}", config.commands.display()))?;
    info!(
        commands = file.commands.len(),
        sensors = file.sensors.len(),
        "Loaded {}",
        config.commands.display()
    );

    let mut controller = Controller::build(&config, &file);
    controller.bind_sensors(&file);
    controller.start();

    run_console(&controller).await?;

    info!("Shutting down");
    controller.shutdown();
    Ok(())
}

/// Serve stdin until `quit`, end of input or Ctrl+C
async fn run_console(controller: &Controller) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", Help);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                return Ok(());
            }
        };
        let Some(line) = line else {
            // stdin closed; keep running until interrupted
            tokio::signal::ctrl_c().await?;
            return Ok(());
        };

        match ConsoleCommand::parse(&line) {
            ConsoleCommand::Send(id) => {
                if !controller.send(&id) {
                    println!("No such command: {}", id);
                }
            }
            ConsoleCommand::Status => {
                let status = controller.status();
                if status.is_empty() {
                    println!("No sensor values yet");
                }
                for (sensor, value) in status {
                    println!("{:<24} {}", sensor, value);
                }
            }
            ConsoleCommand::Help => {
                println!("{}", Help);
                println!("Configured commands:");
                for id in controller.command_ids() {
                    println!("  {}", id);
                }
            }
            ConsoleCommand::Quit => return Ok(()),
            ConsoleCommand::Empty => {}
            ConsoleCommand::Unknown(text) => println!("Unknown input '{}', try 'help'", text),
        }
    }
}
