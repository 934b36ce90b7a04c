pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

#[derive(Parser)]
#[command(name = "cmms")]
#[command(about = "CMMS CLI - maintenance management from the terminal")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authentication and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Equipment and facility assets")]
    Assets {
        #[command(subcommand)]
        cmd: commands::resource::ResourceCommands,
    },

    #[command(about = "Maintenance work orders")]
    WorkOrders {
        #[command(subcommand)]
        cmd: commands::work_orders::WorkOrderCommands,
    },

    #[command(about = "Spare parts inventory")]
    Parts {
        #[command(subcommand)]
        cmd: commands::parts::PartCommands,
    },

    #[command(about = "User management")]
    Users {
        #[command(subcommand)]
        cmd: commands::resource::ResourceCommands,
    },

    #[command(about = "Show the dashboard and navigation for the current user")]
    Dashboard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let result = match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &output_format).await,
        Commands::Assets { cmd } => commands::resource::handle_assets(cmd, &output_format).await,
        Commands::WorkOrders { cmd } => commands::work_orders::handle(cmd, &output_format).await,
        Commands::Parts { cmd } => commands::parts::handle(cmd, &output_format).await,
        Commands::Users { cmd } => commands::resource::handle_users(cmd, &output_format).await,
        Commands::Dashboard => commands::dashboard::handle(&output_format).await,
    };

    match (result, &output_format) {
        (Err(e), OutputFormat::Json) => {
            utils::output_error(&output_format, &e.to_string(), e.downcast_ref::<ClientError>())?;
            Err(Reported.into())
        }
        (result, _) => result,
    }
}

/// The error was already written to stdout as JSON. Callers should exit
/// non-zero without printing it again.
#[derive(Debug, thiserror::Error)]
#[error("error already reported")]
pub struct Reported;
