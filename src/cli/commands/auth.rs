use clap::Subcommand;
use serde_json::json;

use super::resource::require_user;
use crate::api::Credentials;
use crate::cli::config::build_client;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::guard::GuardDecision;
use crate::models::{NewUser, Role};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to server")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout from server")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show current user information")]
    Whoami,

    #[command(about = "Register new user")]
    Register {
        #[arg(help = "Username")]
        username: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
        #[arg(long, default_value = "requester", help = "admin, manager, technician or requester")]
        role: Role,
    },
}

pub async fn handle(cmd: AuthCommands, output_format: &OutputFormat) -> anyhow::Result<()> {
    let client = build_client()?;

    match cmd {
        AuthCommands::Login { username, password } => {
            let password = password_or_prompt(password)?;
            let user = client.auth().login(&Credentials::new(&username, password)).await?;
            output_success(
                output_format,
                &format!("Logged in as {} (role: {})", user.username, user.role),
                Some(json!({ "user": user })),
            )
        }
        AuthCommands::Logout => {
            if client.session().token().is_none() {
                return output_success(output_format, "Not logged in", None);
            }
            client.auth().logout().await?;
            output_success(output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let decision = client.guard().resolve().await;
            let session = client.session().snapshot();
            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({
                        "decision": decision,
                        "phase": session.phase(),
                        "is_authenticated": session.is_authenticated(),
                        "user": session.user(),
                        "error": session.error(),
                    }))?);
                }
                OutputFormat::Text => match (decision, session.user()) {
                    (GuardDecision::Render, Some(user)) => {
                        println!("Logged in as {} (role: {})", user.username, user.role);
                    }
                    _ => {
                        println!("Not logged in");
                        if let Some(error) = session.error() {
                            println!("Last error: {}", error);
                        }
                    }
                },
            }
            Ok(())
        }
        AuthCommands::Whoami => {
            require_user(&client).await?;
            let user = client.auth().refresh_profile().await?;
            output_record(output_format, &user)
        }
        AuthCommands::Register { username, email, password, role } => {
            let password = password_or_prompt(password)?;
            let new_user = NewUser {
                username,
                email,
                first_name: None,
                last_name: None,
                role,
                is_active: None,
                password: Some(password),
            };
            let user = client.auth().register(&new_user).await?;
            output_success(
                output_format,
                &format!("Registered user {} (role: {})", user.username, user.role),
                Some(json!({ "user": user })),
            )
        }
    }
}
