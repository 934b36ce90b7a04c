use clap::Subcommand;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::api::{Resource, ResourceApi};
use crate::cli::config::build_client;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::client::CmmsClient;
use crate::error::ClientError;
use crate::guard::GuardDecision;
use crate::models::User;
use crate::policy::{Action, Permission};
use crate::types::Record;
use crate::views::{ListView, Tabular, ViewState};

#[derive(Subcommand)]
pub enum ResourceCommands {
    #[command(about = "List records")]
    List,

    #[command(about = "Show one record")]
    Show {
        #[arg(help = "Record ID")]
        id: String,
    },

    #[command(about = "Create record from JSON on stdin")]
    Create,

    #[command(about = "Update record with partial JSON on stdin")]
    Update {
        #[arg(help = "Record ID to update")]
        id: String,
    },

    #[command(about = "Delete record")]
    Delete {
        #[arg(help = "Record ID to delete")]
        id: String,
    },
}

pub async fn handle_assets(cmd: ResourceCommands, output_format: &OutputFormat) -> anyhow::Result<()> {
    let client = build_client()?;
    let api = client.assets();
    handle(&client, api, cmd, output_format).await
}

pub async fn handle_users(cmd: ResourceCommands, output_format: &OutputFormat) -> anyhow::Result<()> {
    let client = build_client()?;
    let api = client.users();
    handle(&client, api, cmd, output_format).await
}

pub async fn handle<R>(
    client: &CmmsClient,
    api: ResourceApi<R>,
    cmd: ResourceCommands,
    output_format: &OutputFormat,
) -> anyhow::Result<()>
where
    R: Resource,
    R::Record: Tabular,
    R::Create: DeserializeOwned,
    R::Patch: DeserializeOwned,
{
    let user = require_user(client).await?;
    let kind = api.kind();

    match cmd {
        ResourceCommands::List => {
            authorize(client, &user, &api, Action::Read, None).await?;
            let mut view = ListView::new(api);
            if let ViewState::Failed(message) = view.load().await {
                return Err(anyhow::anyhow!("Error loading {}: {}", kind.label(), message));
            }
            output_page(output_format, &view.render(&user, client.policy()))
        }
        ResourceCommands::Show { id } => {
            authorize(client, &user, &api, Action::Read, None).await?;
            let record = api.get(&id).await?;
            output_record(output_format, &record)
        }
        ResourceCommands::Create => {
            authorize(client, &user, &api, Action::Create, None).await?;
            let payload: R::Create = read_stdin_json()?;
            let record = api.create(&payload).await?;
            output_success(
                output_format,
                &format!("Created {} {}", kind.label(), record.id()),
                Some(json!({ "record": record })),
            )
        }
        ResourceCommands::Update { id } => {
            authorize(client, &user, &api, Action::Edit, Some(&id)).await?;
            let patch: R::Patch = read_stdin_json()?;
            let record = api.update(&id, &patch).await?;
            output_success(
                output_format,
                &format!("Updated {} {}", kind.label(), record.id()),
                Some(json!({ "record": record })),
            )
        }
        ResourceCommands::Delete { id } => {
            authorize(client, &user, &api, Action::Delete, Some(&id)).await?;
            api.delete(&id).await?;
            output_success(
                output_format,
                &format!("Deleted {} {}", kind.label(), id),
                Some(json!({ "id": id })),
            )
        }
    }
}

/// Pass the route guard, verifying a persisted token if needed.
pub async fn require_user(client: &CmmsClient) -> anyhow::Result<User> {
    match client.guard().resolve().await {
        GuardDecision::Render => client
            .session()
            .user()
            .ok_or_else(|| anyhow::anyhow!("Session has no user")),
        GuardDecision::Loading | GuardDecision::RedirectToLogin => {
            let session = client.session().snapshot();
            let reason = session
                .error()
                .map(|e| format!(" ({})", e))
                .unwrap_or_default();
            Err(anyhow::anyhow!(
                "Login required{}. Run `cmms auth login <username>`",
                reason
            ))
        }
    }
}

/// Refuse an action the policy denies before any request is made. For
/// assignment-scoped permissions the record is fetched to check its
/// assignee.
pub async fn authorize<R: Resource>(
    client: &CmmsClient,
    user: &User,
    api: &ResourceApi<R>,
    action: Action,
    id: Option<&str>,
) -> Result<(), ClientError> {
    let kind = api.kind();
    let allowed = match client.policy().permission(user.role, kind, action) {
        Permission::Allow => true,
        Permission::Deny => false,
        Permission::IfAssigned => match id {
            Some(id) => {
                let record = api.get(id).await?;
                client.policy().allows(user, kind, action, record.assignee())
            }
            None => false,
        },
    };

    if allowed {
        Ok(())
    } else {
        tracing::debug!(role = %user.role, resource = %kind, action = %action, "refused by policy");
        Err(ClientError::forbidden(format!(
            "Role '{}' may not {} {}",
            user.role,
            action,
            kind.label()
        )))
    }
}
