use super::resource::require_user;
use crate::cli::config::build_client;
use crate::cli::OutputFormat;
use crate::client::CmmsClient;
use crate::error::ClientError;
use crate::views::{Dashboard, Summary};

pub async fn handle(output_format: &OutputFormat) -> anyhow::Result<()> {
    let client = build_client()?;
    let user = require_user(&client).await?;

    let mut dashboard = Dashboard::new(&user, client.policy());
    match summary(&client).await {
        Ok(summary) => dashboard = dashboard.with_summary(summary),
        Err(e) => tracing::warn!("dashboard summary unavailable: {}", e),
    }

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dashboard)?),
        OutputFormat::Text => print!("{}", dashboard),
    }
    Ok(())
}

async fn summary(client: &CmmsClient) -> Result<Summary, ClientError> {
    let assets = client.assets().list().await?;
    let orders = client.work_orders().list().await?;
    let parts = client.parts().list().await?;

    Ok(Summary::tally(&assets, &orders, &parts))
}
