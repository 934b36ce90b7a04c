use clap::Subcommand;

use super::resource::{handle as handle_resource, require_user, ResourceCommands};
use crate::cli::config::build_client;
use crate::cli::utils::output_page;
use crate::cli::OutputFormat;
use crate::views::TablePage;

#[derive(Subcommand)]
pub enum PartCommands {
    #[command(flatten)]
    Common(ResourceCommands),

    #[command(about = "List parts at or below their reorder point")]
    Reorder,
}

pub async fn handle(cmd: PartCommands, output_format: &OutputFormat) -> anyhow::Result<()> {
    let client = build_client()?;
    let api = client.parts();

    match cmd {
        PartCommands::Common(cmd) => handle_resource(&client, api, cmd, output_format).await,
        PartCommands::Reorder => {
            let user = require_user(&client).await?;
            let parts = api.below_reorder_point().await?;
            output_page(output_format, &TablePage::build(&parts, &user, client.policy()))
        }
    }
}
