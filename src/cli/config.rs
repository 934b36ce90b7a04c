use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::client::CmmsClient;
use crate::config::config;
use crate::session::{FileTokenStore, TokenStore};

/// CLI state directory, holding the persisted token.
pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("CMMS_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("cmms").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn token_store() -> anyhow::Result<Arc<dyn TokenStore>> {
    Ok(Arc::new(FileTokenStore::in_dir(get_config_dir()?)))
}

/// Client for one CLI invocation, with the session restored from disk.
pub fn build_client() -> anyhow::Result<CmmsClient> {
    let config = config();
    tracing::debug!(base_url = %config.api.base_url, environment = ?config.environment, "building client");
    Ok(CmmsClient::new(config, token_store()?)?)
}
