//! Share connection defaults, loaded from the config file and overridable
//! per-invocation on the command line.

use crate::cli::ShareArgs;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sharekit::ShareCredentials;
use std::fs;
use std::path::PathBuf;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("wincollect"))
}

/// Contents of `share.json`: where the payload share lives and how to
/// authenticate against it.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShareConfig {
    pub host: String,
    pub share: String,
    pub user: String,
    pub password: String,
    #[serde(default = "default_collection_dir")]
    pub collection_dir: String,
}

fn default_collection_dir() -> String {
    "collection".to_string()
}

impl ShareConfig {
    /// Load share.json if it exists.
    pub fn load() -> Result<Option<Self>> {
        let path = config_dir()?.join("share.json");
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config = serde_json::from_str(&content).context("Invalid share.json format")?;
        Ok(Some(config))
    }
}

/// Merge config-file defaults and command-line overrides into the share
/// credentials a deployment needs.
pub fn resolve_share(args: &ShareArgs) -> Result<ShareCredentials> {
    let defaults = ShareConfig::load()?;
    let defaults = defaults.as_ref();

    let field = |over: &Option<String>, def: Option<&String>, flag: &str| -> Result<String> {
        over.clone().or_else(|| def.cloned()).with_context(|| {
            format!("missing share setting; pass --{flag} or add it to share.json")
        })
    };

    Ok(ShareCredentials {
        host: field(&args.share_host, defaults.map(|c| &c.host), "share-host")?,
        share: field(&args.share_name, defaults.map(|c| &c.share), "share-name")?,
        user: field(&args.share_user, defaults.map(|c| &c.user), "share-user")?,
        password: field(&args.share_pass, defaults.map(|c| &c.password), "share-pass")?,
        collection_dir: args
            .share_dir
            .clone()
            .or_else(|| defaults.map(|c| c.collection_dir.clone()))
            .unwrap_or_else(default_collection_dir),
    })
}
