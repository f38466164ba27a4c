use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::registry::SourceKind;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7410".to_string()
}

/// One `[sources.<name>]` entry. Everything beyond `kind` is kept as the
/// raw config value so seeding goes through the same registration
/// validation as the `register_data_source` tool.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceEntry {
    pub kind: SourceKind,
    #[serde(flatten)]
    pub config: serde_json::Value,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.server.bind.parse::<std::net::SocketAddr>().is_err() {
        anyhow::bail!(
            "server.bind must be a host:port address, got '{}'",
            config.server.bind
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sources() {
        let toml = r#"
[server]
bind = "127.0.0.1:7410"

[sources.crm]
kind = "relational"
path = "data/crm.sqlite"

[sources.billing]
kind = "remote-api"
url = "https://billing.example.com/api/v1"
headers = { "X-Api-Key" = "secret" }

[sources.leads]
kind = "delimited-file"
path = "data/leads.csv"
delimiter = ";"

[sources.catalog]
kind = "structured-document"
path = "data/catalog.json"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:7410");
        assert_eq!(config.sources.len(), 4);

        let crm = &config.sources["crm"];
        assert_eq!(crm.kind, SourceKind::Relational);
        assert_eq!(crm.config["path"], "data/crm.sqlite");

        let billing = &config.sources["billing"];
        assert_eq!(billing.kind, SourceKind::RemoteApi);
        assert_eq!(billing.config["headers"]["X-Api-Key"], "secret");

        assert_eq!(config.sources["leads"].config["delimiter"], ";");
    }

    #[test]
    fn defaults_when_sections_absent() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:7410");
        assert!(config.sources.is_empty());
    }

    #[test]
    fn unknown_kind_rejected() {
        let toml = r#"
[sources.bad]
kind = "vector-store"
path = "x"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }
}
