//! Data-source descriptor registry.
//!
//! The registry is the single source of truth for which data sources exist.
//! It owns an in-memory `name -> descriptor` mapping that is created empty at
//! startup (optionally seeded from config), mutated only by `register`, and
//! discarded at shutdown. There is no update or delete operation and no
//! persistence.
//!
//! The registry is an explicitly owned value passed by reference (usually
//! behind an `Arc`), never ambient global state, so tests construct isolated
//! instances per case.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::GatewayError;

// ═══════════════════════════════════════════════════════════════════════
// Source kinds
// ═══════════════════════════════════════════════════════════════════════

/// The fixed category of a data source. Assigned at registration, never
/// changed afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// File-backed SQLite database queried with ad-hoc SQL.
    Relational,
    /// Remote HTTP API called relative to a base URL.
    RemoteApi,
    /// Row-oriented delimited text file, read as a stream.
    DelimitedFile,
    /// JSON document file, loaded whole and addressed by path expression.
    StructuredDocument,
}

impl SourceKind {
    /// File-backed kinds require `config.path` to name an existing file at
    /// registration time.
    pub fn is_file_backed(self) -> bool {
        !matches!(self, SourceKind::RemoteApi)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourceKind::Relational => "relational",
            SourceKind::RemoteApi => "remote-api",
            SourceKind::DelimitedFile => "delimited-file",
            SourceKind::StructuredDocument => "structured-document",
        };
        f.write_str(label)
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relational" => Ok(SourceKind::Relational),
            "remote-api" => Ok(SourceKind::RemoteApi),
            "delimited-file" => Ok(SourceKind::DelimitedFile),
            "structured-document" => Ok(SourceKind::StructuredDocument),
            other => Err(format!(
                "unknown source kind '{other}' (expected relational, remote-api, \
                 delimited-file, or structured-document)"
            )),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Descriptors
// ═══════════════════════════════════════════════════════════════════════

/// Stored record describing one registered data source.
///
/// `config` is kept exactly as supplied at registration and echoed back to
/// callers verbatim. Typed access goes through the accessor methods below;
/// nothing is normalized or rewritten on the way in.
#[derive(Debug, Clone, Serialize)]
pub struct DataSourceDescriptor {
    pub name: String,
    pub kind: SourceKind,
    pub config: Value,
}

impl DataSourceDescriptor {
    /// Check the descriptor against the kind an operation expects.
    ///
    /// This is the caller-side guard: the registry stores whatever kind was
    /// registered and connectors refuse descriptors of the wrong kind.
    pub fn expect_kind(&self, expected: SourceKind) -> Result<&Self, GatewayError> {
        if self.kind == expected {
            Ok(self)
        } else {
            Err(GatewayError::KindMismatch {
                name: self.name.clone(),
                expected,
                actual: self.kind,
            })
        }
    }

    /// `config.path` for file-backed kinds.
    pub fn path(&self) -> Result<&str, GatewayError> {
        self.config
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::InvalidConfig {
                name: self.name.clone(),
                reason: "missing 'path'".to_string(),
            })
    }

    /// `config.url` for remote-api sources.
    pub fn base_url(&self) -> Result<&str, GatewayError> {
        self.config
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::InvalidConfig {
                name: self.name.clone(),
                reason: "missing 'url'".to_string(),
            })
    }

    /// Base header set for remote-api sources. Absent or malformed headers
    /// degrade to an empty set; only string values are carried.
    pub fn headers(&self) -> Vec<(String, String)> {
        self.config
            .get("headers")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(key, value)| {
                        value.as_str().map(|v| (key.clone(), v.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Field delimiter for delimited-file sources. Defaults to a comma.
    pub fn delimiter(&self) -> u8 {
        self.config
            .get("delimiter")
            .and_then(Value::as_str)
            .and_then(|s| s.bytes().next())
            .unwrap_or(b',')
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// In-memory registry of data-source descriptors.
///
/// Reads vastly outnumber writes: after startup the only mutation is
/// `register`. Concurrent registrations of the same name race on the write
/// lock; whichever lands second gets `DuplicateName`, and the order is
/// contractually nondeterministic.
pub struct Registry {
    sources: RwLock<Vec<DataSourceDescriptor>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sources: RwLock::new(Vec::new()),
        }
    }

    /// Create a registry seeded with every `[sources.<name>]` entry from the
    /// config file. Seeded entries go through [`register`](Registry::register)
    /// and obey the same invariants as tool-driven registration.
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let registry = Self::new();
        for (name, entry) in &config.sources {
            registry.register(name, entry.kind, entry.config.clone())?;
        }
        Ok(registry)
    }

    /// Register a new data source.
    ///
    /// Fails with `DuplicateName` if the name is taken and `InvalidConfig`
    /// if a required field is absent or, for file-backed kinds, the
    /// referenced file does not exist at call time. Both checks run before
    /// the entry is stored: a failed registration never mutates the
    /// registry. On success the stored descriptor is returned with its
    /// config untouched.
    pub fn register(
        &self,
        name: &str,
        kind: SourceKind,
        config: Value,
    ) -> Result<DataSourceDescriptor, GatewayError> {
        let mut sources = self.sources.write().expect("registry lock poisoned");
        if sources.iter().any(|d| d.name == name) {
            return Err(GatewayError::DuplicateName(name.to_string()));
        }
        validate_config(name, kind, &config)?;

        let descriptor = DataSourceDescriptor {
            name: name.to_string(),
            kind,
            config,
        };
        sources.push(descriptor.clone());
        Ok(descriptor)
    }

    /// All registered descriptors. The order happens to be insertion order;
    /// callers must not rely on it.
    pub fn list(&self) -> Vec<DataSourceDescriptor> {
        self.sources.read().expect("registry lock poisoned").clone()
    }

    /// Look up a descriptor by name.
    pub fn resolve(&self, name: &str) -> Result<DataSourceDescriptor, GatewayError> {
        self.sources
            .read()
            .expect("registry lock poisoned")
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(name.to_string()))
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.read().expect("registry lock poisoned").len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind-specific precondition checks, run synchronously at registration.
fn validate_config(name: &str, kind: SourceKind, config: &Value) -> Result<(), GatewayError> {
    let invalid = |reason: String| GatewayError::InvalidConfig {
        name: name.to_string(),
        reason,
    };

    if kind.is_file_backed() {
        let path = config
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(format!("{kind} sources require a 'path' string")))?;
        if !Path::new(path).exists() {
            return Err(invalid(format!("file does not exist: {path}")));
        }
    } else {
        config
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("remote-api sources require a 'url' string".to_string()))?;
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file_config(dir: &tempfile::TempDir, file: &str) -> Value {
        let path = dir.path().join(file);
        std::fs::write(&path, "x").unwrap();
        json!({ "path": path.to_string_lossy() })
    }

    #[test]
    fn register_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new();

        let descriptor = registry
            .register("crm", SourceKind::Relational, file_config(&dir, "crm.db"))
            .unwrap();
        assert_eq!(descriptor.name, "crm");
        assert_eq!(descriptor.kind, SourceKind::Relational);

        let resolved = registry.resolve("crm").unwrap();
        assert_eq!(resolved.name, "crm");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_name_leaves_first_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new();

        let first = file_config(&dir, "a.csv");
        registry
            .register("rows", SourceKind::DelimitedFile, first.clone())
            .unwrap();

        let second = file_config(&dir, "b.csv");
        let err = registry
            .register("rows", SourceKind::DelimitedFile, second)
            .unwrap_err();
        assert!(matches!(err, GatewayError::DuplicateName(_)));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("rows").unwrap().config, first);
    }

    #[test]
    fn missing_file_fails_without_mutation() {
        let registry = Registry::new();
        let err = registry
            .register(
                "ghost",
                SourceKind::StructuredDocument,
                json!({ "path": "/no/such/file.json" }),
            )
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidConfig { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn remote_api_requires_url() {
        let registry = Registry::new();
        let err = registry
            .register("api", SourceKind::RemoteApi, json!({ "headers": {} }))
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidConfig { .. }));
        assert!(registry.is_empty());

        registry
            .register(
                "api",
                SourceKind::RemoteApi,
                json!({ "url": "http://localhost:9" }),
            )
            .unwrap();
    }

    #[test]
    fn resolve_unknown_name() {
        let registry = Registry::new();
        let err = registry.resolve("nope").unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[test]
    fn expect_kind_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new();
        let descriptor = registry
            .register(
                "doc",
                SourceKind::StructuredDocument,
                file_config(&dir, "d.json"),
            )
            .unwrap();

        assert!(descriptor.expect_kind(SourceKind::StructuredDocument).is_ok());
        let err = descriptor.expect_kind(SourceKind::Relational).unwrap_err();
        assert!(matches!(err, GatewayError::KindMismatch { .. }));
    }

    #[test]
    fn config_echoed_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "x").unwrap();

        // Extra fields the gateway does not understand survive unchanged.
        let config = json!({
            "path": path.to_string_lossy(),
            "delimiter": ";",
            "comment": "left as-is"
        });
        let descriptor = registry
            .register("extra", SourceKind::DelimitedFile, config.clone())
            .unwrap();
        assert_eq!(descriptor.config, config);
        assert_eq!(descriptor.delimiter(), b';');
    }

    #[test]
    fn kind_labels_round_trip() {
        for kind in [
            SourceKind::Relational,
            SourceKind::RemoteApi,
            SourceKind::DelimitedFile,
            SourceKind::StructuredDocument,
        ] {
            let parsed: SourceKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("vector-store".parse::<SourceKind>().is_err());
    }
}
