//! Gateway error taxonomy.
//!
//! Registry and connector failures carry a typed variant so callers and
//! tests can match on the failure class. The tool layer folds these into
//! `anyhow::Error`; the dispatcher renders every failure as the uniform
//! `{isError: true, message}` envelope, so no raw fault ever crosses the
//! channel boundary.

use thiserror::Error;

use crate::registry::SourceKind;

/// Every failure class the gateway distinguishes.
///
/// Connectors never retry: each failure surfaces immediately and the
/// invocation fails. There is no recoverable/fatal split at this layer.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A data source with this name is already registered.
    #[error("data source '{0}' is already registered")]
    DuplicateName(String),

    /// The registration config is missing a required field, or a file-backed
    /// source points at a path that does not exist at registration time.
    #[error("invalid config for data source '{name}': {reason}")]
    InvalidConfig { name: String, reason: String },

    /// No data source is registered under this name.
    #[error("data source '{0}' is not registered")]
    NotFound(String),

    /// The source exists but is of a different kind than the operation
    /// expects. Raised by callers via `expect_kind`, not by the registry.
    #[error("data source '{name}' has kind '{actual}', expected '{expected}'")]
    KindMismatch {
        name: String,
        expected: SourceKind,
        actual: SourceKind,
    },

    /// An I/O, transport, query, or parse failure inside a connector.
    #[error("{0}")]
    Connector(String),

    /// The dispatcher received a tool name it does not know.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}
