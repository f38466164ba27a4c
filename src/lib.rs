//! # Data Gateway
//!
//! A uniform tool-invocation gateway over heterogeneous data sources.
//!
//! Callers register named data sources of different kinds (a file-backed
//! SQLite database, a remote HTTP API, a delimited text file, a JSON
//! document) behind one registry, then issue type-appropriate operations
//! against them through a single dispatch surface, exposed over an HTTP
//! tool API and an MCP endpoint.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌───────────────────────────┐
//! │  CLI (dsg)   │   │ HTTP /tools │   │ MCP /mcp (streamable)     │
//! └──────┬───────┘   └──────┬──────┘   └─────────────┬─────────────┘
//!        └──────────────────┼────────────────────────┘
//!                           ▼
//!                    ┌─────────────┐
//!                    │  Dispatcher │  name → tool, errors → envelope
//!                    └──────┬──────┘
//!                           ▼
//!                    ┌─────────────┐
//!                    │   Registry  │  name → descriptor (kind + config)
//!                    └──────┬──────┘
//!          ┌────────────┬───┴────────┬──────────────┐
//!          ▼            ▼            ▼              ▼
//!     ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌───────────┐
//!     │ SQLite  │  │  HTTP   │  │   CSV   │  │   JSON    │
//!     │ (sqlx)  │  │(reqwest)│  │ stream  │  │ documents │
//!     └─────────┘  └─────────┘  └─────────┘  └───────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`registry`] | Data-source descriptors and the registry |
//! | [`error`] | Gateway error taxonomy |
//! | [`connector_sql`] | Relational (SQLite) connector |
//! | [`connector_api`] | Remote HTTP API connector |
//! | [`connector_csv`] | Delimited-file connector |
//! | [`connector_json`] | Structured-document connector |
//! | [`transform`] | Aggregate stage (declared, deliberately stubbed) |
//! | [`tools`] | Tool surface and dispatcher |
//! | [`server`] | HTTP tool server |
//! | [`mcp`] | MCP protocol bridge |

pub mod config;
pub mod connector_api;
pub mod connector_csv;
pub mod connector_json;
pub mod connector_sql;
pub mod error;
pub mod mcp;
pub mod registry;
pub mod server;
pub mod tools;
pub mod transform;
