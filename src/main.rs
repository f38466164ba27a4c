//! # Data Gateway CLI (`dsg`)
//!
//! The `dsg` binary is the primary interface for the gateway. One-shot
//! commands exercise each connector against sources declared in the TOML
//! config; `serve` starts the tool server (HTTP tool API + MCP endpoint).
//!
//! ## Usage
//!
//! ```bash
//! dsg --config ./dsg.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dsg sources` | List configured data sources and their health |
//! | `dsg query <source> "<sql>"` | Run SQL against a relational source |
//! | `dsg fetch <source> <endpoint>` | Call an endpoint on a remote API source |
//! | `dsg read-csv <source>` | Read rows from a delimited-file source |
//! | `dsg read-json <source>` | Read a structured-document source |
//! | `dsg transform <source> <op>` | Acknowledge an aggregate operation |
//! | `dsg serve` | Start the tool server |
//!
//! ## Examples
//!
//! ```bash
//! # List sources and health
//! dsg sources
//!
//! # Ad-hoc SQL
//! dsg query crm "SELECT COUNT(*) AS n FROM customers"
//!
//! # Remote API call with query parameters
//! dsg fetch billing /invoices --param status=open
//!
//! # Filtered, bounded CSV read
//! dsg read-csv leads --filter city=london --limit 10
//!
//! # Subtree extraction from a JSON document
//! dsg read-json catalog --path '$.products[0].sku'
//!
//! # Start the server
//! dsg serve
//! ```
//!
//! One-shot commands route through the same dispatcher as the server, so
//! their output is the exact envelope a tool caller would see.

use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

use data_gateway::config;
use data_gateway::registry::Registry;
use data_gateway::server;
use data_gateway::tools::{dispatch, ToolContext, ToolRegistry};

/// Data Gateway CLI - uniform access to heterogeneous data sources.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file declaring the server bind address and the initial data sources.
#[derive(Parser)]
#[command(
    name = "dsg",
    about = "Data Gateway - a uniform tool-invocation gateway over heterogeneous data sources",
    version,
    long_about = "Data Gateway registers named data sources of different kinds (SQLite \
    databases, remote HTTP APIs, delimited text files, JSON documents) behind one registry \
    and exposes type-appropriate operations over a single dispatch surface: an HTTP tool \
    API, an MCP endpoint, and this CLI."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./dsg.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// List configured data sources and their health.
    Sources,

    /// Execute ad-hoc SQL against a relational source.
    ///
    /// The query text runs verbatim; the gateway applies no
    /// parameterization or statement restriction.
    Query {
        /// Registered source name.
        source: String,
        /// SQL text.
        query: String,
    },

    /// Call an endpoint on a remote API source.
    Fetch {
        /// Registered source name.
        source: String,
        /// Endpoint, appended verbatim to the source's base URL.
        endpoint: String,
        /// HTTP method.
        #[arg(long, default_value = "GET")]
        method: String,
        /// Query parameters as `key=value` pairs.
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
        /// JSON request body (attached for POST/PUT only).
        #[arg(long)]
        body: Option<String>,
    },

    /// Read rows from a delimited-file source.
    ReadCsv {
        /// Registered source name.
        source: String,
        /// Equality filters as `column=value` pairs; all must match.
        #[arg(long = "filter", value_parser = parse_key_val)]
        filters: Vec<(String, String)>,
        /// Stop reading once this many rows are kept.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Read a structured-document source, optionally extracting a subtree.
    ReadJson {
        /// Registered source name.
        source: String,
        /// Path expression, e.g. `$.users[0].name`.
        #[arg(long)]
        path: Option<String>,
    },

    /// Acknowledge an aggregate operation against a source.
    ///
    /// The aggregate stage is declared but deliberately not executed; the
    /// acknowledgement describes what the operation would do.
    Transform {
        /// Registered source name.
        source: String,
        /// One of: count, sum, average, group_by.
        operation: String,
        /// Field the operation would target.
        #[arg(long)]
        field: Option<String>,
    },

    /// Start the tool server (HTTP tool API + MCP endpoint).
    Serve,
}

/// Parse a `key=value` pair for `--param` / `--filter` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn pairs_to_object(pairs: &[(String, String)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| (key.clone(), Value::from(value.as_str())))
        .collect()
}

/// Print the dispatch envelope and fail the process on `isError`.
fn print_outcome(result: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    if result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        anyhow::bail!("tool invocation failed");
    }
    Ok(())
}

fn list_sources(registry: &Registry) {
    println!("{:<20} {:<22} STATUS", "NAME", "KIND");
    for descriptor in registry.list() {
        let status = if descriptor.kind.is_file_backed() {
            match descriptor.path() {
                Ok(path) if std::path::Path::new(path).exists() => "ok".to_string(),
                Ok(path) => format!("missing file: {path}"),
                Err(_) => "invalid config".to_string(),
            }
        } else {
            "configured".to_string()
        };
        println!(
            "{:<20} {:<22} {}",
            descriptor.name,
            descriptor.kind.to_string(),
            status
        );
    }
    if registry.is_empty() {
        println!("(no sources configured)");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("data_gateway=info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let registry = Arc::new(Registry::from_config(&cfg)?);

    // One-shot commands share the server's dispatch path.
    let tools = ToolRegistry::with_builtins();
    let ctx = ToolContext::new(registry.clone());

    match cli.command {
        Commands::Sources => {
            list_sources(&registry);
        }
        Commands::Query { source, query } => {
            let result = dispatch(
                &tools,
                &ctx,
                "query_sql",
                json!({ "sourceName": source, "query": query }),
            )
            .await;
            print_outcome(&result)?;
        }
        Commands::Fetch {
            source,
            endpoint,
            method,
            params,
            body,
        } => {
            let mut args = json!({
                "sourceName": source,
                "endpoint": endpoint,
                "method": method,
            });
            if !params.is_empty() {
                args["params"] = Value::Object(pairs_to_object(&params));
            }
            if let Some(body) = body {
                let parsed: Value = serde_json::from_str(&body)
                    .map_err(|e| anyhow::anyhow!("--body must be valid JSON: {e}"))?;
                args["body"] = parsed;
            }
            let result = dispatch(&tools, &ctx, "fetch_api_data", args).await;
            print_outcome(&result)?;
        }
        Commands::ReadCsv {
            source,
            filters,
            limit,
        } => {
            let mut args = json!({ "sourceName": source });
            if !filters.is_empty() {
                args["filter"] = Value::Object(pairs_to_object(&filters));
            }
            if let Some(limit) = limit {
                args["limit"] = Value::from(limit);
            }
            let result = dispatch(&tools, &ctx, "read_csv", args).await;
            print_outcome(&result)?;
        }
        Commands::ReadJson { source, path } => {
            let mut args = json!({ "sourceName": source });
            if let Some(path) = path {
                args["jsonPath"] = Value::from(path);
            }
            let result = dispatch(&tools, &ctx, "read_json", args).await;
            print_outcome(&result)?;
        }
        Commands::Transform {
            source,
            operation,
            field,
        } => {
            let mut args = json!({ "sourceName": source, "operation": operation });
            if let Some(field) = field {
                args["field"] = Value::from(field);
            }
            let result = dispatch(&tools, &ctx, "transform_data", args).await;
            print_outcome(&result)?;
        }
        Commands::Serve => {
            server::run_server(&cfg, registry).await?;
        }
    }

    Ok(())
}
