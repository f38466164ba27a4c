//! Tool surface and dispatcher.
//!
//! Every gateway operation is exposed as a [`Tool`]: a named, described,
//! JSON-schema'd unit of work executed against a [`ToolContext`]. The seven
//! built-in tools cover the whole surface:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    ToolRegistry                      │
//! │  register_data_source   list_data_sources            │
//! │  query_sql   fetch_api_data   read_csv   read_json   │
//! │  transform_data                                      │
//! └───────────────────────┬──────────────────────────────┘
//!                         ▼
//!               dispatch() → envelope
//! ```
//!
//! [`dispatch`] is the single entry point used by the HTTP server, the MCP
//! bridge, and the CLI. Successful outcomes pass through as the tool built
//! them; every failure, including an unknown tool name, is rendered as the
//! uniform `{isError: true, message}` envelope so no raw fault crosses the
//! channel boundary.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;

use crate::connector_api;
use crate::connector_csv;
use crate::connector_json;
use crate::connector_sql;
use crate::error::GatewayError;
use crate::registry::{Registry, SourceKind};
use crate::transform::{self, TransformOp};

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// One invocable gateway operation.
///
/// Implementations validate their own arguments and delegate to a
/// connector or the registry. Argument failures use `anyhow::bail!`; core
/// failures arrive as typed [`GatewayError`]s through `?`. Both end up in
/// the dispatcher's envelope.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as callers address it (e.g. `"query_sql"`).
    fn name(&self) -> &str;

    /// One-line description for discovery.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute with JSON parameters (always an object).
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Shared state handed to every tool invocation.
///
/// The registry is the only cross-invocation state the gateway owns;
/// everything else a tool touches lives for one call.
pub struct ToolContext {
    registry: Arc<Registry>,
}

impl ToolContext {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Parameter helpers
// ═══════════════════════════════════════════════════════════════════════

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    match params.get(key).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => anyhow::bail!("'{key}' is required and must be a non-empty string"),
    }
}

fn optional_limit(params: &Value) -> Result<Option<usize>> {
    match params.get("limit") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match value.as_u64() {
            Some(n) => Ok(Some(n as usize)),
            None => anyhow::bail!("'limit' must be a non-negative integer"),
        },
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tools
// ═══════════════════════════════════════════════════════════════════════

/// `register_data_source`: add a named source to the registry.
pub struct RegisterSourceTool;

#[async_trait]
impl Tool for RegisterSourceTool {
    fn name(&self) -> &str {
        "register_data_source"
    }

    fn description(&self) -> &str {
        "Register a named data source (relational, remote-api, delimited-file, structured-document)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Unique source name" },
                "kind": {
                    "type": "string",
                    "enum": ["relational", "remote-api", "delimited-file", "structured-document"]
                },
                "config": {
                    "type": "object",
                    "description": "Kind-specific config: {path} for file-backed kinds, {url, headers} for remote-api"
                }
            },
            "required": ["name", "kind", "config"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let name = required_str(&params, "name")?;
        let kind = SourceKind::from_str(required_str(&params, "kind")?)
            .map_err(|e| anyhow::anyhow!(e))?;
        let config = match params.get("config") {
            Some(value @ Value::Object(_)) => value.clone(),
            _ => anyhow::bail!("'config' is required and must be an object"),
        };

        let descriptor = ctx.registry().register(name, kind, config)?;
        Ok(json!({
            "success": true,
            "message": format!("registered data source '{name}'"),
            "dataSource": descriptor,
        }))
    }
}

/// `list_data_sources`: enumerate everything registered.
pub struct ListSourcesTool;

#[async_trait]
impl Tool for ListSourcesTool {
    fn name(&self) -> &str {
        "list_data_sources"
    }

    fn description(&self) -> &str {
        "List all registered data sources"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        let sources = ctx.registry().list();
        Ok(json!({
            "count": sources.len(),
            "dataSources": sources,
        }))
    }
}

/// `query_sql`: ad-hoc SQL against a relational source.
pub struct QuerySqlTool;

#[async_trait]
impl Tool for QuerySqlTool {
    fn name(&self) -> &str {
        "query_sql"
    }

    fn description(&self) -> &str {
        "Execute a SQL query against a relational data source"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "sourceName": { "type": "string", "description": "Registered source name" },
                "query": { "type": "string", "description": "SQL text, executed verbatim" }
            },
            "required": ["sourceName", "query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let source_name = required_str(&params, "sourceName")?;
        let query = required_str(&params, "query")?;

        let descriptor = ctx.registry().resolve(source_name)?;
        let outcome = connector_sql::run_query(&descriptor, query).await?;

        Ok(json!({
            "success": true,
            "rowCount": outcome.row_count,
            "data": outcome.rows,
        }))
    }
}

/// `fetch_api_data`: call an endpoint on a remote-api source.
pub struct FetchApiTool;

#[async_trait]
impl Tool for FetchApiTool {
    fn name(&self) -> &str {
        "fetch_api_data"
    }

    fn description(&self) -> &str {
        "Call an HTTP endpoint on a remote-api data source"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "sourceName": { "type": "string", "description": "Registered source name" },
                "endpoint": { "type": "string", "description": "Appended verbatim to the source's base URL" },
                "method": { "type": "string", "enum": ["GET", "POST", "PUT", "DELETE"], "default": "GET" },
                "params": { "type": "object", "description": "Query parameters" },
                "body": { "description": "JSON request body, attached for POST/PUT only" }
            },
            "required": ["sourceName", "endpoint"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let source_name = required_str(&params, "sourceName")?;
        let endpoint = required_str(&params, "endpoint")?;
        let method = params
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("GET");
        let query_params = params.get("params").and_then(Value::as_object);
        let body = params.get("body");

        let descriptor = ctx.registry().resolve(source_name)?;
        let response =
            connector_api::call_endpoint(&descriptor, endpoint, method, query_params, body)
                .await?;

        Ok(json!({
            "success": true,
            "status": response.status,
            "headers": response.headers,
            "data": response.data,
        }))
    }
}

/// `read_csv`: filtered, limited read of a delimited-file source.
pub struct ReadCsvTool;

#[async_trait]
impl Tool for ReadCsvTool {
    fn name(&self) -> &str {
        "read_csv"
    }

    fn description(&self) -> &str {
        "Read rows from a delimited-file data source with optional filter and limit"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "sourceName": { "type": "string", "description": "Registered source name" },
                "filter": { "type": "object", "description": "column -> required value, all entries must match" },
                "limit": { "type": "integer", "minimum": 0, "description": "Stop reading once this many rows are kept" }
            },
            "required": ["sourceName"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let source_name = required_str(&params, "sourceName")?;
        let filter = params.get("filter").and_then(Value::as_object);
        let limit = optional_limit(&params)?;

        let descriptor = ctx.registry().resolve(source_name)?;
        let outcome = connector_csv::read_rows(&descriptor, filter, limit)?;

        Ok(json!({
            "success": true,
            "rowCount": outcome.row_count,
            "data": outcome.rows,
        }))
    }
}

/// `read_json`: load a structured-document source, optionally extracting a
/// subtree.
pub struct ReadJsonTool;

#[async_trait]
impl Tool for ReadJsonTool {
    fn name(&self) -> &str {
        "read_json"
    }

    fn description(&self) -> &str {
        "Read a structured-document data source, optionally extracting a subtree by path"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "sourceName": { "type": "string", "description": "Registered source name" },
                "jsonPath": { "type": "string", "description": "Path expression, e.g. $.users[0].name" }
            },
            "required": ["sourceName"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let source_name = required_str(&params, "sourceName")?;
        let path_expr = params.get("jsonPath").and_then(Value::as_str);

        let descriptor = ctx.registry().resolve(source_name)?;
        let data = connector_json::read_document(&descriptor, path_expr)?;

        Ok(json!({
            "success": true,
            "data": data,
        }))
    }
}

/// `transform_data`: the declared-but-stubbed aggregate stage.
pub struct TransformTool;

#[async_trait]
impl Tool for TransformTool {
    fn name(&self) -> &str {
        "transform_data"
    }

    fn description(&self) -> &str {
        "Acknowledge an aggregate operation (count, sum, average, group_by) against a data source"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "sourceName": { "type": "string", "description": "Registered source name" },
                "operation": { "type": "string", "enum": ["count", "sum", "average", "group_by"] },
                "field": { "type": "string", "description": "Field the operation would target" }
            },
            "required": ["sourceName", "operation"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let source_name = required_str(&params, "sourceName")?;
        let operation: TransformOp =
            serde_json::from_value(Value::String(required_str(&params, "operation")?.to_string()))
                .map_err(|_| {
                    anyhow::anyhow!("'operation' must be one of count, sum, average, group_by")
                })?;
        let field = params.get("field").and_then(Value::as_str);

        let ack = transform::plan_transform(ctx.registry(), source_name, operation, field)?;

        Ok(json!({
            "success": true,
            "message": format!("transform acknowledged for '{source_name}'"),
            "operation": ack.operation,
            "field": ack.field,
            "computed": ack.computed,
            "note": ack.note,
        }))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Serializable tool descriptor for `GET /tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Registry of invocable tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a registry pre-loaded with the seven gateway tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(RegisterSourceTool));
        registry.register(Box::new(ListSourcesTool));
        registry.register(Box::new(QuerySqlTool));
        registry.register(Box::new(FetchApiTool));
        registry.register(Box::new(ReadCsvTool));
        registry.register(Box::new(ReadJsonTool));
        registry.register(Box::new(TransformTool));
        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Get all registered tools.
    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    /// Find a tool by name.
    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Return the count of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Dispatcher
// ═══════════════════════════════════════════════════════════════════════

/// The uniform failure envelope.
pub fn error_envelope(message: impl Into<String>) -> Value {
    json!({ "isError": true, "message": message.into() })
}

/// Resolve `name` and run the tool, normalizing the outcome.
///
/// Success bodies pass through exactly as the tool produced them; every
/// failure, including an unknown tool name, becomes the `isError` envelope.
pub async fn dispatch(tools: &ToolRegistry, ctx: &ToolContext, name: &str, args: Value) -> Value {
    let Some(tool) = tools.find(name) else {
        return error_envelope(GatewayError::UnknownTool(name.to_string()).to_string());
    };

    match tool.execute(args, ctx).await {
        Ok(result) => result,
        Err(e) => error_envelope(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_tool_becomes_envelope() {
        let tools = ToolRegistry::with_builtins();
        let ctx = ToolContext::new(Arc::new(Registry::new()));

        let result = dispatch(&tools, &ctx, "drop_tables", json!({})).await;
        assert_eq!(result["isError"], true);
        assert!(result["message"]
            .as_str()
            .unwrap()
            .contains("unknown tool: drop_tables"));
    }

    #[test]
    fn builtins_cover_the_tool_surface() {
        let tools = ToolRegistry::with_builtins();
        assert_eq!(tools.len(), 7);
        for name in [
            "register_data_source",
            "list_data_sources",
            "query_sql",
            "fetch_api_data",
            "read_csv",
            "read_json",
            "transform_data",
        ] {
            assert!(tools.find(name).is_some(), "missing tool {name}");
        }
    }

    #[tokio::test]
    async fn missing_required_argument_is_reported() {
        let tools = ToolRegistry::with_builtins();
        let ctx = ToolContext::new(Arc::new(Registry::new()));

        let result = dispatch(&tools, &ctx, "query_sql", json!({ "query": "SELECT 1" })).await;
        assert_eq!(result["isError"], true);
        assert!(result["message"].as_str().unwrap().contains("sourceName"));
    }
}
