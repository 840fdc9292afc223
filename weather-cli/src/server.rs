//! Line-delimited JSON-RPC 2.0 host for the weather tools.
//!
//! Implements the subset of the Model Context Protocol an agent needs to
//! discover and call tools: `initialize`, `ping`, `tools/list` and
//! `tools/call`. One request per line on stdin, one response per line on
//! stdout.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};
use weather_core::{
    ToolError, ToolRegistry,
    tools::{API_VERSION, SERVER_NAME},
};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.to_string(),
            }),
        }
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION
        },
        "instructions": format!(
            "Weather data from OpenWeatherMap ({API_VERSION}).\n\n\
             Available tools:\n\
             - get_weather: current conditions, today's forecast, next 3 days and alerts for a location\n\
             - list_available_tools: describe the tools of this server"
        )
    })
}

async fn handle_tools_call(registry: &ToolRegistry, params: Value) -> Result<Value, ToolError> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments {
            tool: "tools/call".to_string(),
            message: "missing tool name".to_string(),
        })?;

    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
    info!(tool = name, "tool called");

    let result = registry.call(name, arguments).await?;
    let is_error = result.get("error").is_some();
    let text = serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string());

    Ok(json!({
        "content": [{
            "type": "text",
            "text": text
        }],
        "isError": is_error
    }))
}

/// Handle one request; `None` for notifications.
///
/// A request without an `id` is a notification whatever its method: it is
/// still dispatched, but never answered.
pub async fn handle_request(registry: &ToolRegistry, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    debug!(method = %request.method, "handling request");

    if request.method.starts_with("notifications/") || request.method == "initialized" {
        return None;
    }

    if request.id.is_none() {
        if request.method == "tools/call" {
            if let Err(e) = handle_tools_call(registry, request.params).await {
                warn!("notification tools/call failed: {e}");
            }
        } else {
            debug!(method = %request.method, "ignoring notification");
        }
        return None;
    }

    let response = match request.method.as_str() {
        "initialize" => JsonRpcResponse::success(request.id, initialize_result()),
        "ping" => JsonRpcResponse::success(request.id, json!({})),
        "tools/list" => JsonRpcResponse::success(request.id, json!({ "tools": registry.definitions() })),
        "tools/call" => match handle_tools_call(registry, request.params).await {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(e) => JsonRpcResponse::error(request.id, INVALID_PARAMS, &e.to_string()),
        },
        other => {
            warn!(method = other, "unknown method");
            JsonRpcResponse::error(request.id, METHOD_NOT_FOUND, &format!("Method not found: {other}"))
        }
    };

    Some(response)
}

/// Parse one line into a request, or the error response to send back.
fn parse_request(line: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        error!("failed to parse request: {e}");
        JsonRpcResponse::error(None, PARSE_ERROR, "Parse error")
    })?;

    // Echo the id back when the frame is JSON but not a valid request.
    let id = value.get("id").filter(|id| !id.is_null()).cloned();
    serde_json::from_value(value).map_err(|e| {
        error!("invalid request: {e}");
        JsonRpcResponse::error(id, INVALID_REQUEST, "Invalid Request")
    })
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
pub async fn serve<R, W>(registry: &ToolRegistry, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match parse_request(&line) {
            Ok(request) => handle_request(registry, request).await,
            Err(response) => Some(response),
        };

        if let Some(response) = response {
            let frame = serde_json::to_string(&response)?;
            writer.write_all(frame.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    Ok(())
}

pub async fn run_stdio(registry: &ToolRegistry) -> anyhow::Result<()> {
    info!("weather tool server ready on stdio");
    serve(registry, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    info!("stdin closed, shutting down");
    Ok(())
}
