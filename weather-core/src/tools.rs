//! Tool surface exposed to an LLM agent: `get_weather` and
//! `list_available_tools`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;

use crate::service::WeatherService;

pub const SERVER_NAME: &str = "WeatherAssistant";
pub const API_VERSION: &str = "One Call API 3.0";

/// Definition of a tool as advertised to the agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Failures of the tool host itself, as opposed to weather failures
/// (which are ordinary `{ "error": ... }` results).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments.
    fn input_schema(&self) -> Value;

    async fn call(&self, args: Value) -> Result<Value, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetWeatherArgs {
    location: String,
}

pub struct GetWeatherTool {
    service: Arc<WeatherService>,
}

impl GetWeatherTool {
    pub fn new(service: Arc<WeatherService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for GetWeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Fetches comprehensive weather data for a location using OpenWeatherMap One Call API 3.0: \
         current conditions, today's forecast, the next 3 days and active weather alerts. \
         Returns either the weather report or an object with a single `error` field."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City name with optional country code (e.g., 'London,uk')"
                }
            },
            "required": ["location"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: GetWeatherArgs =
            serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments {
                tool: self.name().to_string(),
                message: e.to_string(),
            })?;

        Ok(self.service.get_weather(&args.location).await.to_json())
    }
}

pub struct ListToolsTool;

#[async_trait]
impl Tool for ListToolsTool {
    fn name(&self) -> &str {
        "list_available_tools"
    }

    fn description(&self) -> &str {
        "Lists all available tools in this server with their parameters and features."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn call(&self, _args: Value) -> Result<Value, ToolError> {
        Ok(tool_catalog())
    }
}

/// Static discovery metadata returned by `list_available_tools`.
pub fn tool_catalog() -> Value {
    json!({
        "available_tools": [
            {
                "name": "get_weather",
                "description": "Fetches comprehensive weather data using OpenWeatherMap One Call API 3.0",
                "parameters": {
                    "location": "City name with optional country code (e.g., 'London,uk')"
                },
                "features": [
                    "Current weather conditions",
                    "Today's forecast with sunrise and sunset",
                    "3-day daily forecast",
                    "Weather alerts and warnings",
                    "UV index and visibility data"
                ]
            },
            {
                "name": "list_available_tools",
                "description": "Lists all available tools in this server",
                "parameters": "None",
                "features": ["Tool discovery", "API documentation"]
            }
        ],
        "server_info": {
            "name": SERVER_NAME,
            "api_version": API_VERSION,
            "total_tools": 2
        }
    })
}

/// Name-indexed set of tools, in registration order.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new(service: Arc<WeatherService>) -> Self {
        Self {
            tools: vec![Box::new(GetWeatherTool::new(service)), Box::new(ListToolsTool)],
        }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub async fn call(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        tracing::debug!(tool = name, "calling tool");
        tool.call(args).await
    }
}
