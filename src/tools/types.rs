// Core types for the tool dispatch boundary
//
// Compatible with the Claude API tool use format

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition as advertised to the upstream engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

/// JSON Schema for tool input parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String, // Always "object"
    pub properties: Value,
    pub required: Vec<String>,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

/// One tool invocation request from the upstream engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub call_id: String,   // Opaque correlation token, format: toolu_[random]
    pub tool_name: String, // Must match a catalog entry
    pub arguments: Value,  // Loosely-typed argument bag (JSON object)
}

impl ToolCallRequest {
    /// Generate a unique call ID
    pub fn generate_id() -> String {
        use rand::Rng;
        let random: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();
        format!("toolu_{}", random)
    }

    pub fn new(tool_name: String, arguments: Value) -> Self {
        Self {
            call_id: Self::generate_id(),
            tool_name,
            arguments,
        }
    }
}

/// One tool invocation result, correlated by call ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub call_id: String, // Echoes the request
    pub output: String,  // Success payload or "Error: "-prefixed failure
}

impl ToolCallResult {
    pub fn new(call_id: String, output: String) -> Self {
        Self { call_id, output }
    }

    /// Whether the payload carries the failure marker
    pub fn is_error(&self) -> bool {
        self.output.starts_with("Error: ")
    }
}
