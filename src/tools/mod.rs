//! Tool trait and hub
//!
//! Tools are stateless, deterministic calculators invoked by name. The hub
//! owns the name→tool mapping and provides the single invocation surface;
//! lookup failures and computation failures are returned as values, never
//! raised past the hub boundary.

pub mod financial;

use crate::models::AgentContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Uniform tool-invocation outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub data: Value,
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Execution time in seconds, stamped by the hub
    pub execution_time: f64,
    pub timestamp: DateTime<Utc>,
}

impl ToolResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
            metadata: Map::new(),
            execution_time: 0.0,
            timestamp: Utc::now(),
        }
    }

    pub fn ok_with_metadata(data: Value, metadata: Map<String, Value>) -> Self {
        Self {
            metadata,
            ..Self::ok(data)
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            error: Some(error.into()),
            metadata: Map::new(),
            execution_time: 0.0,
            timestamp: Utc::now(),
        }
    }
}

/// Descriptive schema returned by tool discovery
#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub category: String,
    pub version: String,
    pub parameters: Value,
}

/// Trait for a single tool (deterministic execution)
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;

    fn category(&self) -> &'static str {
        "general"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    /// JSON schema describing the expected parameters
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, parameters: &Value, context: Option<&AgentContext>) -> ToolResult;
}

/// Registry mapping tool names to implementations
pub struct ToolHub {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolHub {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool; an existing tool with the same name is overwritten
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            warn!(tool_name = %name, "Tool already registered, overwriting");
        }
        self.tools.insert(name, tool);
    }

    pub fn list_tools(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .values()
            .map(|tool| ToolSchema {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                category: tool.category().to_string(),
                version: tool.version().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Execute a tool by name, stamping execution time and logging the call
    pub async fn execute_tool(
        &self,
        name: &str,
        parameters: &Value,
        context: Option<&AgentContext>,
    ) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool_name = %name, "Tool not found in hub");
            return ToolResult::failure(format!("Tool '{}' not found", name));
        };

        let start = Instant::now();
        let mut result = tool.execute(parameters, context).await;
        result.execution_time = start.elapsed().as_secs_f64();
        result.timestamp = Utc::now();

        info!(
            tool_name = %name,
            success = result.success,
            duration_ms = start.elapsed().as_millis() as u64,
            "Tool executed"
        );

        result
    }
}

impl Default for ToolHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a hub with the financial calculator tools registered
pub fn create_default_hub() -> ToolHub {
    let mut hub = ToolHub::new();
    hub.register_tool(Arc::new(financial::RatioCalculatorTool));
    hub.register_tool(Arc::new(financial::CashFlowAnalyzerTool));
    hub.register_tool(Arc::new(financial::ProfitabilityAnalyzerTool));
    hub
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unknown_tool_is_failure_value() {
        let hub = create_default_hub();
        let result = hub.execute_tool("no_such_tool", &json!({}), None).await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_execute_stamps_timing() {
        let hub = create_default_hub();
        let params = json!({
            "ratio_type": "current_ratio",
            "financial_data": {"current_assets": 200000, "current_liabilities": 100000}
        });

        let result = hub.execute_tool("financial_ratio_calculator", &params, None).await;
        assert!(result.success);
        assert!(result.execution_time >= 0.0);
    }

    #[test]
    fn test_list_tools_exposes_schemas() {
        let hub = create_default_hub();
        let schemas = hub.list_tools();

        assert_eq!(schemas.len(), 3);
        let names: Vec<_> = schemas.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"financial_ratio_calculator"));
        assert!(names.contains(&"cash_flow_analyzer"));
        assert!(names.contains(&"profitability_analyzer"));
        for schema in &schemas {
            assert_eq!(schema.category, "financial_analysis");
            assert!(schema.parameters.is_object());
        }
    }

    #[test]
    fn test_duplicate_registration_overwrites() {
        let mut hub = ToolHub::new();
        hub.register_tool(Arc::new(financial::RatioCalculatorTool));
        hub.register_tool(Arc::new(financial::RatioCalculatorTool));
        assert_eq!(hub.list_tools().len(), 1);
    }
}
