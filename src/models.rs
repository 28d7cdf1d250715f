//! Core data models for the multi-agent financial platform

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowKind {
    Advisory,
    Transactional,
}

impl FromStr for WorkflowKind {
    type Err = crate::error::OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "advisory" => Ok(WorkflowKind::Advisory),
            "transactional" => Ok(WorkflowKind::Transactional),
            other => Err(crate::error::OrchestratorError::UnknownWorkflow(
                other.to_string(),
            )),
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowKind::Advisory => "advisory",
            WorkflowKind::Transactional => "transactional",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        };
        write!(f, "{}", s)
    }
}

//
// ================= Messages =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

//
// ================= Context =================
//

/// Per-request identity and session carrier, threaded through every call.
///
/// `agent_id` tracks the currently executing agent and is overwritten as
/// control passes between agents within a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContext {
    pub agent_id: String,
    pub session_id: Uuid,
    pub user_id: String,
    pub company_id: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub trace_id: Uuid,
    #[serde(default)]
    pub state: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl AgentContext {
    pub fn new(
        agent_id: impl Into<String>,
        user_id: impl Into<String>,
        company_id: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            session_id: Uuid::new_v4(),
            user_id: user_id.into(),
            company_id: company_id.into(),
            permissions: Vec::new(),
            trace_id: Uuid::new_v4(),
            state: Map::new(),
            created_at: Utc::now(),
        }
    }

    /// Context created when the caller supplies none
    pub fn system() -> Self {
        Self::new("orchestrator", "system", "default")
    }
}

//
// ================= Agent State =================
//

/// Per-invocation execution accumulator for an agent pipeline.
///
/// Each pipeline stage writes one metadata key and appends its name to
/// `completed_steps`, so the step list always grows in pipeline order.
#[derive(Debug, Clone, Serialize)]
pub struct AgentState {
    pub messages: Vec<Message>,
    pub context: AgentContext,
    pub metadata: Map<String, Value>,
    pub completed_steps: Vec<String>,
    pub current_step: String,
    pub error: Option<String>,
}

impl AgentState {
    pub fn new(message: impl Into<String>, context: AgentContext) -> Self {
        Self {
            messages: vec![Message::user(message)],
            context,
            metadata: Map::new(),
            completed_steps: Vec::new(),
            current_step: "start".to_string(),
            error: None,
        }
    }

    /// Most recent user message, empty if none
    pub fn user_message(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    /// Record a finished stage: stash its output and advance the step cursor
    pub fn complete_stage(&mut self, step: &str, key: &str, output: Value, next: &str) {
        self.metadata.insert(key.to_string(), output);
        self.completed_steps.push(step.to_string());
        self.current_step = next.to_string();
    }
}

//
// ================= Responses =================
//

/// Final response from one agent invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub agent_id: String,
    pub session_id: Uuid,
    pub response: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub completed_steps: Vec<String>,
    pub error: Option<String>,
}

//
// ================= Workflow State =================
//

/// Execution record for one workflow run. Results are keyed by step name
/// in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowState {
    pub workflow_id: Uuid,
    pub workflow_type: WorkflowKind,
    pub current_step: String,
    pub steps_completed: Vec<String>,
    pub results: Map<String, Value>,
    pub status: WorkflowStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowState {
    pub fn new(workflow_type: WorkflowKind) -> Self {
        let now = Utc::now();
        Self {
            workflow_id: Uuid::new_v4(),
            workflow_type,
            current_step: "start".to_string(),
            steps_completed: Vec::new(),
            results: Map::new(),
            status: WorkflowStatus::Pending,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn complete_step(&mut self, step: &str, result: Value) {
        self.results.insert(step.to_string(), result);
        self.steps_completed.push(step.to_string());
        self.updated_at = Utc::now();
    }

    pub fn set_status(&mut self, status: WorkflowStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.status = WorkflowStatus::Failed;
        self.updated_at = Utc::now();
    }
}

/// Aggregated result of a workflow execution, returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowOutcome {
    pub success: bool,
    pub workflow_type: WorkflowKind,
    pub workflow_id: Uuid,
    pub results: Map<String, Value>,
    pub completed_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Incremental update yielded while streaming a workflow
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    WorkflowStarted {
        workflow_id: Uuid,
        workflow_type: WorkflowKind,
        timestamp: DateTime<Utc>,
    },
    StepStarted {
        step: String,
        workflow_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    StepCompleted {
        step: String,
        workflow_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    StepSkipped {
        step: String,
        agent_id: String,
        workflow_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    WorkflowCompleted {
        workflow_id: Uuid,
        status: WorkflowStatus,
        completed_steps: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    Error {
        error: String,
        timestamp: DateTime<Utc>,
    },
}

//
// ================= Routing =================
//

/// Result of routing one inbound request
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RouteOutcome {
    Agent(AgentResponse),
    Workflow(WorkflowOutcome),
    Failure {
        success: bool,
        error: String,
        session_id: Uuid,
    },
}

impl RouteOutcome {
    pub fn failure(error: impl Into<String>, session_id: Uuid) -> Self {
        RouteOutcome::Failure {
            success: false,
            error: error.into(),
            session_id,
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            RouteOutcome::Agent(r) => r.error.is_none(),
            RouteOutcome::Workflow(w) => w.success,
            RouteOutcome::Failure { .. } => false,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RouteOutcome::Agent(r) => r.error.as_deref(),
            RouteOutcome::Workflow(w) => w.error.as_deref(),
            RouteOutcome::Failure { error, .. } => Some(error.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_kind_parsing() {
        assert_eq!(
            "advisory".parse::<WorkflowKind>().unwrap(),
            WorkflowKind::Advisory
        );
        assert_eq!(
            "Transactional".parse::<WorkflowKind>().unwrap(),
            WorkflowKind::Transactional
        );
        assert!("batch".parse::<WorkflowKind>().is_err());
    }

    #[test]
    fn test_agent_state_stage_accounting() {
        let mut state = AgentState::new("analyze my cash flow", AgentContext::system());
        assert_eq!(state.user_message(), "analyze my cash flow");

        state.complete_stage(
            "analyze_request",
            "analysis_plan",
            serde_json::json!({"analysis_types": ["Cash Flow Analysis"]}),
            "gather_data",
        );

        assert_eq!(state.completed_steps, vec!["analyze_request"]);
        assert_eq!(state.current_step, "gather_data");
        assert!(state.metadata.contains_key("analysis_plan"));
    }

    #[test]
    fn test_workflow_state_ordering() {
        let mut wf = WorkflowState::new(WorkflowKind::Advisory);
        wf.set_status(WorkflowStatus::Processing);
        wf.complete_step("data_sync", serde_json::json!({"ok": true}));
        wf.complete_step("analysis", serde_json::json!({"ok": true}));

        assert_eq!(wf.steps_completed, vec!["data_sync", "analysis"]);
        // preserve_order keeps the results map in execution order
        let keys: Vec<_> = wf.results.keys().cloned().collect();
        assert_eq!(keys, vec!["data_sync", "analysis"]);
    }
}
