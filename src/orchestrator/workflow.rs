//! Workflow engine
//!
//! Workflows are fixed, ordered step sequences defined as static data. Each
//! step names the agent that runs it and the message it receives. Steps
//! whose agent is not registered are skipped and the sequence continues, so
//! a partially populated registry still yields a useful partial result.

use crate::agent::Agent;
use crate::error::Result;
use crate::models::{
    AgentContext, WorkflowEvent, WorkflowKind, WorkflowOutcome, WorkflowState, WorkflowStatus,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Message a workflow step hands to its agent
#[derive(Debug, Clone, Copy)]
pub enum StepMessage {
    /// Forward the caller's original request text
    Forward,
    /// Fixed instruction independent of the caller's request
    Fixed(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct StepDef {
    pub name: &'static str,
    pub agent_id: &'static str,
    pub message: StepMessage,
}

const ADVISORY_STEPS: [StepDef; 5] = [
    StepDef {
        name: "data_sync",
        agent_id: "data_sync_agent",
        message: StepMessage::Fixed("Sync latest financial data for analysis"),
    },
    StepDef {
        name: "analysis",
        agent_id: "ai_cfo_agent",
        message: StepMessage::Forward,
    },
    StepDef {
        name: "forecasting",
        agent_id: "forecasting_agent",
        message: StepMessage::Fixed("Generate financial forecasts based on current data"),
    },
    StepDef {
        name: "alerts",
        agent_id: "alert_agent",
        message: StepMessage::Fixed("Check for financial risks and opportunities"),
    },
    StepDef {
        name: "reporting",
        agent_id: "reporting_agent",
        message: StepMessage::Fixed("Generate executive financial report"),
    },
];

const TRANSACTIONAL_STEPS: [StepDef; 5] = [
    StepDef {
        name: "ocr_processing",
        agent_id: "ocr_agent",
        message: StepMessage::Forward,
    },
    StepDef {
        name: "standardization",
        agent_id: "data_sync_agent",
        message: StepMessage::Fixed("Standardize and validate processed data"),
    },
    StepDef {
        name: "accounting",
        agent_id: "accounting_agent",
        message: StepMessage::Fixed("Create accounting entries from processed data"),
    },
    StepDef {
        name: "reconciliation",
        agent_id: "reconciliation_agent",
        message: StepMessage::Fixed("Reconcile transactions with bank statements"),
    },
    StepDef {
        name: "compliance",
        agent_id: "compliance_agent",
        message: StepMessage::Fixed("Validate compliance and create audit trail"),
    },
];

pub fn steps_for(kind: WorkflowKind) -> &'static [StepDef] {
    match kind {
        WorkflowKind::Advisory => &ADVISORY_STEPS,
        WorkflowKind::Transactional => &TRANSACTIONAL_STEPS,
    }
}

pub type AgentRegistry = HashMap<String, Arc<dyn Agent>>;

/// Run a workflow to completion, returning the aggregated outcome.
///
/// A step whose agent fails marks the workflow failed and stops the
/// sequence; earlier step results are kept in the outcome.
pub async fn execute(
    kind: WorkflowKind,
    message: &str,
    context: &mut AgentContext,
    agents: &AgentRegistry,
) -> Result<WorkflowOutcome> {
    let mut state = WorkflowState::new(kind);
    state.set_status(WorkflowStatus::Processing);
    info!(
        workflow_id = %state.workflow_id,
        workflow_type = %kind,
        "Workflow started"
    );

    for step in steps_for(kind) {
        let Some(agent) = agents.get(step.agent_id) else {
            warn!(
                workflow_id = %state.workflow_id,
                step = step.name,
                agent_id = step.agent_id,
                "Agent not registered, skipping step"
            );
            continue;
        };

        state.current_step = step.name.to_string();
        let step_message = match step.message {
            StepMessage::Forward => message,
            StepMessage::Fixed(text) => text,
        };

        match agent.invoke(step_message, context).await {
            Ok(response) => {
                state.complete_step(step.name, serde_json::to_value(&response)?);
            }
            Err(err) => {
                state.set_error(err.to_string());
                warn!(
                    workflow_id = %state.workflow_id,
                    step = step.name,
                    error = %err,
                    "Workflow step failed"
                );
                break;
            }
        }
    }

    if state.status != WorkflowStatus::Failed {
        state.set_status(WorkflowStatus::Completed);
    }
    info!(
        workflow_id = %state.workflow_id,
        workflow_type = %kind,
        status = ?state.status,
        steps = state.steps_completed.len(),
        "Workflow finished"
    );

    Ok(WorkflowOutcome {
        success: state.status == WorkflowStatus::Completed,
        workflow_type: kind,
        workflow_id: state.workflow_id,
        results: state.results,
        completed_steps: state.steps_completed,
        error: state.error,
    })
}

/// Run a workflow while emitting progress events on the channel.
///
/// Stops early if the receiver is dropped. Skipped steps are reported as
/// events so streaming clients can see the gap.
pub async fn stream(
    kind: WorkflowKind,
    message: &str,
    context: &mut AgentContext,
    agents: &AgentRegistry,
    tx: mpsc::Sender<WorkflowEvent>,
) {
    let mut state = WorkflowState::new(kind);
    state.set_status(WorkflowStatus::Processing);

    if tx
        .send(WorkflowEvent::WorkflowStarted {
            workflow_id: state.workflow_id,
            workflow_type: kind,
            timestamp: Utc::now(),
        })
        .await
        .is_err()
    {
        return;
    }

    for step in steps_for(kind) {
        let Some(agent) = agents.get(step.agent_id) else {
            let event = WorkflowEvent::StepSkipped {
                step: step.name.to_string(),
                agent_id: step.agent_id.to_string(),
                workflow_id: state.workflow_id,
                timestamp: Utc::now(),
            };
            if tx.send(event).await.is_err() {
                return;
            }
            continue;
        };

        state.current_step = step.name.to_string();
        let started = WorkflowEvent::StepStarted {
            step: step.name.to_string(),
            workflow_id: state.workflow_id,
            timestamp: Utc::now(),
        };
        if tx.send(started).await.is_err() {
            return;
        }

        let step_message = match step.message {
            StepMessage::Forward => message,
            StepMessage::Fixed(text) => text,
        };

        match agent.invoke(step_message, context).await {
            Ok(response) => {
                let value = serde_json::to_value(&response).unwrap_or_default();
                state.complete_step(step.name, value);
                let completed = WorkflowEvent::StepCompleted {
                    step: step.name.to_string(),
                    workflow_id: state.workflow_id,
                    timestamp: Utc::now(),
                };
                if tx.send(completed).await.is_err() {
                    return;
                }
            }
            Err(err) => {
                state.set_error(err.to_string());
                let _ = tx
                    .send(WorkflowEvent::Error {
                        error: err.to_string(),
                        timestamp: Utc::now(),
                    })
                    .await;
                break;
            }
        }
    }

    if state.status != WorkflowStatus::Failed {
        state.set_status(WorkflowStatus::Completed);
    }
    let _ = tx
        .send(WorkflowEvent::WorkflowCompleted {
            workflow_id: state.workflow_id,
            status: state.status,
            completed_steps: state.steps_completed,
            timestamp: Utc::now(),
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgentResponse;
    use serde_json::Map;

    struct EchoAgent {
        id: &'static str,
    }

    #[async_trait::async_trait]
    impl Agent for EchoAgent {
        fn agent_id(&self) -> &str {
            self.id
        }

        fn name(&self) -> &str {
            self.id
        }

        fn description(&self) -> &str {
            "echo"
        }

        async fn invoke(
            &self,
            message: &str,
            context: &mut AgentContext,
        ) -> Result<AgentResponse> {
            context.agent_id = self.id.to_string();
            Ok(AgentResponse {
                agent_id: self.id.to_string(),
                session_id: context.session_id,
                response: message.to_string(),
                metadata: Map::new(),
                completed_steps: vec![],
                error: None,
            })
        }
    }

    struct FailingAgent;

    #[async_trait::async_trait]
    impl Agent for FailingAgent {
        fn agent_id(&self) -> &str {
            "ai_cfo_agent"
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        async fn invoke(&self, _: &str, _: &mut AgentContext) -> Result<AgentResponse> {
            Err(crate::error::OrchestratorError::AgentError(
                "boom".to_string(),
            ))
        }
    }

    fn registry(ids: &[&'static str]) -> AgentRegistry {
        ids.iter()
            .map(|&id| {
                (
                    id.to_string(),
                    Arc::new(EchoAgent { id }) as Arc<dyn Agent>,
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_unregistered_agents_are_skipped() {
        let agents = registry(&["ai_cfo_agent", "reporting_agent"]);
        let mut context = AgentContext::system();

        let outcome = execute(WorkflowKind::Advisory, "analyze", &mut context, &agents)
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.completed_steps, vec!["analysis", "reporting"]);
        assert_eq!(outcome.results.len(), 2);
    }

    #[tokio::test]
    async fn test_completed_steps_follow_definition_order() {
        let agents = registry(&[
            "data_sync_agent",
            "ai_cfo_agent",
            "forecasting_agent",
            "alert_agent",
            "reporting_agent",
        ]);
        let mut context = AgentContext::system();

        let outcome = execute(WorkflowKind::Advisory, "analyze", &mut context, &agents)
            .await
            .unwrap();

        let expected: Vec<&str> = steps_for(WorkflowKind::Advisory)
            .iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(outcome.completed_steps, expected);
        // results map iterates in execution order
        let keys: Vec<_> = outcome.results.keys().cloned().collect();
        assert_eq!(keys, expected);
    }

    #[tokio::test]
    async fn test_forwarded_and_fixed_messages() {
        let agents = registry(&["ai_cfo_agent", "data_sync_agent"]);
        let mut context = AgentContext::system();

        let outcome = execute(WorkflowKind::Advisory, "my question", &mut context, &agents)
            .await
            .unwrap();

        assert_eq!(outcome.results["analysis"]["response"], "my question");
        assert_eq!(
            outcome.results["data_sync"]["response"],
            "Sync latest financial data for analysis"
        );
    }

    #[tokio::test]
    async fn test_step_failure_stops_workflow() {
        let mut agents = registry(&["data_sync_agent", "reporting_agent"]);
        agents.insert(
            "ai_cfo_agent".to_string(),
            Arc::new(FailingAgent) as Arc<dyn Agent>,
        );
        let mut context = AgentContext::system();

        let outcome = execute(WorkflowKind::Advisory, "analyze", &mut context, &agents)
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.completed_steps, vec!["data_sync"]);
        assert!(outcome.error.as_deref().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_stream_event_ordering() {
        let agents = registry(&["ai_cfo_agent", "reporting_agent"]);
        let mut context = AgentContext::system();
        let (tx, mut rx) = mpsc::channel(32);

        stream(WorkflowKind::Advisory, "analyze", &mut context, &agents, tx).await;

        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            kinds.push(match event {
                WorkflowEvent::WorkflowStarted { .. } => "started",
                WorkflowEvent::StepStarted { .. } => "step_started",
                WorkflowEvent::StepCompleted { .. } => "step_completed",
                WorkflowEvent::StepSkipped { .. } => "step_skipped",
                WorkflowEvent::WorkflowCompleted { .. } => "completed",
                WorkflowEvent::Error { .. } => "error",
            });
        }

        assert_eq!(
            kinds,
            vec![
                "started",
                "step_skipped",
                "step_started",
                "step_completed",
                "step_skipped",
                "step_skipped",
                "step_started",
                "step_completed",
                "completed",
            ]
        );
    }
}
