//! Request orchestrator
//!
//! Owns the agent registry and routes every inbound request: an explicit
//! workflow type delegates to the workflow engine, an explicit preferred
//! agent dispatches directly, and everything else goes through a fixed
//! keyword table. Routing is pure lookup over static data, so the same
//! message always selects the same target.

pub mod workflow;

use crate::agent::Agent;
use crate::error::{OrchestratorError, Result};
use crate::models::{AgentContext, RouteOutcome, WorkflowEvent, WorkflowKind};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};
use workflow::AgentRegistry;

/// One keyword-routing rule. Rules are checked in table order and the
/// first rule with any matching keyword wins.
pub struct RouteRule {
    pub keywords: &'static [&'static str],
    pub agent_id: &'static str,
    pub confidence: f64,
}

pub const ROUTING_TABLE: [RouteRule; 6] = [
    RouteRule {
        keywords: &["forecast", "predict", "projection", "trend", "future"],
        agent_id: "forecasting_agent",
        confidence: 0.9,
    },
    RouteRule {
        keywords: &["alert", "warning", "risk", "threshold", "monitor"],
        agent_id: "alert_agent",
        confidence: 0.9,
    },
    RouteRule {
        keywords: &["report", "summary", "brief", "dashboard", "analysis"],
        agent_id: "reporting_agent",
        confidence: 0.8,
    },
    RouteRule {
        keywords: &["ocr", "scan", "receipt", "invoice", "document"],
        agent_id: "ocr_agent",
        confidence: 0.9,
    },
    RouteRule {
        keywords: &["sync", "integration", "import", "export", "data"],
        agent_id: "data_sync_agent",
        confidence: 0.8,
    },
    RouteRule {
        keywords: &["reconcile", "match", "balance", "statement"],
        agent_id: "reconciliation_agent",
        confidence: 0.9,
    },
];

const DEFAULT_CONFIDENCE: f64 = 0.7;

/// Resolve a message to (agent_id, confidence) via the routing table
pub fn route_by_keywords<'a>(message: &str, default_agent: &'a str) -> (&'a str, f64) {
    let lower = message.to_lowercase();
    for rule in &ROUTING_TABLE {
        if rule.keywords.iter().any(|kw| lower.contains(kw)) {
            return (rule.agent_id, rule.confidence);
        }
    }
    (default_agent, DEFAULT_CONFIDENCE)
}

/// Decrements the active-agent counter on drop
struct ActiveGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct Orchestrator {
    agents: RwLock<AgentRegistry>,
    active: Arc<AtomicUsize>,
    max_concurrent: usize,
    default_agent: String,
}

impl Orchestrator {
    pub fn new(max_concurrent: usize, default_agent: impl Into<String>) -> Self {
        Self {
            agents: RwLock::new(AgentRegistry::new()),
            active: Arc::new(AtomicUsize::new(0)),
            max_concurrent,
            default_agent: default_agent.into(),
        }
    }

    pub async fn register_agent(&self, agent: Arc<dyn Agent>) {
        let id = agent.agent_id().to_string();
        let mut agents = self.agents.write().await;
        if agents.contains_key(&id) {
            warn!(agent_id = %id, "Agent already registered, overwriting");
        }
        info!(agent_id = %id, "Agent registered");
        agents.insert(id, agent);
    }

    pub async fn unregister_agent(&self, agent_id: &str) -> bool {
        let removed = self.agents.write().await.remove(agent_id).is_some();
        if removed {
            info!(agent_id = %agent_id, "Agent unregistered");
        }
        removed
    }

    pub async fn registered_agents(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.agents.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Registry and load snapshot for health reporting
    pub async fn status(&self) -> Value {
        json!({
            "registered_agents": self.registered_agents().await,
            "active_agents": self.active.load(Ordering::SeqCst),
            "max_concurrent_agents": self.max_concurrent,
            "available_workflows": [
                WorkflowKind::Advisory.to_string(),
                WorkflowKind::Transactional.to_string(),
            ],
        })
    }

    fn try_acquire(&self) -> Result<ActiveGuard> {
        let acquired = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                if current < self.max_concurrent {
                    Some(current + 1)
                } else {
                    None
                }
            })
            .is_ok();

        if acquired {
            Ok(ActiveGuard {
                counter: Arc::clone(&self.active),
            })
        } else {
            Err(OrchestratorError::ConcurrencyLimit)
        }
    }

    /// Route one request. Workflow type takes precedence over a preferred
    /// agent, which takes precedence over keyword routing. Routing failures
    /// come back as failure values, never as transport-level errors.
    pub async fn route_request(
        &self,
        message: &str,
        context: Option<AgentContext>,
        preferred_agent: Option<&str>,
        workflow: Option<WorkflowKind>,
    ) -> RouteOutcome {
        let mut context = context.unwrap_or_else(AgentContext::system);
        let session_id = context.session_id;

        let _guard = match self.try_acquire() {
            Ok(guard) => guard,
            Err(err) => {
                warn!(session_id = %session_id, "Request rejected at concurrency limit");
                return RouteOutcome::failure(err.to_string(), session_id);
            }
        };

        if let Some(kind) = workflow {
            let agents = self.agents.read().await.clone();
            return match workflow::execute(kind, message, &mut context, &agents).await {
                Ok(outcome) => RouteOutcome::Workflow(outcome),
                Err(err) => RouteOutcome::failure(err.to_string(), session_id),
            };
        }

        let (agent_id, confidence, method) = match preferred_agent {
            Some(id) => (id, 1.0, "preferred"),
            None => {
                let (id, confidence) = route_by_keywords(message, &self.default_agent);
                (id, confidence, "keyword")
            }
        };

        let Some(agent) = self.agents.read().await.get(agent_id).cloned() else {
            warn!(agent_id = %agent_id, session_id = %session_id, "Routed to unknown agent");
            return RouteOutcome::failure(
                OrchestratorError::AgentNotFound(agent_id.to_string()).to_string(),
                session_id,
            );
        };

        info!(
            agent_id = %agent_id,
            confidence = confidence,
            method = method,
            session_id = %session_id,
            "Request routed"
        );

        match agent.invoke(message, &mut context).await {
            Ok(mut response) => {
                response.metadata.insert(
                    "routing".to_string(),
                    json!({
                        "agent_id": agent_id,
                        "confidence": confidence,
                        "method": method,
                    }),
                );
                RouteOutcome::Agent(response)
            }
            Err(err) => RouteOutcome::failure(err.to_string(), session_id),
        }
    }

    /// Run a workflow in the background, delivering progress events on the
    /// returned channel.
    pub async fn stream_workflow(
        &self,
        kind: WorkflowKind,
        message: String,
        context: Option<AgentContext>,
    ) -> mpsc::Receiver<WorkflowEvent> {
        let (tx, rx) = mpsc::channel(32);
        let mut context = context.unwrap_or_else(AgentContext::system);

        let guard = match self.try_acquire() {
            Ok(guard) => guard,
            Err(err) => {
                let _ = tx
                    .send(WorkflowEvent::Error {
                        error: err.to_string(),
                        timestamp: chrono::Utc::now(),
                    })
                    .await;
                return rx;
            }
        };

        let agents = self.agents.read().await.clone();
        tokio::spawn(async move {
            let _guard = guard;
            workflow::stream(kind, &message, &mut context, &agents, tx).await;
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgentResponse;
    use serde_json::Map;
    use std::sync::atomic::AtomicUsize as TestCounter;

    struct CountingAgent {
        id: &'static str,
        calls: Arc<TestCounter>,
    }

    #[async_trait::async_trait]
    impl Agent for CountingAgent {
        fn agent_id(&self) -> &str {
            self.id
        }

        fn name(&self) -> &str {
            self.id
        }

        fn description(&self) -> &str {
            "counting stub"
        }

        async fn invoke(
            &self,
            message: &str,
            context: &mut AgentContext,
        ) -> Result<AgentResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
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

    async fn orchestrator_with(ids: &[&'static str]) -> (Orchestrator, Arc<TestCounter>) {
        let orchestrator = Orchestrator::new(10, "ai_cfo_agent");
        let calls = Arc::new(TestCounter::new(0));
        for &id in ids {
            orchestrator
                .register_agent(Arc::new(CountingAgent {
                    id,
                    calls: Arc::clone(&calls),
                }))
                .await;
        }
        (orchestrator, calls)
    }

    #[test]
    fn test_keyword_priority_order() {
        // "forecast" outranks "report" because its rule comes first
        let (agent, confidence) =
            route_by_keywords("forecast report for next quarter", "ai_cfo_agent");
        assert_eq!(agent, "forecasting_agent");
        assert!((confidence - 0.9).abs() < 1e-9);

        let (agent, _) = route_by_keywords("show me the dashboard", "ai_cfo_agent");
        assert_eq!(agent, "reporting_agent");

        let (agent, confidence) = route_by_keywords("hello there", "ai_cfo_agent");
        assert_eq!(agent, "ai_cfo_agent");
        assert!((confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_routing_is_deterministic() {
        let message = "scan this invoice and sync the data";
        let first = route_by_keywords(message, "ai_cfo_agent");
        for _ in 0..10 {
            assert_eq!(route_by_keywords(message, "ai_cfo_agent"), first);
        }
    }

    #[tokio::test]
    async fn test_unknown_preferred_agent_invokes_nothing() {
        let (orchestrator, calls) = orchestrator_with(&["ai_cfo_agent"]).await;
        let outcome = orchestrator
            .route_request("hello", None, Some("ghost_agent"), None)
            .await;

        assert!(!outcome.is_success());
        assert!(outcome.error().unwrap().contains("'ghost_agent' not found"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_keyword_routing_dispatches_to_agent() {
        let (orchestrator, calls) = orchestrator_with(&["forecasting_agent"]).await;
        let outcome = orchestrator
            .route_request("forecast revenue", None, None, None)
            .await;

        assert!(outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match outcome {
            RouteOutcome::Agent(response) => {
                assert_eq!(response.metadata["routing"]["agent_id"], "forecasting_agent");
                assert_eq!(response.metadata["routing"]["confidence"], 0.9);
            }
            other => panic!("expected agent outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrency_limit_rejects() {
        let orchestrator = Orchestrator::new(0, "ai_cfo_agent");
        let outcome = orchestrator.route_request("hello", None, None, None).await;

        assert!(!outcome.is_success());
        assert!(outcome.error().unwrap().contains("Maximum concurrent agents"));
    }

    #[tokio::test]
    async fn test_guard_releases_after_request() {
        let (orchestrator, _) = orchestrator_with(&["ai_cfo_agent"]).await;
        for _ in 0..3 {
            let outcome = orchestrator.route_request("hello", None, None, None).await;
            assert!(outcome.is_success());
        }
        let status = orchestrator.status().await;
        assert_eq!(status["active_agents"], 0);
    }

    #[tokio::test]
    async fn test_workflow_delegation_takes_precedence() {
        let (orchestrator, _) = orchestrator_with(&["ai_cfo_agent", "reporting_agent"]).await;
        let outcome = orchestrator
            .route_request(
                "analyze finances",
                None,
                Some("ai_cfo_agent"),
                Some(WorkflowKind::Advisory),
            )
            .await;

        match outcome {
            RouteOutcome::Workflow(workflow) => {
                assert!(workflow.success);
                assert_eq!(workflow.completed_steps, vec!["analysis", "reporting"]);
            }
            other => panic!("expected workflow outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unregister_agent() {
        let (orchestrator, calls) = orchestrator_with(&["ai_cfo_agent"]).await;
        assert!(orchestrator.unregister_agent("ai_cfo_agent").await);
        assert!(!orchestrator.unregister_agent("ai_cfo_agent").await);

        let outcome = orchestrator.route_request("hello", None, None, None).await;
        assert!(!outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
