//! Agent abstraction
//!
//! Every agent the orchestrator can route to implements [`Agent`]. The trait
//! is deliberately small: one async entry point that takes the caller's
//! message plus a mutable context and produces a structured response.

pub mod cfo;

use crate::error::Result;
use crate::models::{AgentContext, AgentResponse};

#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    /// Stable identifier used for routing and registry lookups.
    fn agent_id(&self) -> &str;

    /// Human-readable name for listings.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Process a request end to end. Implementations record progress in the
    /// context state so callers can inspect intermediate results afterwards.
    async fn invoke(&self, message: &str, context: &mut AgentContext) -> Result<AgentResponse>;
}
