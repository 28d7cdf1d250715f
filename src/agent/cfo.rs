//! AI CFO agent
//!
//! Seven-stage analysis pipeline: classify the request, pull a financial
//! snapshot, run the calculator tools, then layer narrative insights, a
//! risk assessment, and recommendations on top before rendering a markdown
//! report. Every stage writes its output into the agent state before the
//! next stage reads it, so each stage only ever sees finished values.

use crate::agent::Agent;
use crate::data::{DataSource, FinancialSnapshot};
use crate::error::{OrchestratorError, Result};
use crate::llm::LlmClient;
use crate::models::{AgentContext, AgentResponse, AgentState, Message, RiskLevel};
use crate::tools::ToolHub;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

pub const CFO_AGENT_ID: &str = "ai_cfo_agent";

const RATIO_TYPES: [&str; 8] = [
    "current_ratio",
    "quick_ratio",
    "debt_to_equity",
    "return_on_equity",
    "return_on_assets",
    "gross_margin",
    "net_margin",
    "asset_turnover",
];

pub struct CfoAgent {
    hub: Arc<ToolHub>,
    llm: Arc<dyn LlmClient>,
    data: Arc<dyn DataSource>,
    industry: String,
}

impl CfoAgent {
    pub fn new(
        hub: Arc<ToolHub>,
        llm: Arc<dyn LlmClient>,
        data: Arc<dyn DataSource>,
        industry: impl Into<String>,
    ) -> Self {
        Self {
            hub,
            llm,
            data,
            industry: industry.into(),
        }
    }

    /// Stage 1: classify the request into analysis types
    fn analyze_request(&self, state: &mut AgentState) {
        let message = state.user_message().to_lowercase();
        let mut analysis_types = Vec::new();

        if message.contains("cash flow") || message.contains("cashflow") {
            analysis_types.push("cash_flow_analysis");
        }
        if message.contains("profit") || message.contains("margin") {
            analysis_types.push("profitability_analysis");
        }
        if message.contains("risk") {
            analysis_types.push("risk_assessment");
        }
        if message.contains("forecast") || message.contains("budget") {
            analysis_types.push("financial_forecasting");
        }
        if analysis_types.is_empty() {
            analysis_types.push("comprehensive_analysis");
        }

        let plan = json!({
            "request": state.user_message(),
            "analysis_types": analysis_types,
            "industry": self.industry,
            "priority": "high",
        });
        state.complete_stage("analyze_request", "analysis_plan", plan, "gather_data");
    }

    /// Stage 2: fetch the company's financial snapshot
    async fn gather_data(&self, state: &mut AgentState) -> Result<()> {
        let snapshot = self.data.fetch(&state.context.company_id).await?;
        state.complete_stage(
            "gather_data",
            "financial_data",
            serde_json::to_value(&snapshot)?,
            "perform_analysis",
        );
        Ok(())
    }

    /// Stage 3: run the calculator tools over the snapshot
    async fn perform_analysis(&self, state: &mut AgentState) -> Result<()> {
        let snapshot = self.snapshot_from_state(state)?;
        let financial_data = json!({
            "current_assets": snapshot.current_assets,
            "current_liabilities": snapshot.current_liabilities,
            "inventory": snapshot.inventory,
            "accounts_receivable": snapshot.accounts_receivable,
            "total_assets": snapshot.total_assets,
            "total_debt": snapshot.total_debt,
            "total_equity": snapshot.total_equity,
            "net_income": snapshot.net_income,
            "revenue": snapshot.revenue,
            "cost_of_goods_sold": snapshot.cost_of_goods_sold,
            "operating_expenses": snapshot.operating_expenses,
        });

        let mut ratios = Map::new();
        for ratio_type in RATIO_TYPES {
            let params = json!({"ratio_type": ratio_type, "financial_data": &financial_data});
            let result = self
                .hub
                .execute_tool("financial_ratio_calculator", &params, Some(&state.context))
                .await;
            // Undefined ratios (zero denominators) are recorded, not fatal
            let entry = if result.success {
                result.data
            } else {
                json!({"error": result.error})
            };
            ratios.insert(ratio_type.to_string(), entry);
        }

        let cash_flows: Vec<Value> = snapshot
            .monthly_net_cash_flows
            .iter()
            .map(|flow| json!({"net_cash_flow": flow}))
            .collect();
        let cash_flow = self
            .hub
            .execute_tool(
                "cash_flow_analyzer",
                &json!({"cash_flows": cash_flows, "analysis_type": "comprehensive"}),
                Some(&state.context),
            )
            .await;

        let profitability = self
            .hub
            .execute_tool(
                "profitability_analyzer",
                &json!({"financial_data": &financial_data, "analysis_type": "comprehensive"}),
                Some(&state.context),
            )
            .await;

        let benchmarks = crate::config::benchmarks_for(&self.industry);
        let ratio_of = |name: &str| {
            ratios
                .get(name)
                .and_then(|entry| entry.get("ratio"))
                .and_then(Value::as_f64)
        };
        let compare = |actual: Option<f64>, target: f64, higher_is_better: bool| {
            actual.map(|value| {
                let meets_target = if higher_is_better {
                    value >= target
                } else {
                    value <= target
                };
                json!({"actual": value, "target": target, "meets_target": meets_target})
            })
        };
        let benchmark_comparison = json!({
            "industry": benchmarks.industry,
            "current_ratio": compare(ratio_of("current_ratio"), benchmarks.current_ratio, true),
            "gross_margin": compare(ratio_of("gross_margin"), benchmarks.gross_margin, true),
            "net_margin": compare(ratio_of("net_margin"), benchmarks.net_margin, true),
            "debt_to_equity": compare(ratio_of("debt_to_equity"), benchmarks.debt_to_equity, false),
        });

        let cash_flow_value = if cash_flow.success {
            cash_flow.data
        } else {
            json!({"error": cash_flow.error})
        };
        let profitability_value = if profitability.success {
            profitability.data
        } else {
            json!({"error": profitability.error})
        };

        let results = json!({
            "ratios": ratios,
            "cash_flow": cash_flow_value,
            "profitability": profitability_value,
            "benchmark_comparison": benchmark_comparison,
        });
        state.complete_stage(
            "perform_analysis",
            "analysis_results",
            results,
            "generate_insights",
        );
        Ok(())
    }

    /// Stage 4: narrative insights over the computed metrics
    async fn generate_insights(&self, state: &mut AgentState) -> Result<()> {
        let prompt = format!(
            "Provide key financial insights for this analysis: {}",
            self.metrics_summary(state)
        );
        let narrative = self.llm.generate(&prompt).await?;

        let insights = json!({
            "summary": narrative,
            "key_metrics": self.key_metric_lines(state),
        });
        state.complete_stage("generate_insights", "insights", insights, "assess_risks");
        Ok(())
    }

    /// Stage 5: classify risk across five fixed categories
    async fn assess_risks(&self, state: &mut AgentState) -> Result<()> {
        let liquidity = match self.ratio_value(state, "current_ratio") {
            Some(r) if r < 1.0 => RiskLevel::High,
            Some(r) if r < 1.5 => RiskLevel::Medium,
            Some(_) => RiskLevel::Low,
            None => RiskLevel::Medium,
        };
        let credit = match self.ratio_value(state, "debt_to_equity") {
            Some(r) if r > 1.0 => RiskLevel::High,
            Some(r) if r > 0.6 => RiskLevel::Medium,
            Some(_) => RiskLevel::Low,
            None => RiskLevel::Medium,
        };
        let operational = match self.ratio_value(state, "net_margin") {
            Some(r) if r < 0.05 => RiskLevel::High,
            Some(r) if r < 0.10 => RiskLevel::Medium,
            Some(_) => RiskLevel::Low,
            None => RiskLevel::Medium,
        };
        let market = match self.volatility_level(state) {
            Some("High") => RiskLevel::High,
            Some("Moderate") => RiskLevel::Medium,
            _ => RiskLevel::Low,
        };
        let compliance = RiskLevel::Low;

        let levels = [liquidity, credit, operational, market, compliance];
        let overall = levels
            .iter()
            .copied()
            .max_by_key(|level| match level {
                RiskLevel::Low => 0,
                RiskLevel::Medium => 1,
                RiskLevel::High => 2,
                RiskLevel::Critical => 3,
            })
            .unwrap_or(RiskLevel::Low);

        let prompt = format!(
            "Summarize the main financial risk areas given overall risk level {}",
            overall
        );
        let narrative = self.llm.generate(&prompt).await?;

        let category = |severity: RiskLevel, mitigation: &str| {
            json!({"severity": severity, "mitigation": mitigation})
        };
        let assessment = json!({
            "categories": {
                "liquidity": category(liquidity, "Maintain working capital above short-term obligations"),
                "credit": category(credit, "Keep leverage within industry norms and monitor covenants"),
                "operational": category(operational, "Track margin trends and control operating costs"),
                "market": category(market, "Smooth cash-flow volatility with reserves or credit lines"),
                "compliance": category(compliance, "Keep reporting and audit trails current"),
            },
            "overall_risk_level": overall,
            "narrative": narrative,
        });
        state.complete_stage(
            "assess_risks",
            "risk_assessment",
            assessment,
            "provide_recommendations",
        );
        Ok(())
    }

    /// Stage 6: bucket recommendations by time horizon
    async fn provide_recommendations(&self, state: &mut AgentState) -> Result<()> {
        let mut immediate: Vec<String> = Vec::new();
        let mut short_term: Vec<String> = Vec::new();
        let mut long_term: Vec<String> = Vec::new();

        if let Some(current_ratio) = self.ratio_value(state, "current_ratio") {
            if current_ratio < 1.0 {
                immediate.push("Improve working capital position to cover current liabilities".to_string());
            } else if current_ratio > 3.0 {
                short_term.push("Deploy excess liquidity into productive investments".to_string());
            }
        }
        if let Some(debt_to_equity) = self.ratio_value(state, "debt_to_equity") {
            if debt_to_equity > 1.0 {
                immediate.push("Reduce debt load to lower financial risk".to_string());
            } else if debt_to_equity > 0.6 {
                short_term.push("Review debt structure and refinancing options".to_string());
            }
        }
        if let Some(net_margin) = self.ratio_value(state, "net_margin") {
            if net_margin < 0.05 {
                short_term.push("Review cost structure to improve net margin".to_string());
            }
        }
        if immediate.is_empty() && short_term.is_empty() {
            short_term.push("Maintain current financial discipline".to_string());
        }
        long_term.push("Invest in growth initiatives aligned with cash generation".to_string());

        let prompt = format!(
            "Recommend next financial actions given: {}",
            self.metrics_summary(state)
        );
        let narrative = self.llm.generate(&prompt).await?;

        let recommendations = json!({
            "immediate": immediate,
            "short_term": short_term,
            "long_term": long_term,
            "narrative": narrative,
        });
        state.complete_stage(
            "provide_recommendations",
            "recommendations",
            recommendations,
            "format_response",
        );
        Ok(())
    }

    /// Stage 7: render the final markdown report
    fn format_response(&self, state: &mut AgentState) -> Result<()> {
        let insights = state.metadata.get("insights").cloned().unwrap_or(Value::Null);
        let risks = state
            .metadata
            .get("risk_assessment")
            .cloned()
            .unwrap_or(Value::Null);
        let recommendations = state
            .metadata
            .get("recommendations")
            .cloned()
            .unwrap_or(Value::Null);

        let mut report = String::from("# AI CFO Financial Analysis Report\n\n");

        report.push_str("## Executive Summary\n");
        if let Some(summary) = insights.get("summary").and_then(Value::as_str) {
            report.push_str(summary);
            report.push('\n');
        }
        report.push('\n');

        report.push_str("## Key Financial Ratios\n");
        for line in self.key_metric_lines(state) {
            report.push_str("- ");
            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');

        report.push_str("## Risk Assessment\n");
        if let Some(overall) = risks.get("overall_risk_level").and_then(Value::as_str) {
            report.push_str(&format!("Overall risk level: {}\n", overall));
        }
        if let Some(narrative) = risks.get("narrative").and_then(Value::as_str) {
            report.push_str(narrative);
            report.push('\n');
        }
        report.push('\n');

        report.push_str("## Recommendations\n");
        for (heading, key) in [
            ("Immediate", "immediate"),
            ("Short term", "short_term"),
            ("Long term", "long_term"),
        ] {
            if let Some(items) = recommendations.get(key).and_then(Value::as_array) {
                if items.is_empty() {
                    continue;
                }
                report.push_str(&format!("### {}\n", heading));
                for item in items {
                    if let Some(text) = item.as_str() {
                        report.push_str("- ");
                        report.push_str(text);
                        report.push('\n');
                    }
                }
            }
        }

        state.messages.push(Message::assistant(report.clone()));
        state.complete_stage("format_response", "final_report", json!(report), "done");
        Ok(())
    }

    fn snapshot_from_state(&self, state: &AgentState) -> Result<FinancialSnapshot> {
        let data = state
            .metadata
            .get("financial_data")
            .cloned()
            .ok_or_else(|| {
                OrchestratorError::AgentError("Financial data not gathered yet".to_string())
            })?;
        Ok(serde_json::from_value(data)?)
    }

    fn ratio_value(&self, state: &AgentState, ratio_type: &str) -> Option<f64> {
        state
            .metadata
            .get("analysis_results")?
            .get("ratios")?
            .get(ratio_type)?
            .get("ratio")?
            .as_f64()
    }

    fn volatility_level<'a>(&self, state: &'a AgentState) -> Option<&'a str> {
        state
            .metadata
            .get("analysis_results")?
            .get("cash_flow")?
            .get("volatility_analysis")?
            .get("volatility_level")?
            .as_str()
    }

    fn key_metric_lines(&self, state: &AgentState) -> Vec<String> {
        RATIO_TYPES
            .iter()
            .filter_map(|ratio_type| {
                let entry = state
                    .metadata
                    .get("analysis_results")?
                    .get("ratios")?
                    .get(*ratio_type)?;
                let value = entry.get("ratio")?.as_f64()?;
                let interpretation = entry
                    .get("interpretation")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                Some(format!("{}: {:.2} ({})", ratio_type, value, interpretation))
            })
            .collect()
    }

    fn metrics_summary(&self, state: &AgentState) -> String {
        self.key_metric_lines(state).join("; ")
    }
}

#[async_trait::async_trait]
impl Agent for CfoAgent {
    fn agent_id(&self) -> &str {
        CFO_AGENT_ID
    }

    fn name(&self) -> &str {
        "AI CFO"
    }

    fn description(&self) -> &str {
        "Financial analysis, ratio interpretation, risk assessment, and recommendations"
    }

    async fn invoke(&self, message: &str, context: &mut AgentContext) -> Result<AgentResponse> {
        let start = Instant::now();
        context.agent_id = self.agent_id().to_string();
        let mut state = AgentState::new(message, context.clone());
        info!(
            agent_id = %self.agent_id(),
            session_id = %context.session_id,
            "AI CFO analysis started"
        );

        let result = self.run_pipeline(&mut state).await;
        if let Err(err) = &result {
            state.error = Some(err.to_string());
            error!(
                agent_id = %self.agent_id(),
                session_id = %context.session_id,
                step = %state.current_step,
                error = %err,
                "AI CFO analysis failed"
            );
        }
        result?;

        let report = state
            .metadata
            .get("final_report")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        info!(
            agent_id = %self.agent_id(),
            session_id = %context.session_id,
            steps = state.completed_steps.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "AI CFO analysis completed"
        );

        Ok(AgentResponse {
            agent_id: self.agent_id().to_string(),
            session_id: context.session_id,
            response: report,
            metadata: state.metadata,
            completed_steps: state.completed_steps,
            error: None,
        })
    }
}

impl CfoAgent {
    async fn run_pipeline(&self, state: &mut AgentState) -> Result<()> {
        self.analyze_request(state);
        self.gather_data(state).await?;
        self.perform_analysis(state).await?;
        self.generate_insights(state).await?;
        self.assess_risks(state).await?;
        self.provide_recommendations(state).await?;
        self.format_response(state)
    }
}
