//! Environment-driven configuration
//!
//! Values are read once at startup; binaries load `.env` via dotenv before
//! calling `Settings::from_env`.

use std::env;

/// Runtime settings consumed by the orchestrator and API server
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub max_concurrent_agents: usize,
    pub default_agent: String,
    pub openai_api_key: Option<String>,
    pub financial_api_base_url: Option<String>,
    pub industry: String,
}

impl Settings {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .or_else(|_| env::var("API_PORT"))
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        let max_concurrent_agents = env::var("MAX_CONCURRENT_AGENTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let default_agent =
            env::var("DEFAULT_AGENT").unwrap_or_else(|_| "ai_cfo_agent".to_string());

        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let financial_api_base_url = env::var("FINANCIAL_API_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let industry = env::var("INDUSTRY").unwrap_or_else(|_| "general".to_string());

        Self {
            port,
            max_concurrent_agents,
            default_agent,
            openai_api_key,
            financial_api_base_url,
            industry,
        }
    }

    /// Demo mode: no LLM key configured, canned responses are used
    pub fn demo_mode(&self) -> bool {
        self.openai_api_key.is_none()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 8080,
            max_concurrent_agents: 10,
            default_agent: "ai_cfo_agent".to_string(),
            openai_api_key: None,
            financial_api_base_url: None,
            industry: "general".to_string(),
        }
    }
}

//
// ================= Industry Benchmarks =================
//

/// Static benchmark targets used by the industry-comparison analysis
#[derive(Debug, Clone, Copy)]
pub struct IndustryBenchmarks {
    pub industry: &'static str,
    pub current_ratio: f64,
    pub gross_margin: f64,
    pub net_margin: f64,
    pub debt_to_equity: f64,
}

const INDUSTRY_BENCHMARKS: &[IndustryBenchmarks] = &[
    IndustryBenchmarks {
        industry: "general",
        current_ratio: 2.0,
        gross_margin: 0.40,
        net_margin: 0.10,
        debt_to_equity: 0.50,
    },
    IndustryBenchmarks {
        industry: "retail",
        current_ratio: 1.5,
        gross_margin: 0.30,
        net_margin: 0.05,
        debt_to_equity: 0.80,
    },
    IndustryBenchmarks {
        industry: "manufacturing",
        current_ratio: 1.8,
        gross_margin: 0.35,
        net_margin: 0.08,
        debt_to_equity: 0.60,
    },
    IndustryBenchmarks {
        industry: "software",
        current_ratio: 2.5,
        gross_margin: 0.70,
        net_margin: 0.20,
        debt_to_equity: 0.30,
    },
];

/// Look up benchmark targets for an industry, falling back to "general"
pub fn benchmarks_for(industry: &str) -> &'static IndustryBenchmarks {
    let wanted = industry.to_lowercase();
    INDUSTRY_BENCHMARKS
        .iter()
        .find(|b| b.industry == wanted)
        .unwrap_or(&INDUSTRY_BENCHMARKS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_lookup() {
        assert_eq!(benchmarks_for("retail").industry, "retail");
        assert_eq!(benchmarks_for("Software").industry, "software");
        assert_eq!(benchmarks_for("aerospace").industry, "general");
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.max_concurrent_agents, 10);
        assert_eq!(settings.default_agent, "ai_cfo_agent");
        assert!(settings.demo_mode());
    }
}
