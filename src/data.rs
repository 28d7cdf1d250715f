//! Financial data source seam
//!
//! The gather-data stage pulls a company snapshot from a data source chosen
//! at construction time: a fixed fixture when no external sync collaborator
//! is configured, or an HTTP-backed source when one is.

use crate::config::Settings;
use crate::error::OrchestratorError;
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// One company's financial snapshot used for ratio analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialSnapshot {
    pub current_assets: f64,
    pub current_liabilities: f64,
    pub inventory: f64,
    pub accounts_receivable: f64,
    pub total_assets: f64,
    pub total_debt: f64,
    pub total_equity: f64,
    pub net_income: f64,
    pub revenue: f64,
    pub cost_of_goods_sold: f64,
    pub operating_expenses: f64,
    /// Net cash flow per period, oldest first
    pub monthly_net_cash_flows: Vec<f64>,
}

#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, company_id: &str) -> Result<FinancialSnapshot>;
}

/// Select the data-source variant from settings
pub fn source_from_settings(settings: &Settings) -> Arc<dyn DataSource> {
    match &settings.financial_api_base_url {
        Some(url) => Arc::new(ApiDataSource::new(url.clone())),
        None => Arc::new(FixtureDataSource),
    }
}

//
// ================= Fixture source =================
//

/// Fixed demo dataset standing in for the external-system-sync collaborator
pub struct FixtureDataSource;

impl FixtureDataSource {
    pub fn snapshot() -> FinancialSnapshot {
        FinancialSnapshot {
            current_assets: 250_000.0,
            current_liabilities: 125_000.0,
            inventory: 50_000.0,
            accounts_receivable: 65_000.0,
            total_assets: 750_000.0,
            total_debt: 180_000.0,
            total_equity: 400_000.0,
            net_income: 85_000.0,
            revenue: 1_200_000.0,
            cost_of_goods_sold: 720_000.0,
            operating_expenses: 310_000.0,
            monthly_net_cash_flows: vec![
                12_000.0, 9_500.0, 14_200.0, 8_800.0, 11_000.0, 13_400.0, 10_200.0, 9_900.0,
                15_100.0, 12_700.0, 11_800.0, 14_600.0,
            ],
        }
    }
}

#[async_trait::async_trait]
impl DataSource for FixtureDataSource {
    async fn fetch(&self, _company_id: &str) -> Result<FinancialSnapshot> {
        Ok(Self::snapshot())
    }
}

//
// ================= HTTP source =================
//

/// HTTP-backed data source for a live financial-data service
pub struct ApiDataSource {
    client: Client,
    base_url: String,
}

impl ApiDataSource {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl DataSource for ApiDataSource {
    async fn fetch(&self, company_id: &str) -> Result<FinancialSnapshot> {
        let url = format!("{}/api/v1/companies/{}/snapshot", self.base_url, company_id);

        let response = self.client.get(&url).send().await.map_err(|e| {
            OrchestratorError::DataSourceError(format!(
                "Snapshot request failed for {}: {}",
                company_id, e
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OrchestratorError::DataSourceError(format!(
                "Financial data service returned {} for {}",
                status, company_id
            )));
        }

        let snapshot = response.json::<FinancialSnapshot>().await.map_err(|e| {
            OrchestratorError::DataSourceError(format!("Invalid snapshot payload: {}", e))
        })?;

        Ok(snapshot)
    }
}
