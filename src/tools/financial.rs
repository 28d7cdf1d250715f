//! Financial calculator tools
//!
//! Pure, deterministic calculators: given named numeric inputs they compute
//! a ratio or summary, classify it against fixed interpretation bands, and
//! return the numbers plus the benchmark range used. Undefined calculations
//! (zero denominators, empty series) come back as failure results.

use crate::models::AgentContext;
use crate::tools::{Tool, ToolResult};
use serde_json::{json, Map, Value};

fn num(data: &Value, key: &str) -> f64 {
    data.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn calculation_metadata(method: &str) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("calculation_method".to_string(), json!(method));
    metadata
}

//
// ================= Ratio Calculator =================
//

pub struct RatioCalculatorTool;

#[async_trait::async_trait]
impl Tool for RatioCalculatorTool {
    fn name(&self) -> &'static str {
        "financial_ratio_calculator"
    }

    fn description(&self) -> &'static str {
        "Calculate financial ratios including liquidity, profitability, and leverage ratios"
    }

    fn category(&self) -> &'static str {
        "financial_analysis"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ratio_type": {
                    "type": "string",
                    "enum": [
                        "current_ratio",
                        "quick_ratio",
                        "debt_to_equity",
                        "return_on_equity",
                        "return_on_assets",
                        "gross_margin",
                        "net_margin",
                        "asset_turnover"
                    ]
                },
                "financial_data": {
                    "type": "object",
                    "properties": {
                        "current_assets": {"type": "number"},
                        "current_liabilities": {"type": "number"},
                        "inventory": {"type": "number"},
                        "total_debt": {"type": "number"},
                        "total_equity": {"type": "number"},
                        "total_assets": {"type": "number"},
                        "net_income": {"type": "number"},
                        "revenue": {"type": "number"},
                        "cost_of_goods_sold": {"type": "number"}
                    }
                }
            },
            "required": ["ratio_type", "financial_data"]
        })
    }

    async fn execute(&self, parameters: &Value, _context: Option<&AgentContext>) -> ToolResult {
        let Some(ratio_type) = parameters.get("ratio_type").and_then(Value::as_str) else {
            return ToolResult::failure("Missing required parameter 'ratio_type'");
        };
        let Some(data) = parameters.get("financial_data").filter(|d| d.is_object()) else {
            return ToolResult::failure("Missing required parameter 'financial_data'");
        };

        let result = match ratio_type {
            "current_ratio" => current_ratio(data),
            "quick_ratio" => quick_ratio(data),
            "debt_to_equity" => debt_to_equity(data),
            "return_on_equity" => return_on_equity(data),
            "return_on_assets" => return_on_assets(data),
            "gross_margin" => gross_margin(data),
            "net_margin" => net_margin(data),
            "asset_turnover" => asset_turnover(data),
            other => Err(format!("Unknown ratio type: {}", other)),
        };

        match result {
            Ok(data) => ToolResult::ok_with_metadata(
                data,
                calculation_metadata("standard_financial_formula"),
            ),
            Err(message) => ToolResult::failure(message),
        }
    }
}

fn current_ratio(data: &Value) -> Result<Value, String> {
    let current_assets = num(data, "current_assets");
    let current_liabilities = num(data, "current_liabilities");

    if current_liabilities == 0.0 {
        return Err("Cannot calculate current ratio - no current liabilities".to_string());
    }

    let ratio = current_assets / current_liabilities;
    let interpretation = if ratio >= 2.0 {
        "Strong liquidity position"
    } else if ratio >= 1.0 {
        "Adequate liquidity"
    } else {
        "Potential liquidity concerns"
    };

    Ok(json!({
        "ratio": ratio,
        "current_assets": current_assets,
        "current_liabilities": current_liabilities,
        "interpretation": interpretation,
        "benchmark_range": {"min": 1.0, "good": 2.0, "max": 3.0}
    }))
}

fn quick_ratio(data: &Value) -> Result<Value, String> {
    let current_assets = num(data, "current_assets");
    let inventory = num(data, "inventory");
    let current_liabilities = num(data, "current_liabilities");

    if current_liabilities == 0.0 {
        return Err("Cannot calculate quick ratio - no current liabilities".to_string());
    }

    let quick_assets = current_assets - inventory;
    let ratio = quick_assets / current_liabilities;
    let interpretation = if ratio >= 1.0 {
        "Strong short-term liquidity"
    } else if ratio >= 0.5 {
        "Adequate short-term liquidity"
    } else {
        "Potential short-term liquidity issues"
    };

    Ok(json!({
        "ratio": ratio,
        "quick_assets": quick_assets,
        "current_liabilities": current_liabilities,
        "interpretation": interpretation,
        "benchmark_range": {"min": 0.5, "good": 1.0, "max": 2.0}
    }))
}

fn debt_to_equity(data: &Value) -> Result<Value, String> {
    let total_debt = num(data, "total_debt");
    let total_equity = num(data, "total_equity");

    if total_equity == 0.0 {
        return Err("Cannot calculate debt-to-equity - no equity".to_string());
    }

    let ratio = total_debt / total_equity;
    let interpretation = if ratio <= 0.3 {
        "Conservative debt level"
    } else if ratio <= 0.6 {
        "Moderate debt level"
    } else if ratio <= 1.0 {
        "High debt level"
    } else {
        "Very high debt level - potential risk"
    };

    Ok(json!({
        "ratio": ratio,
        "total_debt": total_debt,
        "total_equity": total_equity,
        "interpretation": interpretation,
        "benchmark_range": {"min": 0.0, "good": 0.5, "max": 1.0}
    }))
}

fn return_on_equity(data: &Value) -> Result<Value, String> {
    let net_income = num(data, "net_income");
    let total_equity = num(data, "total_equity");

    if total_equity == 0.0 {
        return Err("Cannot calculate return on equity - no equity".to_string());
    }

    let ratio = net_income / total_equity;
    let interpretation = if ratio >= 0.15 {
        "Excellent return on equity"
    } else if ratio >= 0.10 {
        "Good return on equity"
    } else if ratio >= 0.05 {
        "Moderate return on equity"
    } else {
        "Low return on equity"
    };

    Ok(json!({
        "ratio": ratio,
        "net_income": net_income,
        "total_equity": total_equity,
        "interpretation": interpretation,
        "benchmark_range": {"min": 0.05, "good": 0.15, "max": 0.25}
    }))
}

fn return_on_assets(data: &Value) -> Result<Value, String> {
    let net_income = num(data, "net_income");
    let total_assets = num(data, "total_assets");

    if total_assets == 0.0 {
        return Err("Cannot calculate return on assets - no assets".to_string());
    }

    let ratio = net_income / total_assets;
    let interpretation = if ratio >= 0.10 {
        "Excellent asset utilization"
    } else if ratio >= 0.05 {
        "Good asset utilization"
    } else if ratio >= 0.02 {
        "Moderate asset utilization"
    } else {
        "Poor asset utilization"
    };

    Ok(json!({
        "ratio": ratio,
        "net_income": net_income,
        "total_assets": total_assets,
        "interpretation": interpretation,
        "benchmark_range": {"min": 0.02, "good": 0.10, "max": 0.20}
    }))
}

fn gross_margin(data: &Value) -> Result<Value, String> {
    let revenue = num(data, "revenue");
    let cost_of_goods_sold = num(data, "cost_of_goods_sold");

    if revenue == 0.0 {
        return Err("Cannot calculate gross margin - no revenue".to_string());
    }

    let gross_profit = revenue - cost_of_goods_sold;
    let ratio = gross_profit / revenue;
    let interpretation = if ratio >= 0.40 {
        "Excellent gross margin"
    } else if ratio >= 0.25 {
        "Good gross margin"
    } else if ratio >= 0.15 {
        "Moderate gross margin"
    } else {
        "Low gross margin"
    };

    Ok(json!({
        "ratio": ratio,
        "gross_profit": gross_profit,
        "revenue": revenue,
        "cost_of_goods_sold": cost_of_goods_sold,
        "interpretation": interpretation,
        "benchmark_range": {"min": 0.15, "good": 0.40, "max": 0.70}
    }))
}

fn net_margin(data: &Value) -> Result<Value, String> {
    let net_income = num(data, "net_income");
    let revenue = num(data, "revenue");

    if revenue == 0.0 {
        return Err("Cannot calculate net margin - no revenue".to_string());
    }

    let ratio = net_income / revenue;
    let interpretation = if ratio >= 0.15 {
        "Excellent profitability"
    } else if ratio >= 0.10 {
        "Good profitability"
    } else if ratio >= 0.05 {
        "Moderate profitability"
    } else {
        "Low profitability"
    };

    Ok(json!({
        "ratio": ratio,
        "net_income": net_income,
        "revenue": revenue,
        "interpretation": interpretation,
        "benchmark_range": {"min": 0.05, "good": 0.15, "max": 0.30}
    }))
}

fn asset_turnover(data: &Value) -> Result<Value, String> {
    let revenue = num(data, "revenue");
    let total_assets = num(data, "total_assets");

    if total_assets == 0.0 {
        return Err("Cannot calculate asset turnover - no assets".to_string());
    }

    let ratio = revenue / total_assets;
    let interpretation = if ratio >= 2.0 {
        "Excellent asset efficiency"
    } else if ratio >= 1.0 {
        "Good asset efficiency"
    } else if ratio >= 0.5 {
        "Moderate asset efficiency"
    } else {
        "Poor asset efficiency"
    };

    Ok(json!({
        "ratio": ratio,
        "revenue": revenue,
        "total_assets": total_assets,
        "interpretation": interpretation,
        "benchmark_range": {"min": 0.5, "good": 2.0, "max": 4.0}
    }))
}

//
// ================= Cash Flow Analyzer =================
//

pub struct CashFlowAnalyzerTool;

#[async_trait::async_trait]
impl Tool for CashFlowAnalyzerTool {
    fn name(&self) -> &'static str {
        "cash_flow_analyzer"
    }

    fn description(&self) -> &'static str {
        "Analyze cash flow trends and volatility across reporting periods"
    }

    fn category(&self) -> &'static str {
        "financial_analysis"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "cash_flows": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "period": {"type": "string"},
                            "net_cash_flow": {"type": "number"}
                        }
                    }
                },
                "analysis_type": {
                    "type": "string",
                    "enum": ["trend", "seasonal", "volatility", "comprehensive"]
                }
            },
            "required": ["cash_flows"]
        })
    }

    async fn execute(&self, parameters: &Value, _context: Option<&AgentContext>) -> ToolResult {
        let Some(cash_flows) = parameters.get("cash_flows").and_then(Value::as_array) else {
            return ToolResult::failure("Missing required parameter 'cash_flows'");
        };
        let analysis_type = parameters
            .get("analysis_type")
            .and_then(Value::as_str)
            .unwrap_or("comprehensive");

        let flows: Vec<f64> = cash_flows
            .iter()
            .map(|entry| num(entry, "net_cash_flow"))
            .collect();

        let result = match analysis_type {
            "trend" => analyze_trend(&flows),
            "seasonal" => analyze_seasonal(&flows),
            "volatility" => analyze_volatility(&flows),
            "comprehensive" => comprehensive_cash_flow(&flows),
            other => Err(format!("Unknown analysis type: {}", other)),
        };

        match result {
            Ok(mut data) => {
                if let Some(obj) = data.as_object_mut() {
                    obj.insert("periods_analyzed".to_string(), json!(flows.len()));
                }
                ToolResult::ok_with_metadata(data, calculation_metadata("cash_flow_statistics"))
            }
            Err(message) => ToolResult::failure(message),
        }
    }
}

fn analyze_trend(flows: &[f64]) -> Result<Value, String> {
    if flows.len() < 2 {
        return Err("Need at least 2 periods for trend analysis".to_string());
    }

    let changes: Vec<f64> = flows
        .windows(2)
        .map(|pair| {
            let (prev, curr) = (pair[0], pair[1]);
            if prev != 0.0 {
                (curr - prev) / prev.abs() * 100.0
            } else if curr == 0.0 {
                0.0
            } else {
                100.0
            }
        })
        .collect();

    let avg_change = changes.iter().sum::<f64>() / changes.len() as f64;
    let trend = if avg_change > 10.0 {
        "Strong Positive"
    } else if avg_change > 0.0 {
        "Positive"
    } else if avg_change > -10.0 {
        "Stable"
    } else {
        "Declining"
    };

    Ok(json!({
        "trend": trend,
        "average_change_percent": (avg_change * 100.0).round() / 100.0,
        "period_changes": changes,
    }))
}

fn analyze_seasonal(flows: &[f64]) -> Result<Value, String> {
    if flows.len() < 12 {
        return Err("Need at least 12 months for seasonal analysis".to_string());
    }

    // Periods are assumed monthly; index i belongs to calendar month (i % 12) + 1
    let mut monthly_flows: Vec<Vec<f64>> = vec![Vec::new(); 12];
    for (i, flow) in flows.iter().enumerate() {
        monthly_flows[i % 12].push(*flow);
    }

    let monthly_averages: Vec<f64> = monthly_flows
        .iter()
        .map(|month| month.iter().sum::<f64>() / month.len() as f64)
        .collect();

    let mut peak_month = 1;
    let mut trough_month = 1;
    for (i, avg) in monthly_averages.iter().enumerate() {
        if *avg > monthly_averages[peak_month - 1] {
            peak_month = i + 1;
        }
        if *avg < monthly_averages[trough_month - 1] {
            trough_month = i + 1;
        }
    }

    let averages_by_month: Map<String, Value> = monthly_averages
        .iter()
        .enumerate()
        .map(|(i, avg)| ((i + 1).to_string(), json!(avg)))
        .collect();

    let seasonal_variance =
        monthly_averages[peak_month - 1] - monthly_averages[trough_month - 1];

    Ok(json!({
        "monthly_averages": averages_by_month,
        "peak_month": peak_month,
        "trough_month": trough_month,
        "seasonal_variance": seasonal_variance,
    }))
}

fn analyze_volatility(flows: &[f64]) -> Result<Value, String> {
    if flows.len() < 2 {
        return Err("Need at least 2 periods for volatility analysis".to_string());
    }

    let mean = flows.iter().sum::<f64>() / flows.len() as f64;
    let variance = flows.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / flows.len() as f64;
    let std_dev = variance.sqrt();

    let cv = if mean != 0.0 {
        std_dev / mean.abs() * 100.0
    } else {
        0.0
    };

    let volatility_level = if cv < 20.0 {
        "Low"
    } else if cv < 50.0 {
        "Moderate"
    } else {
        "High"
    };

    let min = flows.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = flows.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    Ok(json!({
        "mean_cash_flow": (mean * 100.0).round() / 100.0,
        "standard_deviation": (std_dev * 100.0).round() / 100.0,
        "coefficient_of_variation": (cv * 100.0).round() / 100.0,
        "volatility_level": volatility_level,
        "min_flow": min,
        "max_flow": max,
    }))
}

fn comprehensive_cash_flow(flows: &[f64]) -> Result<Value, String> {
    let trend = analyze_trend(flows)?;
    let volatility = analyze_volatility(flows)?;

    let positive_periods = flows.iter().filter(|f| **f > 0.0).count();
    let negative_periods = flows.len() - positive_periods;

    Ok(json!({
        "trend_analysis": trend,
        "volatility_analysis": volatility,
        "positive_periods": positive_periods,
        "negative_periods": negative_periods,
        "positive_period_ratio": positive_periods as f64 / flows.len() as f64,
        "total_net_flow": flows.iter().sum::<f64>(),
        "average_flow": flows.iter().sum::<f64>() / flows.len() as f64,
    }))
}

//
// ================= Profitability Analyzer =================
//

pub struct ProfitabilityAnalyzerTool;

#[async_trait::async_trait]
impl Tool for ProfitabilityAnalyzerTool {
    fn name(&self) -> &'static str {
        "profitability_analyzer"
    }

    fn description(&self) -> &'static str {
        "Analyze profit margins, returns, and operating efficiency"
    }

    fn category(&self) -> &'static str {
        "financial_analysis"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "financial_data": {
                    "type": "object",
                    "properties": {
                        "revenue": {"type": "number"},
                        "cost_of_goods_sold": {"type": "number"},
                        "operating_expenses": {"type": "number"},
                        "net_income": {"type": "number"},
                        "total_assets": {"type": "number"},
                        "total_equity": {"type": "number"},
                        "inventory": {"type": "number"},
                        "accounts_receivable": {"type": "number"}
                    }
                },
                "analysis_type": {
                    "type": "string",
                    "enum": ["margins", "returns", "efficiency", "comprehensive"]
                }
            },
            "required": ["financial_data"]
        })
    }

    async fn execute(&self, parameters: &Value, _context: Option<&AgentContext>) -> ToolResult {
        let Some(data) = parameters.get("financial_data").filter(|d| d.is_object()) else {
            return ToolResult::failure("Missing required parameter 'financial_data'");
        };
        let analysis_type = parameters
            .get("analysis_type")
            .and_then(Value::as_str)
            .unwrap_or("comprehensive");

        let result = match analysis_type {
            "margins" => analyze_margins(data),
            "returns" => Ok(analyze_returns(data)),
            "efficiency" => Ok(analyze_efficiency(data)),
            "comprehensive" => comprehensive_profitability(data),
            other => Err(format!("Unknown analysis type: {}", other)),
        };

        match result {
            Ok(data) => ToolResult::ok_with_metadata(
                data,
                calculation_metadata("standard_profitability_metrics"),
            ),
            Err(message) => ToolResult::failure(message),
        }
    }
}

fn analyze_margins(data: &Value) -> Result<Value, String> {
    let revenue = num(data, "revenue");
    let cogs = num(data, "cost_of_goods_sold");
    let operating_expenses = num(data, "operating_expenses");
    let net_income = num(data, "net_income");

    if revenue == 0.0 {
        return Err("Cannot analyze margins with zero revenue".to_string());
    }

    let gross_profit = revenue - cogs;
    let operating_profit = gross_profit - operating_expenses;
    let gross = gross_profit / revenue;
    let operating = operating_profit / revenue;
    let net = net_income / revenue;

    Ok(json!({
        "gross_margin": gross,
        "operating_margin": operating,
        "net_margin": net,
        "gross_profit": gross_profit,
        "operating_profit": operating_profit,
        "revenue": revenue,
        "interpretations": {
            "gross_margin": interpret_margin(gross, "gross"),
            "operating_margin": interpret_margin(operating, "operating"),
            "net_margin": interpret_margin(net, "net"),
        }
    }))
}

fn analyze_returns(data: &Value) -> Value {
    let net_income = num(data, "net_income");
    let total_assets = num(data, "total_assets");
    let total_equity = num(data, "total_equity");

    let mut returns = Map::new();
    if total_assets > 0.0 {
        returns.insert("return_on_assets".to_string(), json!(net_income / total_assets));
    }
    if total_equity > 0.0 {
        returns.insert("return_on_equity".to_string(), json!(net_income / total_equity));
    }

    let interpretations: Map<String, Value> = returns
        .iter()
        .map(|(metric, value)| {
            let v = value.as_f64().unwrap_or(0.0);
            (metric.clone(), json!(interpret_return(v)))
        })
        .collect();
    returns.insert("interpretations".to_string(), Value::Object(interpretations));

    Value::Object(returns)
}

fn analyze_efficiency(data: &Value) -> Value {
    let revenue = num(data, "revenue");
    let total_assets = num(data, "total_assets");
    let inventory = num(data, "inventory");
    let accounts_receivable = num(data, "accounts_receivable");

    let mut efficiency = Map::new();
    if total_assets > 0.0 {
        efficiency.insert("asset_turnover".to_string(), json!(revenue / total_assets));
    }
    if inventory > 0.0 {
        efficiency.insert("inventory_turnover".to_string(), json!(revenue / inventory));
    }
    if accounts_receivable > 0.0 {
        let receivables_turnover = revenue / accounts_receivable;
        efficiency.insert("receivables_turnover".to_string(), json!(receivables_turnover));
        efficiency.insert(
            "days_sales_outstanding".to_string(),
            json!(365.0 / receivables_turnover),
        );
    }

    Value::Object(efficiency)
}

fn comprehensive_profitability(data: &Value) -> Result<Value, String> {
    let margins = analyze_margins(data)?;
    let returns = analyze_returns(data);
    let efficiency = analyze_efficiency(data);

    let mut score_components = Vec::new();
    if let Some(gross) = margins.get("gross_margin").and_then(Value::as_f64) {
        score_components.push((gross * 100.0).min(100.0));
    }
    if let Some(roa) = returns.get("return_on_assets").and_then(Value::as_f64) {
        score_components.push((roa * 500.0).min(100.0));
    }
    if let Some(turnover) = efficiency.get("asset_turnover").and_then(Value::as_f64) {
        score_components.push((turnover * 50.0).min(100.0));
    }

    let overall_score = if score_components.is_empty() {
        0.0
    } else {
        score_components.iter().sum::<f64>() / score_components.len() as f64
    };

    Ok(json!({
        "margins_analysis": margins,
        "returns_analysis": returns,
        "efficiency_analysis": efficiency,
        "overall_profitability_score": (overall_score * 100.0).round() / 100.0,
        "score_interpretation": interpret_overall_score(overall_score),
    }))
}

fn interpret_margin(margin: f64, margin_type: &str) -> &'static str {
    match margin_type {
        "gross" => {
            if margin >= 0.5 {
                "Excellent gross margin"
            } else if margin >= 0.3 {
                "Good gross margin"
            } else if margin >= 0.15 {
                "Moderate gross margin"
            } else {
                "Low gross margin"
            }
        }
        "operating" => {
            if margin >= 0.2 {
                "Excellent operating efficiency"
            } else if margin >= 0.1 {
                "Good operating efficiency"
            } else if margin >= 0.05 {
                "Moderate operating efficiency"
            } else {
                "Poor operating efficiency"
            }
        }
        _ => {
            if margin >= 0.15 {
                "Excellent profitability"
            } else if margin >= 0.1 {
                "Good profitability"
            } else if margin >= 0.05 {
                "Moderate profitability"
            } else {
                "Low profitability"
            }
        }
    }
}

fn interpret_return(value: f64) -> &'static str {
    if value >= 0.15 {
        "Excellent returns"
    } else if value >= 0.1 {
        "Good returns"
    } else if value >= 0.05 {
        "Moderate returns"
    } else {
        "Low returns"
    }
}

fn interpret_overall_score(score: f64) -> &'static str {
    if score >= 80.0 {
        "Excellent overall profitability"
    } else if score >= 60.0 {
        "Good overall profitability"
    } else if score >= 40.0 {
        "Moderate overall profitability"
    } else {
        "Poor overall profitability"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn run_ratio(ratio_type: &str, data: Value) -> ToolResult {
        let tool = RatioCalculatorTool;
        let params = json!({"ratio_type": ratio_type, "financial_data": data});
        tool.execute(&params, None).await
    }

    #[tokio::test]
    async fn test_current_ratio_strong_liquidity() {
        let result = run_ratio(
            "current_ratio",
            json!({"current_assets": 200000, "current_liabilities": 100000}),
        )
        .await;

        assert!(result.success);
        assert!((result.data["ratio"].as_f64().unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(result.data["interpretation"], "Strong liquidity position");
        assert_eq!(result.data["benchmark_range"]["good"], 2.0);
    }

    #[tokio::test]
    async fn test_current_ratio_bands() {
        let adequate = run_ratio(
            "current_ratio",
            json!({"current_assets": 150000, "current_liabilities": 100000}),
        )
        .await;
        assert_eq!(adequate.data["interpretation"], "Adequate liquidity");

        let concern = run_ratio(
            "current_ratio",
            json!({"current_assets": 80000, "current_liabilities": 100000}),
        )
        .await;
        assert_eq!(concern.data["interpretation"], "Potential liquidity concerns");
    }

    #[tokio::test]
    async fn test_zero_denominator_is_failure_not_panic() {
        for (ratio, data) in [
            ("current_ratio", json!({"current_assets": 100000, "current_liabilities": 0})),
            ("quick_ratio", json!({"current_assets": 100000, "current_liabilities": 0})),
            ("debt_to_equity", json!({"total_debt": 50000, "total_equity": 0})),
            ("return_on_equity", json!({"net_income": 10000, "total_equity": 0})),
            ("return_on_assets", json!({"net_income": 10000, "total_assets": 0})),
            ("gross_margin", json!({"revenue": 0, "cost_of_goods_sold": 1000})),
            ("net_margin", json!({"net_income": 10000, "revenue": 0})),
            ("asset_turnover", json!({"revenue": 10000, "total_assets": 0})),
        ] {
            let result = run_ratio(ratio, data).await;
            assert!(!result.success, "{} should fail on zero denominator", ratio);
            assert!(!result.error.as_deref().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_quick_ratio_subtracts_inventory() {
        let result = run_ratio(
            "quick_ratio",
            json!({"current_assets": 150000, "inventory": 50000, "current_liabilities": 100000}),
        )
        .await;

        assert!(result.success);
        assert!((result.data["ratio"].as_f64().unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(result.data["interpretation"], "Strong short-term liquidity");
    }

    #[tokio::test]
    async fn test_debt_to_equity_interpretation() {
        let result = run_ratio(
            "debt_to_equity",
            json!({"total_debt": 180000, "total_equity": 400000}),
        )
        .await;

        assert!(result.success);
        assert!((result.data["ratio"].as_f64().unwrap() - 0.45).abs() < 1e-9);
        assert_eq!(result.data["interpretation"], "Moderate debt level");
    }

    #[tokio::test]
    async fn test_roe_excellent_band() {
        let result = run_ratio(
            "return_on_equity",
            json!({"net_income": 85000, "total_equity": 400000}),
        )
        .await;

        assert!(result.success);
        assert_eq!(result.data["interpretation"], "Excellent return on equity");
    }

    #[tokio::test]
    async fn test_unknown_ratio_type() {
        let result = run_ratio("sharpe_ratio", json!({})).await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("Unknown ratio type"));
    }

    #[tokio::test]
    async fn test_missing_parameters() {
        let tool = RatioCalculatorTool;
        let result = tool.execute(&json!({"ratio_type": "current_ratio"}), None).await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("financial_data"));
    }

    #[tokio::test]
    async fn test_cash_flow_trend() {
        let tool = CashFlowAnalyzerTool;
        let params = json!({
            "cash_flows": [
                {"net_cash_flow": 100.0},
                {"net_cash_flow": 120.0},
                {"net_cash_flow": 150.0}
            ],
            "analysis_type": "trend"
        });

        let result = tool.execute(&params, None).await;
        assert!(result.success);
        assert_eq!(result.data["trend"], "Strong Positive");
        assert_eq!(result.data["periods_analyzed"], 3);
    }

    #[tokio::test]
    async fn test_cash_flow_volatility_levels() {
        let tool = CashFlowAnalyzerTool;
        let steady = json!({
            "cash_flows": [
                {"net_cash_flow": 100.0},
                {"net_cash_flow": 102.0},
                {"net_cash_flow": 98.0}
            ],
            "analysis_type": "volatility"
        });

        let result = tool.execute(&steady, None).await;
        assert!(result.success);
        assert_eq!(result.data["volatility_level"], "Low");
        assert_eq!(result.data["max_flow"], 102.0);
    }

    #[tokio::test]
    async fn test_seasonal_peak_and_trough() {
        let tool = CashFlowAnalyzerTool;
        // Month 3 highest, month 7 lowest
        let mut flows: Vec<Value> = (0..12).map(|_| json!({"net_cash_flow": 100.0})).collect();
        flows[2] = json!({"net_cash_flow": 400.0});
        flows[6] = json!({"net_cash_flow": -50.0});

        let result = tool
            .execute(&json!({"cash_flows": flows, "analysis_type": "seasonal"}), None)
            .await;

        assert!(result.success);
        assert_eq!(result.data["peak_month"], 3);
        assert_eq!(result.data["trough_month"], 7);
        assert_eq!(result.data["seasonal_variance"], 450.0);
        assert_eq!(result.data["monthly_averages"]["3"], 400.0);
    }

    #[tokio::test]
    async fn test_seasonal_averages_repeat_years() {
        let tool = CashFlowAnalyzerTool;
        // Two years of monthly data; second year doubles the first
        let flows: Vec<Value> = (0..24)
            .map(|i| {
                let base = (i % 12 + 1) as f64 * 10.0;
                let value = if i < 12 { base } else { base * 2.0 };
                json!({"net_cash_flow": value})
            })
            .collect();

        let result = tool
            .execute(&json!({"cash_flows": flows, "analysis_type": "seasonal"}), None)
            .await;

        assert!(result.success);
        // January averages (10 + 20) / 2
        assert_eq!(result.data["monthly_averages"]["1"], 15.0);
        assert_eq!(result.data["peak_month"], 12);
        assert_eq!(result.data["trough_month"], 1);
    }

    #[tokio::test]
    async fn test_seasonal_needs_twelve_periods() {
        let tool = CashFlowAnalyzerTool;
        let flows: Vec<Value> = (0..6).map(|_| json!({"net_cash_flow": 100.0})).collect();

        let result = tool
            .execute(&json!({"cash_flows": flows, "analysis_type": "seasonal"}), None)
            .await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("12 months"));
    }

    #[tokio::test]
    async fn test_cash_flow_needs_two_periods() {
        let tool = CashFlowAnalyzerTool;
        let params = json!({"cash_flows": [{"net_cash_flow": 10.0}], "analysis_type": "trend"});
        let result = tool.execute(&params, None).await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("at least 2 periods"));
    }

    #[tokio::test]
    async fn test_profitability_comprehensive() {
        let tool = ProfitabilityAnalyzerTool;
        let params = json!({
            "financial_data": {
                "revenue": 1200000.0,
                "cost_of_goods_sold": 720000.0,
                "operating_expenses": 310000.0,
                "net_income": 85000.0,
                "total_assets": 750000.0,
                "total_equity": 400000.0
            }
        });

        let result = tool.execute(&params, None).await;
        assert!(result.success);
        assert!(result.data["overall_profitability_score"].as_f64().unwrap() > 0.0);
        assert!(result.data["margins_analysis"]["gross_margin"].as_f64().unwrap() > 0.0);
        assert!(result.data["returns_analysis"]["return_on_equity"].is_f64());
    }

    #[tokio::test]
    async fn test_profitability_zero_revenue() {
        let tool = ProfitabilityAnalyzerTool;
        let params = json!({
            "financial_data": {"revenue": 0.0},
            "analysis_type": "margins"
        });

        let result = tool.execute(&params, None).await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("zero revenue"));
    }
}
