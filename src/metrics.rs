//! Summary risk indicators computed over the full scored table

use crate::data::CustomerTable;

/// Probability above which a customer's monthly charge counts as revenue at risk
pub const AT_RISK_THRESHOLD: f64 = 0.5;
/// Probability above which a customer is considered critical
pub const CRITICAL_THRESHOLD: f64 = 0.7;

/// Headline numbers shown above the customer table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSummary {
    /// Fraction of customers with a historical churn label, 0 for an empty table
    pub churn_rate: f64,
    /// Sum of monthly charges of customers above [`AT_RISK_THRESHOLD`]
    pub revenue_at_risk: f64,
    /// Customers above [`CRITICAL_THRESHOLD`]
    pub critical_customers: usize,
}

impl RiskSummary {
    pub fn compute(table: &CustomerTable) -> Self {
        let rows = table.rows();

        let churned = rows.iter().filter(|row| row.record.churned).count();
        let churn_rate = if rows.is_empty() {
            0.0
        } else {
            churned as f64 / rows.len() as f64
        };

        let revenue_at_risk = rows
            .iter()
            .filter(|row| row.probability > AT_RISK_THRESHOLD)
            .map(|row| row.record.monthly_charges)
            .sum();

        let critical_customers = rows
            .iter()
            .filter(|row| row.probability > CRITICAL_THRESHOLD)
            .count();

        Self {
            churn_rate,
            revenue_at_risk,
            critical_customers,
        }
    }

    pub fn churn_rate_display(&self) -> String {
        format_percent(self.churn_rate)
    }

    pub fn revenue_at_risk_display(&self, currency: &str) -> String {
        format_currency(self.revenue_at_risk, currency)
    }
}

/// Format a fraction as a percentage with one decimal, `0.3333 -> "33.3%"`
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Format an amount with two decimals and comma thousands separators
///
/// Amounts are sums of finite monthly charges; a non-finite value renders
/// as `n/a`.
pub fn format_currency(amount: f64, symbol: &str) -> String {
    if !amount.is_finite() {
        return format!("{symbol} n/a");
    }

    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{symbol} {grouped}.{cents}")
}
