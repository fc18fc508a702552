//! Dashboard rendering: terminal report and an SVG risk histogram using Plotters

use crate::data::{CustomerTable, ScoredCustomer};
use crate::filter::{FilterState, FilteredView};
use crate::metrics::{RiskSummary, AT_RISK_THRESHOLD, CRITICAL_THRESHOLD};
use plotters::prelude::*;
use std::io::{self, Write};
use std::path::Path;

pub const TITLE: &str = "Churn Risk Predictive Dashboard";

/// Width of one histogram bin on the probability axis
const BIN_WIDTH: f64 = 0.05;
const BIN_COUNT: usize = 20;

/// Presentation settings that do not affect which rows are selected
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Maximum number of table rows to print
    pub max_rows: usize,
    pub currency: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_rows: 25,
            currency: "$".to_string(),
        }
    }
}

/// Print the whole dashboard page: metrics, filter controls, result table
pub fn render_dashboard<W: Write>(
    out: &mut W,
    table: &CustomerTable,
    state: &FilterState,
    options: &RenderOptions,
) -> io::Result<()> {
    let summary = RiskSummary::compute(table);
    let view = crate::filter::apply_filter(table, state);

    writeln!(out, "{TITLE}")?;
    writeln!(out, "{}", "=".repeat(TITLE.len()))?;
    writeln!(out)?;

    render_summary(out, &summary, options)?;
    writeln!(out, "{}", "-".repeat(60))?;

    render_filters(out, table, state)?;
    writeln!(out)?;

    render_view(out, &view, options)
}

/// Print the three key risk indicators
pub fn render_summary<W: Write>(
    out: &mut W,
    summary: &RiskSummary,
    options: &RenderOptions,
) -> io::Result<()> {
    writeln!(out, "Key Risk Indicators")?;
    writeln!(out, "  Overall churn rate:                  {}", summary.churn_rate_display())?;
    writeln!(
        out,
        "  MRR at risk (prob > {:.0}%):           {}",
        AT_RISK_THRESHOLD * 100.0,
        summary.revenue_at_risk_display(&options.currency)
    )?;
    writeln!(
        out,
        "  Customers in critical state (> {:.0}%): {}",
        CRITICAL_THRESHOLD * 100.0,
        summary.critical_customers
    )
}

fn render_filters<W: Write>(out: &mut W, table: &CustomerTable, state: &FilterState) -> io::Result<()> {
    writeln!(out, "Analysis and Action")?;
    writeln!(out, "  Churn probability range: {}", state.range)?;

    let options: Vec<String> = table
        .contract_types()
        .iter()
        .map(|contract| {
            let mark = if state.contracts.contains(contract) { 'x' } else { ' ' };
            format!("[{mark}] {contract}")
        })
        .collect();
    writeln!(out, "  Contract types: {}", options.join("  "))
}

/// Print the result count and the six-column customer table
pub fn render_view<W: Write>(
    out: &mut W,
    view: &FilteredView<'_>,
    options: &RenderOptions,
) -> io::Result<()> {
    writeln!(
        out,
        "Showing {} customers based on the selected filters.",
        view.len()
    )?;

    if view.is_empty() {
        return Ok(());
    }

    writeln!(
        out,
        "{:<12} {:>11} {:>6}  {:<16} {:>14} {:>14}",
        "customerID", "Probability", "tenure", "Contract", "MonthlyCharges", "TotalCharges"
    )?;
    for row in view.rows.iter().take(options.max_rows) {
        writeln!(out, "{}", format_row(row))?;
    }

    let hidden = view.len().saturating_sub(options.max_rows);
    if hidden > 0 {
        writeln!(out, "... and {hidden} more")?;
    }

    Ok(())
}

fn format_row(row: &ScoredCustomer) -> String {
    let record = &row.record;
    let total = record
        .total_charges
        .map(|value| format!("{value:.2}"))
        .unwrap_or_default();

    format!(
        "{:<12} {:>11.4} {:>6}  {:<16} {:>14.2} {:>14}",
        record.customer_id, row.probability, record.tenure, record.contract, record.monthly_charges, total
    )
}

/// Count probabilities per bin over [0, 1]; 1.0 falls into the last bin
pub fn histogram_counts<'a>(probabilities: impl IntoIterator<Item = &'a ScoredCustomer>) -> [usize; BIN_COUNT] {
    let mut counts = [0; BIN_COUNT];
    for row in probabilities {
        let bin = ((row.probability * BIN_COUNT as f64) as usize).min(BIN_COUNT - 1);
        counts[bin] += 1;
    }
    counts
}

/// Write an SVG histogram of churn probabilities
///
/// # Arguments
/// * `table` - Full scored table, drawn in blue
/// * `view` - Filtered subset, overlaid in red
/// * `output_path` - Destination SVG file
pub fn create_risk_histogram(
    table: &CustomerTable,
    view: &FilteredView<'_>,
    output_path: &Path,
) -> crate::Result<()> {
    let all_counts = histogram_counts(table.rows());
    let view_counts = histogram_counts(view.rows.iter().copied());
    let max_count = *all_counts.iter().max().unwrap_or(&1).max(&1) as f64;

    let root = SVGBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Churn Probability Distribution", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..1f64, 0f64..(max_count * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Churn probability")
        .y_desc("Number of customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (counts, color, label) in [
        (&all_counts, BLUE.mix(0.4), "All customers"),
        (&view_counts, RED.mix(0.8), "Filtered customers"),
    ] {
        chart
            .draw_series(counts.iter().enumerate().filter(|&(_, &count)| count > 0).map(
                |(bin, &count)| {
                    let left = bin as f64 * BIN_WIDTH;
                    Rectangle::new(
                        [(left + 0.004, 0.0), (left + BIN_WIDTH - 0.004, count as f64)],
                        color.filled(),
                    )
                },
            ))?
            .label(label)
            .legend(move |(x, y)| Rectangle::new([(x, y), (x + 10, y + 10)], color.filled()));
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    tracing::info!(path = %output_path.display(), "risk histogram written");

    Ok(())
}
