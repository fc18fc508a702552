//! Data loading and risk table construction using Polars

use crate::model::{score_probabilities, RiskModel};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Columns every input file must provide
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "customerID",
    "tenure",
    "Contract",
    "MonthlyCharges",
    "TotalCharges",
    "Churn",
];

/// Errors raised while reading the customer dataset
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("invalid or missing {column} value in data row {row}")]
    InvalidValue { column: &'static str, row: usize },
}

/// One customer row as read from the source file
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: String,
    /// Months the account has been held
    pub tenure: u32,
    pub contract: String,
    pub monthly_charges: f64,
    /// `None` when the source cell is blank or not a number
    pub total_charges: Option<f64>,
    /// Historical label, `Churn == "Yes"`
    pub churned: bool,
}

/// A customer together with its derived churn probability
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCustomer {
    pub record: CustomerRecord,
    pub probability: f64,
}

/// Scored customers sorted by descending churn probability
#[derive(Debug, Clone)]
pub struct CustomerTable {
    rows: Vec<ScoredCustomer>,
    contract_types: Vec<String>,
    model_name: String,
}

impl CustomerTable {
    /// Score the records with `model` and sort them, riskiest first.
    ///
    /// Ties keep their input order.
    pub fn score(records: Vec<CustomerRecord>, model: &dyn RiskModel) -> Self {
        let probabilities = score_probabilities(&records, model);

        let mut rows: Vec<ScoredCustomer> = records
            .into_iter()
            .zip(probabilities.iter())
            .map(|(record, &probability)| ScoredCustomer {
                record,
                probability,
            })
            .collect();
        rows.sort_by(|a, b| b.probability.total_cmp(&a.probability));

        let mut contract_types: Vec<String> = Vec::new();
        for row in &rows {
            if !contract_types.contains(&row.record.contract) {
                contract_types.push(row.record.contract.clone());
            }
        }

        Self {
            rows,
            contract_types,
            model_name: model.name().to_string(),
        }
    }

    pub fn rows(&self) -> &[ScoredCustomer] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct contract types in order of first appearance
    pub fn contract_types(&self) -> &[String] {
        &self.contract_types
    }

    /// Name of the risk model that produced the probabilities
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Load the customer CSV and score every row
///
/// # Arguments
/// * `file_path` - Path to the CSV file
/// * `model` - Strategy producing the raw risk scores
///
/// # Returns
/// * `CustomerTable` sorted by descending churn probability
pub fn load_customers(file_path: &Path, model: &dyn RiskModel) -> Result<CustomerTable, LoadError> {
    let start = Instant::now();

    std::fs::metadata(file_path).map_err(|source| LoadError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;

    // Full-file schema inference: blank TotalCharges cells can appear far
    // into the file and would otherwise break a numeric column guess.
    let df = LazyCsvReader::new(file_path)
        .with_has_header(true)
        .with_infer_schema_length(None)
        .finish()?
        .select(REQUIRED_COLUMNS.map(col))
        .collect()?;

    let records = extract_records(&df)?;
    let table = CustomerTable::score(records, model);

    tracing::debug!(
        path = %file_path.display(),
        rows = table.len(),
        model = model.name(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "loaded customer table"
    );

    Ok(table)
}

/// Convert the selected columns into typed records
fn extract_records(df: &DataFrame) -> Result<Vec<CustomerRecord>, LoadError> {
    let ids = df.column("customerID")?.cast(&DataType::String)?;
    // Read as float so fractional months are rejected rather than truncated
    let tenure = df.column("tenure")?.cast(&DataType::Float64)?;
    let contract = df.column("Contract")?.cast(&DataType::String)?;
    let monthly = df.column("MonthlyCharges")?.cast(&DataType::Float64)?;
    // Non-strict cast: blank or non-numeric cells become null
    let total = df.column("TotalCharges")?.cast(&DataType::Float64)?;
    let churn = df.column("Churn")?.cast(&DataType::String)?;

    let ids = ids.str()?;
    let tenure = tenure.f64()?;
    let contract = contract.str()?;
    let monthly = monthly.f64()?;
    let total = total.f64()?;
    let churn = churn.str()?;

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let missing = |column| LoadError::InvalidValue {
            column,
            row: row + 1,
        };

        records.push(CustomerRecord {
            customer_id: ids.get(row).ok_or_else(|| missing("customerID"))?.to_string(),
            tenure: tenure
                .get(row)
                .and_then(whole_months)
                .ok_or_else(|| missing("tenure"))?,
            contract: contract.get(row).ok_or_else(|| missing("Contract"))?.to_string(),
            monthly_charges: monthly
                .get(row)
                .filter(|value| value.is_finite())
                .ok_or_else(|| missing("MonthlyCharges"))?,
            // NaN and inf parse as floats; they count as missing too
            total_charges: total.get(row).filter(|value| value.is_finite()),
            churned: churn.get(row).ok_or_else(|| missing("Churn"))? == "Yes",
        });
    }

    Ok(records)
}

fn whole_months(value: f64) -> Option<u32> {
    let in_range = (0.0..=f64::from(u32::MAX)).contains(&value);
    (in_range && value.fract() == 0.0).then(|| value as u32)
}
