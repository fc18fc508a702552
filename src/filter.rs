//! Filter state, the events that change it, and the pure view computation

use crate::data::{CustomerTable, ScoredCustomer};
use std::collections::BTreeSet;
use std::fmt;

pub const DEFAULT_LOWER: f64 = 0.7;
pub const DEFAULT_UPPER: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("probability bounds must lie within [0.0, 1.0], got [{lower}, {upper}]")]
    OutOfBounds { lower: f64, upper: f64 },
    #[error("lower bound {lower} is above upper bound {upper}")]
    Inverted { lower: f64, upper: f64 },
}

/// Inclusive churn probability window, always within [0.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityRange {
    lower: f64,
    upper: f64,
}

impl ProbabilityRange {
    pub fn new(lower: f64, upper: f64) -> Result<Self, FilterError> {
        let in_bounds = |v: f64| (0.0..=1.0).contains(&v);
        if !in_bounds(lower) || !in_bounds(upper) {
            return Err(FilterError::OutOfBounds { lower, upper });
        }
        if lower > upper {
            return Err(FilterError::Inverted { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn contains(&self, probability: f64) -> bool {
        probability >= self.lower && probability <= self.upper
    }
}

impl Default for ProbabilityRange {
    fn default() -> Self {
        Self {
            lower: DEFAULT_LOWER,
            upper: DEFAULT_UPPER,
        }
    }
}

impl fmt::Display for ProbabilityRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}, {:.2}]", self.lower, self.upper)
    }
}

/// A single change to the filter controls
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEvent {
    SetRange(ProbabilityRange),
    SelectContracts(BTreeSet<String>),
    ToggleContract(String),
    SelectAllContracts,
    ClearContracts,
    /// Default range and every contract type selected
    Reset,
}

/// Current state of the filter controls
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub range: ProbabilityRange,
    pub contracts: BTreeSet<String>,
}

impl FilterState {
    /// Default range with every contract type of `table` selected
    pub fn for_table(table: &CustomerTable) -> Self {
        Self {
            range: ProbabilityRange::default(),
            contracts: table.contract_types().iter().cloned().collect(),
        }
    }

    /// Update the state in response to `event`; `table` supplies the
    /// contract options for the "all" selections.
    pub fn apply(&mut self, event: FilterEvent, table: &CustomerTable) {
        tracing::debug!(?event, "applying filter event");

        match event {
            FilterEvent::SetRange(range) => self.range = range,
            FilterEvent::SelectContracts(contracts) => self.contracts = contracts,
            FilterEvent::ToggleContract(contract) => {
                if !self.contracts.remove(&contract) {
                    self.contracts.insert(contract);
                }
            }
            FilterEvent::SelectAllContracts => {
                self.contracts = table.contract_types().iter().cloned().collect();
            }
            FilterEvent::ClearContracts => self.contracts.clear(),
            FilterEvent::Reset => *self = Self::for_table(table),
        }
    }

    pub fn matches(&self, customer: &ScoredCustomer) -> bool {
        self.range.contains(customer.probability) && self.contracts.contains(&customer.record.contract)
    }
}

/// Borrowed subset of the table selected by a filter
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    pub rows: Vec<&'a ScoredCustomer>,
}

impl FilteredView<'_> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Rows of `table` matching `state`, in table order
pub fn apply_filter<'a>(table: &'a CustomerTable, state: &FilterState) -> FilteredView<'a> {
    FilteredView {
        rows: table.rows().iter().filter(|row| state.matches(row)).collect(),
    }
}
