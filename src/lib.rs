//! churnwatch: a terminal dashboard for simulated customer churn risk
//!
//! The crate loads a customer churn CSV, scores every customer with a
//! pluggable risk model, and renders summary metrics plus a filtered
//! customer table that is recomputed on every filter change.

pub mod cache;
pub mod cli;
pub mod data;
pub mod filter;
pub mod metrics;
pub mod model;
pub mod session;
pub mod viz;

// Re-export public items for easier access
pub use cache::DatasetCache;
pub use cli::Args;
pub use data::{load_customers, CustomerRecord, CustomerTable, LoadError, ScoredCustomer};
pub use filter::{apply_filter, FilterEvent, FilterState, FilteredView, ProbabilityRange};
pub use metrics::RiskSummary;
pub use model::{RiskModel, SimulatedRiskModel};
pub use session::{Command, Dashboard, Flow, InitialFilter};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
