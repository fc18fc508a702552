//! Command-line interface definitions and argument parsing

use crate::filter::{ProbabilityRange, DEFAULT_LOWER, DEFAULT_UPPER};
use crate::session::InitialFilter;
use crate::viz::RenderOptions;
use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;

pub const DEFAULT_INPUT: &str = "WA_Fn-UseC_-Telco-Customer-Churn.csv";

/// Churn risk dashboard: score customers and browse them by risk and contract
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the customer churn CSV file
    #[arg(short, long, default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Lower bound of the churn probability filter
    #[arg(long, default_value_t = DEFAULT_LOWER)]
    pub min_prob: f64,

    /// Upper bound of the churn probability filter
    #[arg(long, default_value_t = DEFAULT_UPPER)]
    pub max_prob: f64,

    /// Contract type to include; repeat for several (default: all)
    #[arg(short, long = "contract")]
    pub contracts: Vec<String>,

    /// Keep reading filter commands from stdin after the first render
    #[arg(long)]
    pub interactive: bool,

    /// Also write an SVG histogram of churn probabilities to this path
    #[arg(long)]
    pub chart: Option<PathBuf>,

    /// Maximum number of customer rows to print
    #[arg(long, default_value_t = 25)]
    pub max_rows: usize,

    /// Currency symbol used for revenue figures
    #[arg(long, default_value = "$")]
    pub currency: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Validated probability range from `--min-prob`/`--max-prob`
    pub fn probability_range(&self) -> crate::Result<ProbabilityRange> {
        Ok(ProbabilityRange::new(self.min_prob, self.max_prob)?)
    }

    /// Filter settings for the first render
    pub fn initial_filter(&self) -> crate::Result<InitialFilter> {
        let contracts = if self.contracts.is_empty() {
            None
        } else {
            Some(self.contracts.iter().cloned().collect::<BTreeSet<_>>())
        };

        Ok(InitialFilter {
            range: self.probability_range()?,
            contracts,
        })
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            max_rows: self.max_rows,
            currency: self.currency.clone(),
        }
    }
}
