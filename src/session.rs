//! Interactive dashboard session: commands become filter events and every
//! event re-renders the view from the cached table.

use crate::cache::DatasetCache;
use crate::data::{CustomerTable, LoadError};
use crate::filter::{FilterError, FilterEvent, FilterState, ProbabilityRange};
use crate::model::RiskModel;
use crate::viz::{self, RenderOptions};
use anyhow::Context;
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

pub const HELP: &str = "\
Commands:
  range <lo> <hi>         show customers with churn probability in [lo, hi]
  contracts <a,b,...>     select contract types (comma separated)
  contracts all|none      select every or no contract type
  toggle <contract>       add or remove one contract type
  reset                   restore the default filters
  reload                  re-read the dataset from disk
  show                    render the dashboard again
  help                    print this message
  quit                    leave the dashboard";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`, type `help` for a list")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("`{0}` is not a number")]
    InvalidNumber(String),
    #[error(transparent)]
    Range(#[from] FilterError),
}

/// A line of user input, parsed
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Filter(FilterEvent),
    Reload,
    Show,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match verb.to_ascii_lowercase().as_str() {
            "" => return Err(CommandError::Empty),
            "range" => {
                let mut bounds = rest.split_whitespace();
                let lower = parse_bound(bounds.next())?;
                let upper = parse_bound(bounds.next())?;
                Command::Filter(FilterEvent::SetRange(ProbabilityRange::new(lower, upper)?))
            }
            "contracts" => match rest {
                "" => return Err(CommandError::MissingArgument("contracts")),
                "all" => Command::Filter(FilterEvent::SelectAllContracts),
                "none" => Command::Filter(FilterEvent::ClearContracts),
                list => Command::Filter(FilterEvent::SelectContracts(parse_contract_list(list))),
            },
            "toggle" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("toggle"));
                }
                Command::Filter(FilterEvent::ToggleContract(rest.to_string()))
            }
            "reset" => Command::Filter(FilterEvent::Reset),
            "reload" => Command::Reload,
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(command)
    }
}

fn parse_bound(token: Option<&str>) -> Result<f64, CommandError> {
    let token = token.ok_or(CommandError::MissingArgument("range"))?;
    token
        .parse()
        .map_err(|_| CommandError::InvalidNumber(token.to_string()))
}

/// Split a comma separated contract list, ignoring blank entries
pub fn parse_contract_list(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether the session should keep reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Initial filter settings supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct InitialFilter {
    pub range: ProbabilityRange,
    /// `None` selects every contract type in the table
    pub contracts: Option<BTreeSet<String>>,
}

/// Owns the dataset cache and the current filter state
pub struct Dashboard {
    cache: DatasetCache,
    path: PathBuf,
    state: FilterState,
    options: RenderOptions,
    chart: Option<PathBuf>,
    table: Arc<CustomerTable>,
}

impl Dashboard {
    /// Load the dataset and set up the initial filters. Fails if the file
    /// cannot be loaded.
    pub fn open(
        path: impl Into<PathBuf>,
        model: Box<dyn RiskModel>,
        initial: InitialFilter,
        options: RenderOptions,
    ) -> Result<Self, LoadError> {
        let path = path.into();
        let mut cache = DatasetCache::new(model);
        let table = cache.get(&path)?;

        let mut state = FilterState::for_table(&table);
        state.range = initial.range;
        if let Some(contracts) = initial.contracts {
            state.contracts = contracts;
        }

        Ok(Self {
            cache,
            path,
            state,
            options,
            chart: None,
            table,
        })
    }

    /// Also write the risk histogram to `path` on every render
    pub fn with_chart(mut self, path: impl Into<PathBuf>) -> Self {
        self.chart = Some(path.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn table(&self) -> &Arc<CustomerTable> {
        &self.table
    }

    /// Fetch the table through the cache, picking up on-disk changes.
    /// A failed load is reported and the previous table is kept.
    fn refresh<W: Write>(&mut self, out: &mut W, force: bool) -> crate::Result<()> {
        let result = if force {
            self.cache.reload(&self.path)
        } else {
            self.cache.get(&self.path)
        };

        match result {
            Ok(table) => self.replace_table(table),
            Err(err) => {
                tracing::warn!(error = %err, "keeping previously loaded table");
                writeln!(out, "error: {err}; showing previously loaded data")?;
            }
        }

        Ok(())
    }

    fn replace_table(&mut self, table: Arc<CustomerTable>) {
        if Arc::ptr_eq(&table, &self.table) {
            return;
        }
        if table.contract_types() != self.table.contract_types() {
            tracing::info!("contract types changed, selecting all");
            self.state.contracts = table.contract_types().iter().cloned().collect();
        }
        self.table = table;
    }

    /// Render the dashboard for the current table and filter state
    pub fn render<W: Write>(&mut self, out: &mut W) -> crate::Result<()> {
        self.refresh(out, false)?;
        self.render_current(out)
    }

    /// Render without consulting the cache
    fn render_current<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        viz::render_dashboard(out, &self.table, &self.state, &self.options)?;

        if let Some(chart) = &self.chart {
            let view = crate::filter::apply_filter(&self.table, &self.state);
            viz::create_risk_histogram(&self.table, &view, chart)
                .with_context(|| format!("failed to write chart {}", chart.display()))?;
        }

        Ok(())
    }

    /// Apply one command and re-render when the view may have changed
    pub fn handle<W: Write>(&mut self, command: Command, out: &mut W) -> crate::Result<Flow> {
        match command {
            Command::Filter(event) => {
                self.state.apply(event, &self.table);
                self.render(out)?;
            }
            Command::Reload => {
                self.refresh(out, true)?;
                self.render_current(out)?;
            }
            Command::Show => self.render(out)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    /// Parse and apply one line of input; parse errors are printed, not returned
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> crate::Result<Flow> {
        match line.parse::<Command>() {
            Ok(command) => self.handle(command, out),
            Err(CommandError::Empty) => Ok(Flow::Continue),
            Err(err) => {
                writeln!(out, "error: {err}")?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Read commands until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> crate::Result<()> {
        self.render(out)?;

        for line in input.lines() {
            let line = line.context("failed to read command")?;
            if self.handle_line(&line, out)? == Flow::Quit {
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SimulatedRiskModel;
    use std::fs::File;
    use std::io::Cursor;
    use std::time::{Duration, SystemTime};
    use tempfile::{tempdir, TempDir};

    const HEADER: &str = "customerID,tenure,Contract,MonthlyCharges,TotalCharges,Churn";

    fn write_csv(path: &Path, rows: &[&str]) {
        let mut file = File::create(path).unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
    }

    fn open_dashboard() -> (TempDir, Dashboard) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("churn.csv");
        write_csv(
            &path,
            &[
                "a,1,Month-to-month,50,50,Yes",
                "b,24,Two year,80,1920,No",
                "c,0,Month-to-month,20,,No",
            ],
        );

        let dashboard = Dashboard::open(
            &path,
            Box::new(SimulatedRiskModel),
            InitialFilter::default(),
            RenderOptions::default(),
        )
        .unwrap();
        (dir, dashboard)
    }

    fn run_script(dashboard: &mut Dashboard, script: &str) -> String {
        let mut out = Vec::new();
        dashboard.run(Cursor::new(script), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "range 0.2 0.8".parse::<Command>().unwrap(),
            Command::Filter(FilterEvent::SetRange(ProbabilityRange::new(0.2, 0.8).unwrap()))
        );
        assert_eq!(
            "contracts One year, Two year".parse::<Command>().unwrap(),
            Command::Filter(FilterEvent::SelectContracts(BTreeSet::from([
                "One year".to_string(),
                "Two year".to_string()
            ])))
        );
        assert_eq!(
            "toggle Month-to-month".parse::<Command>().unwrap(),
            Command::Filter(FilterEvent::ToggleContract("Month-to-month".into()))
        );
        assert_eq!("  QUIT ".parse::<Command>().unwrap(), Command::Quit);
        assert_eq!("contracts none".parse::<Command>().unwrap(), Command::Filter(FilterEvent::ClearContracts));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!("range 0.5".parse::<Command>(), Err(CommandError::MissingArgument("range")));
        assert_eq!(
            "range low 1".parse::<Command>(),
            Err(CommandError::InvalidNumber("low".into()))
        );
        assert!(matches!("range 0.9 0.1".parse::<Command>(), Err(CommandError::Range(_))));
        assert!(matches!("frobnicate".parse::<Command>(), Err(CommandError::Unknown(_))));
        assert_eq!("toggle".parse::<Command>(), Err(CommandError::MissingArgument("toggle")));
    }

    #[test]
    fn test_session_applies_events() {
        let (_dir, mut dashboard) = open_dashboard();
        let text = run_script(&mut dashboard, "range 0 1\ncontracts Two year\nquit\nrange 0.9 1\n");

        assert!(text.contains("Showing 1 customers"));
        assert!(text.contains("Showing 3 customers"));
        assert_eq!(dashboard.state().range, ProbabilityRange::new(0.0, 1.0).unwrap());
        assert_eq!(dashboard.state().contracts, BTreeSet::from(["Two year".to_string()]));
    }

    #[test]
    fn test_session_reports_bad_input() {
        let (_dir, mut dashboard) = open_dashboard();
        let text = run_script(&mut dashboard, "range 2 3\nbogus\n");

        assert!(text.contains("error: probability bounds must lie within"));
        assert!(text.contains("error: unknown command `bogus`"));
        assert_eq!(dashboard.state().range, ProbabilityRange::default());
    }

    #[test]
    fn test_session_picks_up_file_changes() {
        let (_dir, mut dashboard) = open_dashboard();
        let path = dashboard.path().to_path_buf();

        write_csv(
            &path,
            &["a,1,Month-to-month,50,50,Yes", "d,70,One year,99,6930,No"],
        );
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();

        run_script(&mut dashboard, "show\n");
        assert_eq!(dashboard.table().len(), 2);
        assert!(dashboard.state().contracts.contains("One year"));
    }

    #[test]
    fn test_failed_reload_keeps_previous_table() {
        let (_dir, mut dashboard) = open_dashboard();
        std::fs::remove_file(dashboard.path()).unwrap();

        let text = run_script(&mut dashboard, "reload\n");
        assert_eq!(text.matches("showing previously loaded data").count(), 2);
        assert_eq!(dashboard.table().len(), 3);

        let text = run_script(&mut dashboard, "");
        assert_eq!(text.matches("showing previously loaded data").count(), 1);
    }

    #[test]
    fn test_reload_reads_file_once() {
        let (_dir, mut dashboard) = open_dashboard();
        let loads = dashboard.cache.loads();

        let mut out = Vec::new();
        dashboard.handle(Command::Reload, &mut out).unwrap();
        assert_eq!(dashboard.cache.loads(), loads + 1);

        std::fs::remove_file(dashboard.path()).unwrap();
        let mut out = Vec::new();
        dashboard.handle(Command::Reload, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("showing previously loaded data").count(), 1);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        let result = Dashboard::open(
            dir.path().join("missing.csv"),
            Box::new(SimulatedRiskModel),
            InitialFilter::default(),
            RenderOptions::default(),
        );
        assert!(result.is_err());
    }
}
