//! churnwatch entrypoint: parses arguments, loads the dataset and runs the
//! dashboard once or as an interactive session.

use anyhow::{Context, Result};
use churnwatch::{Args, Dashboard, SimulatedRiskModel};
use clap::Parser;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let initial = args.initial_filter()?;
    let mut dashboard = Dashboard::open(
        &args.input,
        Box::new(SimulatedRiskModel),
        initial,
        args.render_options(),
    )
    .with_context(|| format!("failed to load {}", args.input.display()))?;

    if let Some(chart) = &args.chart {
        dashboard = dashboard.with_chart(chart);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.interactive {
        writeln!(out, "Type `help` for commands.\n")?;
        dashboard.run(io::stdin().lock(), &mut out)?;
    } else {
        dashboard.render(&mut out)?;
    }

    out.flush()?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "churnwatch=debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(io::stderr)
        .init();
}
