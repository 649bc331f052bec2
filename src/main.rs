use std::fs;
use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mailtally::cli::Cli;
use mailtally::config::Config;
use mailtally::job::TallyJob;
use mailtally::output::TallyReport;

fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Handle schema generation early exit
    if cli.generate_schema {
        println!("{}", TallyReport::generate_json_schema()?);
        return Ok(());
    }

    init_logging(&cli);

    // Load configuration
    let mut config = Config::from_env();
    config.merge_with_cli(&cli);

    // Fatal: invalid configuration or an uncompilable token pattern
    let job = TallyJob::new(&config)?;

    info!(
        archives = cli.inputs.len(),
        threads = config.job.threads,
        dedup_scope = %config.scan.dedup_scope,
        domain_mode = %config.scan.domain_mode,
        "starting tally"
    );

    let outcome = job.run_files(&cli.inputs)?;
    info!(
        partitions = outcome.partitions,
        records = outcome.counters.records_seen,
        records_in = outcome.counters.records_in,
        exceptions = outcome.counters.exceptions,
        tokens = outcome.results.len(),
        "tally complete"
    );

    let report = job.report(&cli.inputs, outcome);
    let rendered = report.render(config.job.output_format)?;

    match config.job.output_path {
        Some(ref path) => fs::write(path, rendered)
            .with_context(|| format!("Failed to write results to {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber; `RUST_LOG` wins over `--verbose`.
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mailtally={}", cli.log_directive())));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(cli.is_trace())
        .try_init();
}
