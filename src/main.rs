use anyhow::{Context, Result};
use clap::Parser;
use crashwh::cli::{Cli, Command, OutputFormat};
use crashwh::config::PipelineConfig;
use crashwh::pipeline::{self, BuildSummary, ReportOutcome};
use crashwh::report::write_reports_csv;
use tracing_subscriber::EnvFilter;

/// How many data-quality issues the text build summary lists
const ISSUES_SHOWN: usize = 20;

/// Initialize tracing subscriber; `--debug` forces TRACE, otherwise RUST_LOG (default info)
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_toml(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    cli.command.apply(&mut config);
    Ok(config)
}

fn print_build_summary(summary: &BuildSummary) {
    println!("=== Warehouse Build ===");
    println!("Input records:    {}", summary.input_rows);
    for count in &summary.dimension_rows {
        println!("{:<17} {}", format!("dim_{}:", count.family), count.rows);
    }
    println!("Fact rows:        {}", summary.fact_rows);
    println!("Excluded records: {}", summary.excluded_records);
    if !summary.issues.is_empty() {
        println!();
        println!(
            "Data quality issues (showing {} of {}):",
            summary.issues.len().min(ISSUES_SHOWN),
            summary.issues.len()
        );
        for issue in summary.issues.iter().take(ISSUES_SHOWN) {
            let id = issue
                .record_id
                .map_or_else(|| "?".to_string(), |id| id.to_string());
            println!(
                "  row {} (id {}): {} = '{}': {}",
                issue.row, id, issue.attribute, issue.value, issue.reason
            );
        }
    }
    println!();
    println!("Build digest: {}", summary.digest);
}

fn print_report_outcome(outcome: &ReportOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            print!("{}", outcome.summary.render());
            if let Some(first) = outcome.written.first() {
                if let Some(dir) = first.parent() {
                    println!("\nReports written to {}", dir.display());
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome.reports)?),
        OutputFormat::Csv => write_reports_csv(&outcome.reports, std::io::stdout().lock())?,
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing before anything logs
    init_tracing(cli.debug);

    let config = load_config(&cli)?;

    match &cli.command {
        Command::Profile { format, .. } => {
            if *format == OutputFormat::Csv {
                anyhow::bail!("--format csv is not supported for profile (use text or json)");
            }
            let profile = pipeline::profile(&config).context("Profile stage failed")?;
            if *format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                print!("{}", profile.render());
            }
        }
        Command::Build { format, .. } => {
            if *format == OutputFormat::Csv {
                anyhow::bail!("--format csv is not supported for build (use text or json)");
            }
            let summary = pipeline::build(&config).context("Build stage failed")?;
            if *format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_build_summary(&summary);
            }
        }
        Command::Report { format, .. } => {
            let outcome = pipeline::report(&config).context("Report stage failed")?;
            print_report_outcome(&outcome, *format)?;
        }
        Command::Run { .. } => {
            let profile = pipeline::profile(&config).context("Profile stage failed")?;
            print!("{}", profile.render());
            println!();
            let summary = pipeline::build(&config).context("Build stage failed")?;
            print_build_summary(&summary);
            println!();
            let outcome = pipeline::report(&config).context("Report stage failed")?;
            print_report_outcome(&outcome, OutputFormat::Text)?;
        }
    }

    Ok(())
}
