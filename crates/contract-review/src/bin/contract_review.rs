//! Contract review CLI
//!
//! Run with: cargo run -p contract-review -- contrato.docx

use anyhow::Context;
use clap::Parser;
use console::style;
use contract_review::{
    presentation::DownloadResolver, ClientConfig, Document, HttpJobClient, JobController,
    PresentationAdapter, ReportView, SubmitOptions, ViewState,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "contract-review")]
#[command(about = "Submit a contract for analysis and print the review report")]
#[command(version)]
struct Cli {
    /// Contract document to analyse (.docx)
    file: PathBuf,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Analysis service base URL (overrides config)
    #[arg(long)]
    api_url: Option<String>,

    /// Ask the service to consult the reference manual
    #[arg(long)]
    use_reference_manual: bool,

    /// Save the revised document here once the analysis completes
    #[arg(short, long)]
    download: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contract_review=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.service.base_url = url;
        config.validate()?;
    }
    tracing::info!("Analysis service: {}", config.service.base_url);

    let client = Arc::new(HttpJobClient::new(&config.service)?);
    let controller = JobController::from_config(client.clone(), &config);
    let mut adapter = PresentationAdapter::new(controller.subscribe())
        .with_resolver(client.clone() as Arc<dyn DownloadResolver>);

    let document = Document::from_path(&cli.file)
        .await
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let options = SubmitOptions {
        use_reference_manual: cli.use_reference_manual,
    };
    let (submitted, view) = tokio::join!(
        controller.submit(document, options),
        follow(&mut adapter, &spinner)
    );
    spinner.finish_and_clear();

    let job_id = submitted?;

    match view {
        Some(ViewState::Complete {
            report,
            download_url,
        }) => {
            print_report(&report);
            if let Some(url) = &download_url {
                println!("\n  {} {}", style("Revised document:").bold(), url);
            }
            if let Some(path) = &cli.download {
                let reference = controller
                    .snapshot()
                    .download_reference()
                    .map(str::to_string)
                    .context("The service did not provide a revised document")?;
                let bytes = client.download_artifact(&reference).await?;
                tokio::fs::write(path, &bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("  {} Saved {}", style("\u{2713}").green(), path.display());
            }
        }
        Some(ViewState::Error { message }) => {
            anyhow::bail!("Job {} failed: {}", job_id, message);
        }
        Some(ViewState::Idle { error: Some(message) }) => anyhow::bail!(message),
        Some(other) => anyhow::bail!("Analysis stopped unexpectedly: {:?}", other),
        None => anyhow::bail!("Controller closed before the analysis finished"),
    }

    Ok(())
}

/// Mirror view states on the spinner until nothing more will change
async fn follow(adapter: &mut PresentationAdapter, spinner: &ProgressBar) -> Option<ViewState> {
    let mut view = adapter.current();
    loop {
        if let ViewState::Working { status } = &view {
            spinner.set_message(format!("Analysing ({})", status));
        }
        if view.is_settled() {
            return Some(view);
        }
        view = adapter.next().await?;
    }
}

fn print_report(view: &ReportView) {
    let report = &view.report;
    println!();
    if let Some(name) = &report.file_name {
        println!("  {} {}", style("File:").bold(), name);
    }
    if let Some(date) = &report.analysed_at {
        println!("  {} {}", style("Analysed:").bold(), date);
    }
    println!(
        "  {} {} clauses, {} issues\n",
        style("Summary:").bold(),
        view.clauses.len(),
        view.total_issues()
    );

    for clause in &report.clauses {
        let marker = if clause.has_issues() {
            style("\u{2717}").red()
        } else {
            style("\u{2713}").green()
        };
        println!("  {} {} {}", marker, style(&clause.id).cyan(), style(&clause.title).bold());
        for issue in &clause.issues {
            let rule = issue.rule_name.as_deref().unwrap_or(&issue.rule_id);
            println!("      [{}] {}", style(rule).yellow(), issue.comment);
            if !issue.excerpt.is_empty() {
                println!("        {}", style(format!("\"{}\"", issue.excerpt)).dim());
            }
        }
    }

    if !report.global_issues.is_empty() {
        println!("\n  {}", style("Document-wide issues").bold());
        for issue in &report.global_issues {
            println!("      [{}] {}", style(&issue.rule_id).yellow(), issue.comment);
        }
    }
}
