mod cli;
mod output;
mod terminal;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use pdfsum_core::config::{load_dotenv, Config};
use pdfsum_ingest::ExtractedDocument;
use pdfsum_pipeline::{ModelSet, Orchestrator, PipelineRun};
use tracing::info;

use crate::cli::{CliArgs, Command};
use crate::terminal::Terminal;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let config = match args.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };
    config.log_summary();

    let terminal = Terminal::new();

    match args.command.unwrap_or(Command::Interactive) {
        Command::Summarize { pdf, output } => {
            let orchestrator = build_orchestrator(&config).await;
            let run = summarize(&terminal, &orchestrator, &pdf).await?;
            let summary = run.summary.unwrap_or_default();
            terminal.print_summary(&summary)?;
            if let Some(path) = output {
                output::save_summary(&path, &summary)?;
                terminal.print_info(&format!("Summary saved to {}", path.display()))?;
            }
        }
        Command::Extract { pdf } => {
            // Extraction never touches a model backend.
            let orchestrator = Orchestrator::from_config(&config, ModelSet::default());
            let doc = orchestrator
                .extract(&pdf)
                .await
                .with_context(|| format!("failed to extract '{}'", pdf.display()))?;
            print_extraction(&terminal, &doc)?;
        }
        Command::Interactive => {
            let orchestrator = build_orchestrator(&config).await;
            interactive(&terminal, &orchestrator).await?;
        }
    }

    Ok(())
}

async fn build_orchestrator(config: &Config) -> Orchestrator {
    let models = ModelSet::initialize(config).await;
    Orchestrator::from_config(config, models)
}

async fn summarize(terminal: &Terminal, orchestrator: &Orchestrator, pdf: &Path) -> Result<PipelineRun> {
    let spinner = terminal.start_spinner(&format!("Summarizing {}...", pdf.display()))?;
    let result = orchestrator.run(pdf).await;
    spinner.stop();

    let run = result?;
    for note in &run.notes {
        terminal.print_warning(note)?;
    }
    Ok(run)
}

/// Prompt loop. A failure on one file is reported and the loop continues.
async fn interactive(terminal: &Terminal, orchestrator: &Orchestrator) -> Result<()> {
    let status = orchestrator.models().status();
    terminal.print_banner(status.translation, status.summarization)?;

    while let Some(input) = terminal.read_pdf_path()? {
        let pdf = PathBuf::from(&input);
        let summary = match summarize(terminal, orchestrator, &pdf).await {
            Ok(run) => run.summary.unwrap_or_default(),
            Err(e) => {
                terminal.print_error(&e.to_string())?;
                continue;
            }
        };
        terminal.print_summary(&summary)?;

        if terminal.confirm("Save the summary to a file?")? {
            let default_name = pdfsum_core::summary_filename(&input);
            let answer = terminal
                .prompt(&format!("Output file [{default_name}]: "))?
                .unwrap_or_default();
            let path = output::resolve_output(&answer, &pdf);
            match output::save_summary(&path, &summary) {
                Ok(()) => terminal.print_info(&format!("Summary saved to {}", path.display()))?,
                Err(e) => terminal.print_error(&format!("{e:#}"))?,
            }
        }
    }

    info!("interactive session ended");
    terminal.print_info("Goodbye.")?;
    Ok(())
}

fn print_extraction(terminal: &Terminal, doc: &ExtractedDocument) -> Result<()> {
    terminal.print_info(&format!(
        "{}: {} pages, {} characters via {:?} extraction",
        doc.filename,
        doc.page_count,
        doc.total_chars(),
        doc.method
    ))?;
    if let Some(ocr) = &doc.ocr {
        terminal.print_info(&format!(
            "OCR: {} pages rendered, {} empty, {} failed",
            ocr.rendered_pages, ocr.empty_pages, ocr.failed_pages
        ))?;
    }
    if doc.decrypted_with_empty_password {
        terminal.print_warning("document was encrypted and opened with an empty password")?;
    }
    println!("{}", doc.full_text());
    Ok(())
}
