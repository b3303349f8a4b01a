//! Offline verification commands.

use std::path::{Path, PathBuf};

use console::style;

use crate::config::Settings;
use crate::models::VerificationReport;

/// Extract, verify and certify PDFs from the command line.
pub async fn cmd_verify(
    settings: &Settings,
    files: &[PathBuf],
    json: bool,
    certify: bool,
) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let verifier = settings.verifier()?;
    let processor = settings.document_processor();
    let storage = settings.storage();
    let certificates = settings.certificate_generator();

    let mut failures = 0usize;
    for file in files {
        let name = display_name(file);
        let bytes = match tokio::fs::read(file).await {
            Ok(b) => b,
            Err(e) => {
                println!("{} {}: {}", style("✗").red(), name, e);
                failures += 1;
                continue;
            }
        };

        let doc = match processor.process_pdf(&bytes).await {
            Ok(doc) => doc,
            Err(e) => {
                println!("{} {}: {}", style("✗").red(), name, e);
                failures += 1;
                continue;
            }
        };
        let parameter_file = storage.save_parameters(&name, &doc.parameters)?;
        tracing::debug!("Parameters for {} at {}", name, parameter_file.display());

        let report = verifier.verify_document(&doc).await;
        if !report.overall_compliant {
            failures += 1;
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!(
                "{} ({}, {} parameters found)",
                style(&name).bold(),
                doc.doc_type,
                doc.parameters.len()
            );
            print_report(&report);
        }

        if certify && report.overall_compliant {
            match certificates.generate(&name, &settings.standard_name(), &report) {
                Ok(Some(path)) => println!(
                    "  {} Certificate: {}",
                    style("→").cyan(),
                    path.display()
                ),
                Ok(None) => {}
                Err(e) => println!("  {} Certificate failed: {}", style("!").yellow(), e),
            }
        }
        println!();
    }

    if failures > 0 {
        anyhow::bail!("{} of {} document(s) did not pass", failures, files.len());
    }
    Ok(())
}

/// Verify a parameters JSON file written by a previous extraction.
pub async fn cmd_verify_json(settings: &Settings, file: &Path, json: bool) -> anyhow::Result<()> {
    let verifier = settings.verifier()?;
    let contents = tokio::fs::read_to_string(file).await?;
    let report = verifier.verify_json(&contents).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", style(display_name(file)).bold());
        print_report(&report);
    }

    if !report.overall_compliant {
        anyhow::bail!("{}", report.compliance_reason);
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_report(report: &VerificationReport) {
    for (param, result) in &report.parameter_results {
        let mark = if result.compliant {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {} {:<25} {}", mark, param, style(&result.message).dim());
    }

    let verdict = if report.overall_compliant {
        style("PASSED").green().bold()
    } else {
        style("FAILED").red().bold()
    };
    println!(
        "  {} {}/{} - {}",
        verdict,
        report.passed_count(),
        report.parameters_checked,
        report.compliance_reason
    );
}
