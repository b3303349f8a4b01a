//! Environment check command.

use console::style;

use crate::config::{Settings, AZURE_ENDPOINT_ENV};
use crate::ocr::TextExtractor;

fn install_hint(tool: &str) -> &'static str {
    match tool {
        "pdftotext" | "pdftoppm" => "apt install poppler-utils",
        "tesseract" => "apt install tesseract-ocr tesseract-ocr-eng",
        "gs" => "apt install ghostscript",
        _ => "",
    }
}

/// Report external tool availability and configuration.
pub async fn cmd_check(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("Tool Status").bold());
    println!("{}", "-".repeat(50));

    let tools = tokio::task::spawn_blocking(TextExtractor::check_tools).await?;
    let mut missing = Vec::new();
    for (tool, available) in &tools {
        let status = if *available {
            style("✓ found").green()
        } else {
            missing.push(tool.as_str());
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }

    if !missing.is_empty() {
        println!("\n{}", style("Install missing tools:").yellow());
        for tool in &missing {
            let hint = install_hint(tool);
            if !hint.is_empty() {
                println!("  {:<15} {}", tool, style(hint).dim());
            }
        }
    }

    println!("\n{}", style("Configuration").bold());
    println!("{}", "-".repeat(50));
    println!("  {:<15} {}", "data dir", settings.data_dir.display());

    let standard = if settings.standard_file.exists() {
        style("✓ found").green()
    } else {
        style("✗ not found").red()
    };
    println!(
        "  {:<15} {} {}",
        "standard",
        standard,
        style(settings.standard_file.display()).dim()
    );

    let hf = if settings.has_hf_token() {
        style("✓ configured").green()
    } else {
        style("- heuristic only").yellow()
    };
    println!("  {:<15} {}", "hf token", hf);

    let azure = if settings.has_azure() {
        style("✓ configured".to_string()).green()
    } else {
        style(format!("- local only (set {})", AZURE_ENDPOINT_ENV)).dim()
    };
    println!("  {:<15} {}", "layout", azure);

    for (dir, exists) in settings.storage().directory_status() {
        let mark = if exists {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {:<15} {} {}", "", mark, dir);
    }
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_hint() {
        assert_eq!(install_hint("pdftoppm"), "apt install poppler-utils");
        assert!(install_hint("tesseract").contains("tesseract-ocr"));
        assert_eq!(install_hint("unknown"), "");
    }
}
