//! Standard extraction command.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::services::{StandardKind, StandardsExtractor};

/// Build a standard JSON from a standard PDF.
pub async fn cmd_extract_standard(
    settings: &Settings,
    pdf: &Path,
    output: Option<&Path>,
    kind: &str,
) -> anyhow::Result<()> {
    let kind: StandardKind = kind.parse()?;
    let Some(client) = settings.hf_client() else {
        anyhow::bail!("A Hugging Face token is required (set HF_TOKEN or huggingface.token)");
    };
    let output = output.unwrap_or(&settings.standard_file);

    println!(
        "{} Extracting requirements from {}",
        style("→").cyan(),
        pdf.display()
    );

    let standard = StandardsExtractor::new(client)
        .process_to_file(pdf, output, kind)
        .await?;

    for (param, requirement) in standard.iter() {
        if requirement.is_empty() {
            println!("  {} {:<25} {}", style("✗").red(), param, style("no answer").dim());
        } else {
            println!("  {} {:<25} {}", style("✓").green(), param, requirement);
        }
    }
    println!(
        "{} Wrote {} requirements to {}",
        style("✓").green(),
        standard.len(),
        output.display()
    );
    Ok(())
}
