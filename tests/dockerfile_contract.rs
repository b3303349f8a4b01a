//! Checks on the container build recipe and the files it ships.

use std::fs;
use std::path::{Path, PathBuf};

use docverify::models::Standard;
use docverify::services::extraction::PARAMETER_KEYWORDS;

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn dockerfile() -> String {
    fs::read_to_string(repo_root().join("Dockerfile")).expect("read Dockerfile")
}

/// Instruction lines with `\` continuations joined.
fn instructions(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if current.is_empty() && (trimmed.is_empty() || trimmed.starts_with('#')) {
            continue;
        }
        match trimmed.strip_suffix('\\') {
            Some(part) => {
                current.push_str(part.trim());
                current.push(' ');
            }
            None => {
                current.push_str(trimmed);
                out.push(std::mem::take(&mut current));
            }
        }
    }
    out
}

fn copy_sources(instruction: &str) -> Option<Vec<String>> {
    let rest = instruction.strip_prefix("COPY ")?;
    if rest.contains("--from=") {
        return None;
    }
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    Some(
        tokens[..tokens.len() - 1]
            .iter()
            .map(|s| s.trim_matches('"').to_string())
            .collect(),
    )
}

#[test]
fn test_copy_sources_exist() {
    let root = repo_root();
    let mut missing = Vec::new();
    for instruction in instructions(&dockerfile()) {
        let Some(sources) = copy_sources(&instruction) else {
            continue;
        };
        for src in sources {
            assert!(!src.contains('*'), "COPY source must not be a glob: {}", src);
            if !root.join(Path::new(&src)).exists() {
                missing.push(src);
            }
        }
    }
    assert!(
        missing.is_empty(),
        "Dockerfile COPY sources must exist:\n{}",
        missing.join("\n")
    );
}

#[test]
fn test_manifest_copied_and_fetched_before_source() {
    let instructions = instructions(&dockerfile());
    let position = |pred: &dyn Fn(&str) -> bool| {
        instructions
            .iter()
            .position(|i| pred(i.as_str()))
            .expect("instruction present")
    };

    let manifest = position(&|i| i == "COPY Cargo.toml Cargo.lock ./");
    let fetch = position(&|i| i.starts_with("RUN ") && i.contains("cargo fetch --locked"));
    let source = position(&|i| i.starts_with("COPY src "));
    assert!(manifest < fetch, "lockfile must be copied before fetching");
    assert!(fetch < source, "dependencies must be fetched before source is copied");

    let build = position(&|i| i.contains("cargo build"));
    assert!(instructions[build].contains("--locked"));
}

#[test]
fn test_base_images_pinned() {
    let mut violations = Vec::new();
    for instruction in instructions(&dockerfile()) {
        let Some(rest) = instruction.strip_prefix("FROM ") else {
            continue;
        };
        let image = rest.split_whitespace().next().expect("FROM image");
        if image.ends_with(":latest") || !image.contains(':') {
            violations.push(image.to_string());
        }
    }
    assert!(
        violations.is_empty(),
        "base images must carry a fixed tag: {:?}",
        violations
    );
}

#[test]
fn test_process_flags_present() {
    let content = dockerfile();
    assert!(content.contains("CARGO_INCREMENTAL=0"));
    assert!(content.contains("DOCVERIFY_LOG_UNBUFFERED=1"));
    assert!(content.contains(docverify::logging::UNBUFFERED_ENV));
}

#[test]
fn test_serves_on_port_8000() {
    let instructions = instructions(&dockerfile());
    assert!(instructions.iter().any(|i| i == "EXPOSE 8000"));

    let cmd = instructions
        .iter()
        .rev()
        .find(|i| i.starts_with("CMD "))
        .expect("CMD present");
    assert_eq!(
        cmd,
        r#"CMD ["docverify", "serve", "--bind", "0.0.0.0:8000"]"#
    );
}

#[test]
fn test_runtime_packages_installed() {
    let content = dockerfile();
    for package in [
        "poppler-utils",
        "ghostscript",
        "tesseract-ocr",
        "tesseract-ocr-eng",
        "libjpeg62-turbo",
        "libpng16-16",
        "libtiff6",
        "zlib1g",
    ] {
        assert!(content.contains(package), "missing package {}", package);
    }
}

#[test]
fn test_shipped_standard_covers_every_parameter() {
    let standard =
        Standard::load(&repo_root().join("standards/gso_honey_standard.json")).unwrap();
    assert_eq!(standard.len(), PARAMETER_KEYWORDS.len());
    for (param, _) in PARAMETER_KEYWORDS {
        let requirement = standard.requirement(param).unwrap_or_default();
        assert!(!requirement.is_empty(), "no requirement for {}", param);
    }
}

#[test]
fn test_instruction_joining() {
    let joined = instructions("# comment\nRUN a \\\n    && b\n\nEXPOSE 8000\n");
    assert_eq!(joined, vec!["RUN a && b", "EXPOSE 8000"]);
}
