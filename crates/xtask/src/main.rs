use std::path::{Path, PathBuf};

use anyhow::Context;
use regex_lite::Regex;
use serde::Deserialize;

/// The domain crate stays synchronous and deterministic.
const DOMAIN_PACKAGE: &str = "storyweb-domain";
const FORBIDDEN_DOMAIN_DEPS: &[&str] = &[
    "tokio",
    "rand",
    "reqwest",
    "rodio",
    "async-trait",
    "futures-util",
    "tracing-subscriber",
    "storyweb-player",
];

#[derive(Debug, Deserialize)]
struct Metadata {
    packages: Vec<Package>,
}

#[derive(Debug, Deserialize)]
struct Package {
    name: String,
    manifest_path: PathBuf,
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
struct Dependency {
    name: String,
    kind: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("arch-check") => arch_check(),
        Some(cmd) => anyhow::bail!("Unknown xtask command: {cmd}"),
        None => anyhow::bail!("Usage: cargo xtask <command>\n\nCommands:\n  arch-check"),
    }
}

fn arch_check() -> anyhow::Result<()> {
    let output = std::process::Command::new("cargo")
        .args(["metadata", "--format-version", "1", "--no-deps"])
        .output()
        .context("running cargo metadata")?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed")
    }

    let metadata: Metadata =
        serde_json::from_slice(&output.stdout).context("parsing cargo metadata")?;
    let domain = metadata
        .packages
        .iter()
        .find(|package| package.name == DOMAIN_PACKAGE)
        .with_context(|| format!("{DOMAIN_PACKAGE} not found in workspace"))?;

    let mut violations = forbidden_dependencies(domain);
    let src = domain
        .manifest_path
        .parent()
        .map(|dir| dir.join("src"))
        .context("domain manifest has no parent directory")?;
    violations.extend(forbidden_paths(&src)?);

    if violations.is_empty() {
        println!("arch-check: {DOMAIN_PACKAGE} is runtime-free");
        return Ok(());
    }
    for violation in &violations {
        eprintln!("arch-check: {violation}");
    }
    anyhow::bail!("{} architecture violation(s)", violations.len())
}

fn forbidden_dependencies(package: &Package) -> Vec<String> {
    package
        .dependencies
        .iter()
        .filter(|dep| dep.kind.as_deref() != Some("dev"))
        .filter(|dep| FORBIDDEN_DOMAIN_DEPS.contains(&dep.name.as_str()))
        .map(|dep| format!("{} depends on {}", package.name, dep.name))
        .collect()
}

fn forbidden_paths(dir: &Path) -> anyhow::Result<Vec<String>> {
    let pattern = Regex::new(r"\b(tokio|rand|reqwest|rodio)::").context("compiling path pattern")?;
    let mut violations = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).with_context(|| format!("reading {}", dir.display()))? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some("rs") {
                continue;
            }
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            for (number, line) in source.lines().enumerate() {
                if pattern.is_match(line) {
                    violations.push(format!("{}:{} uses {}", path.display(), number + 1, line.trim()));
                }
            }
        }
    }
    Ok(violations)
}
