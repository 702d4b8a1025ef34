//! PDF Unstamp CLI tool
//!
//! A command-line tool for scanning PDFs for authoring-tool watermarks and
//! writing cleaned copies.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use std::path::PathBuf;
use std::process;

use pdf_unstamp::{CleanConfig, ScanOutcome, TargetKind, WatermarkDetector, WatermarkRemover};

/// PDF Unstamp - Detect and remove authoring-tool watermarks
#[derive(Parser)]
#[command(name = "pdf-unstamp")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Report watermark artifacts without modifying anything
    pdf-unstamp scan deck.pdf

    # Clean a single file to an explicit output path
    pdf-unstamp clean deck.pdf -o deck-clean.pdf

    # Clean every export in a folder into outputs/
    pdf-unstamp clean --output-dir outputs \"exports/*.pdf\"

    # Clean against a different issuer domain
    pdf-unstamp clean deck.pdf -o clean.pdf --domain othertool.io")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a PDF and report watermark removal targets
    Scan {
        /// PDF file to scan
        input: PathBuf,

        /// Watermark issuer domain(s) to match (default: gamma.app)
        #[arg(long)]
        domain: Vec<String>,
    },

    /// Remove watermark artifacts and write cleaned PDFs
    Clean {
        /// Input PDF files. Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path (single input only)
        #[arg(short, long, conflicts_with = "output_dir")]
        output: Option<PathBuf>,

        /// Directory for cleaned files, written as processed_<name>.pdf
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Watermark issuer domain(s) to match (default: gamma.app)
        #[arg(long)]
        domain: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan { input, domain } => cmd_scan(input, domain),
        Commands::Clean { inputs, output, output_dir, domain } => {
            cmd_clean(inputs, output, output_dir, domain)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Build a configuration from CLI domain overrides
fn build_config(domains: Vec<String>) -> CleanConfig {
    if domains.is_empty() {
        CleanConfig::default()
    } else {
        CleanConfig {
            domains,
            ..CleanConfig::default()
        }
    }
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = false;
            for entry in glob(&pattern).context("invalid glob pattern")? {
                match entry {
                    Ok(path) => {
                        paths.push(path);
                        matched = true;
                    }
                    Err(e) => eprintln!("Warning: glob error for {}: {}", pattern, e),
                }
            }
            if !matched {
                bail!("No files matched pattern: {}", pattern);
            }
        } else {
            // No glob characters, treat as literal path
            paths.push(PathBuf::from(pattern));
        }
    }

    // Sort paths for consistent ordering
    paths.sort();

    Ok(paths)
}

/// Scan a PDF and print what would be removed
fn cmd_scan(input: PathBuf, domains: Vec<String>) -> Result<()> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    let detector = WatermarkDetector::with_config(build_config(domains));
    let outcome = detector
        .identify_watermarks(&input)
        .with_context(|| format!("failed to scan {}", input.display()))?;

    match outcome {
        ScanOutcome::Clean => {
            println!("{}: no watermark artifacts found", input.display());
        }
        ScanOutcome::Found(targets) => {
            println!("{}: {} removal target(s)", input.display(), targets.len());
            for target in targets {
                match target.kind {
                    TargetKind::Image => println!(
                        "  image object {} {} on {} page(s)",
                        target.object_id.0,
                        target.object_id.1,
                        target.page_ids.len()
                    ),
                    TargetKind::Link => println!(
                        "  link annotation {} {}",
                        target.object_id.0, target.object_id.1
                    ),
                }
            }
        }
    }

    Ok(())
}

/// Clean one or more PDFs
fn cmd_clean(
    inputs: Vec<String>,
    output: Option<PathBuf>,
    output_dir: PathBuf,
    domains: Vec<String>,
) -> Result<()> {
    let inputs = expand_globs(inputs)?;

    for path in &inputs {
        if !path.exists() {
            bail!("Input file not found: {}", path.display());
        }
    }

    if output.is_some() && inputs.len() != 1 {
        bail!("--output requires exactly one input file");
    }

    let config = build_config(domains);
    let detector = WatermarkDetector::with_config(config.clone());
    let remover = WatermarkRemover::with_config(config);

    for input in &inputs {
        let outcome = detector
            .identify_watermarks(input)
            .with_context(|| format!("failed to scan {}", input.display()))?;

        if outcome.is_clean() {
            eprintln!("{}: watermarks not found, skipping", input.display());
            continue;
        }

        let output_path = match &output {
            Some(path) => path.clone(),
            None => {
                let name = input
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "output.pdf".to_string());
                output_dir.join(format!("processed_{}", name))
            }
        };

        let stats = remover
            .clean_pdf_from_target_domain(input, &output_path)
            .with_context(|| format!("failed to clean {}", input.display()))?;

        eprintln!(
            "{}: removed {} element(s) (images: {}, links: {}) -> {}",
            input.display(),
            stats.total(),
            stats.images_removed,
            stats.links_removed,
            output_path.display()
        );
    }

    Ok(())
}
