//! Minimal CLI: dump → (csharp | report)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::generator::{ClassCodeGenerator, GroupReport};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate deduplicated C# record declarations from type tree dumps
#[derive(Parser, Debug)]
#[command(name = "asset-class-gen", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// emit one C# file per input dump
    Csharp(CSharpOut),
    /// print the canonical groups of each input as JSON
    Report(ReportOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CSharpOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory; each input keeps its file name
    #[arg(short, long, default_value = "out")]
    out_dir: PathBuf,
}

#[derive(clap::Parser, Debug)]
struct ReportOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    groups: Vec<GroupReport>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Existing files only; directories are reported and skipped.
    fn source_files(&self) -> Result<Vec<PathBuf>> {
        let paths = resolve_file_path_patterns(&self.input)?;
        Ok(paths
            .into_iter()
            .filter(|path| {
                if path.is_dir() {
                    warn!(path = %path.display(), "skipping directory");
                    false
                } else {
                    true
                }
            })
            .collect())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Csharp(target) => {
                let sources = target.input_settings.source_files()?;
                std::fs::create_dir_all(&target.out_dir).with_context(|| {
                    format!("failed to create output directory {}", target.out_dir.display())
                })?;

                // one isolated generator per file
                let results: Vec<(PathBuf, Result<PathBuf>)> = sources
                    .par_iter()
                    .map(|source| (source.clone(), write_csharp(source, &target.out_dir)))
                    .collect();

                let mut failed = 0usize;
                for (source, result) in &results {
                    match result {
                        Ok(out) => {
                            eprintln!("{} {} → {}", "ok".green().bold(), source.display(), out.display());
                        }
                        Err(error) => {
                            failed += 1;
                            eprintln!("{} {}: {error:#}", "error".red().bold(), source.display());
                        }
                    }
                }
                finish(failed, results.len())
            }
            Command::Report(target) => {
                let sources = target.input_settings.source_files()?;
                let mut reports = Vec::new();
                let mut failed = 0usize;
                for source in &sources {
                    let groups = load_generator(source).and_then(|g| Ok(g.report()?));
                    match groups {
                        Ok(groups) => reports.push(FileReport {
                            file: source.to_string_lossy().to_string(),
                            groups,
                        }),
                        Err(error) => {
                            failed += 1;
                            eprintln!("{} {}: {error:#}", "error".red().bold(), source.display());
                        }
                    }
                }
                let report_src = serde_json::to_string_pretty(&reports)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &report_src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{report_src}");
                }
                finish(failed, sources.len())
            }
        }
    }
}

/// Read, parse and resolve one dump file.
pub fn load_generator(source: &Path) -> Result<ClassCodeGenerator> {
    let text = std::fs::read_to_string(source)
        .with_context(|| format!("failed to read {}", source.display()))?;
    let root = crate::dump::parse_dump(&text).context("failed to parse dump")?;
    let generator = ClassCodeGenerator::new(&root).context("failed to generate classes")?;
    info!(
        file = %source.display(),
        nodes = generator.tree().len(),
        types = generator.groups().len(),
        "resolved type tree"
    );
    Ok(generator)
}

fn write_csharp(source: &Path, out_dir: &Path) -> Result<PathBuf> {
    let generator = load_generator(source)?;
    let code = generator.to_code_string()?;
    let file_name = source
        .file_name()
        .with_context(|| format!("input has no file name: {}", source.display()))?;
    let out = out_dir.join(file_name);
    std::fs::write(&out, code).with_context(|| format!("failed to write {}", out.display()))?;
    Ok(out)
}

fn finish(failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        bail!("{failed} of {total} inputs failed");
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
