use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgGroup, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use plagdet_core::config::{Config, Settings};
use plagdet_core::corpus::load_corpus_dir;
use plagdet_core::error::Error;
use plagdet_core::types::CandidateDocument;
use plagdet_detect::Detector;

const EXIT_FAILURE: u8 = 1;
const EXIT_UNAVAILABLE: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "plagdet", version, about = "Hybrid semantic/lexical plagiarism checker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare a source document against candidate documents
    Check(CheckArgs),
    /// Print the effective merged settings as JSON
    Config,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("inputs").required(true).multiple(true).args(["candidates", "corpus"])))]
struct CheckArgs {
    /// Source text file, or `-` for stdin
    source: PathBuf,
    /// JSON array of candidate documents
    #[arg(long)]
    candidates: Option<PathBuf>,
    /// Directory of `.txt` files to use as candidates
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// Similarity threshold for this run, overriding detection.similarity_threshold
    #[arg(long)]
    threshold: Option<f64>,
    #[arg(long)]
    pretty: bool,
    #[arg(long)]
    no_progress: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match Config::load().and_then(|c| c.settings()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    init_tracing(&settings.logging.level);

    let outcome = match cli.command {
        Command::Check(args) => check(args, settings),
        Command::Config => print_json(&settings, true),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "plagdet failed");
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_env("PLAGDET_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<Error>() {
        Some(e) if e.is_unavailable() => EXIT_UNAVAILABLE,
        _ => EXIT_FAILURE,
    }
}

fn check(args: CheckArgs, settings: Settings) -> anyhow::Result<()> {
    let source = read_source(&args.source)?;
    let candidates = gather_candidates(args.candidates.as_deref(), args.corpus.as_deref())?;
    info!(candidates = candidates.len(), "loaded candidates");

    let detector = Detector::from_settings(settings)?;
    let spinner = (!args.no_progress && std::io::stderr().is_terminal()).then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("comparing against {} candidates", candidates.len()));
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    });

    let runtime = tokio::runtime::Runtime::new()?;
    let outcome = runtime.block_on(detector.detect(&source, &candidates, args.threshold));
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    print_json(&outcome?, args.pretty)
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("Failed to read source from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read source {}", path.display()))
}

fn gather_candidates(file: Option<&Path>, corpus: Option<&Path>) -> anyhow::Result<Vec<CandidateDocument>> {
    let mut out = Vec::new();
    if let Some(file) = file {
        let raw = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
        let parsed: Vec<CandidateDocument> =
            serde_json::from_str(&raw).with_context(|| format!("{} is not a JSON array of candidates", file.display()))?;
        out.extend(parsed);
    }
    if let Some(dir) = corpus {
        out.extend(load_corpus_dir(dir)?);
    }
    Ok(out)
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let text = if pretty { serde_json::to_string_pretty(value)? } else { serde_json::to_string(value)? };
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_requires_a_candidate_source() {
        assert!(Cli::try_parse_from(["plagdet", "check", "essay.txt"]).is_err());
        let cli = Cli::try_parse_from(["plagdet", "check", "essay.txt", "--corpus", "refs", "--threshold", "0.7"]).unwrap();
        match cli.command {
            Command::Check(args) => {
                assert_eq!(args.corpus, Some(PathBuf::from("refs")));
                assert_eq!(args.threshold, Some(0.7));
            }
            Command::Config => panic!("expected check"),
        }
    }

    #[test]
    fn unavailable_detector_maps_to_exit_3() {
        let e = anyhow::Error::new(Error::NotInitialized("no provider".into()));
        assert_eq!(exit_code(&e), EXIT_UNAVAILABLE);
        let e = anyhow::Error::new(Error::InvalidConfig("bad".into()));
        assert_eq!(exit_code(&e), EXIT_FAILURE);
    }

    #[test]
    fn candidates_merge_file_and_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("c.json");
        std::fs::write(&file, r#"[{"id":"a","content":"alpha"},{"title":"no id"}]"#).unwrap();
        let corpus = dir.path().join("corpus");
        std::fs::create_dir(&corpus).unwrap();
        std::fs::write(corpus.join("b.txt"), "beta").unwrap();

        let all = gather_candidates(Some(&file), Some(&corpus)).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].id.as_deref(), Some("b"));
    }
}
