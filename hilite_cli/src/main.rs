//! # hilite
//!
//! Command-line front-end for the tokenizer engine: tokenize a file, check a
//! grammar document, list the built-in grammars, batch-tokenize a directory.

use clap::{Args, Parser, Subcommand, ValueEnum};
use hilite_engine::config::compile_time::batch_processing::MAX_WORKER_THREADS;
use hilite_engine::grammar::{load_grammar_file, Grammar, GrammarRegistry};
use hilite_engine::logging::ProcessingSummary;
use hilite_engine::tokenizer::{tokenize_file_result, BracketKind, TokenizedDocument};
use hilite_engine::utils::SourceMap;
use hilite_engine::{batch, file_processor, logging, StateStack};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "hilite")]
#[command(version)]
#[command(about = "Line-oriented lexical tokenizer driven by state-machine grammars")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Where the grammar comes from: a document on disk or a built-in name
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct GrammarSource {
    /// Grammar document (.toml or .json)
    #[arg(long, short = 'g')]
    grammar: Option<PathBuf>,

    /// Built-in grammar name or alias
    #[arg(long, short = 'l')]
    language: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize one file and print its spans
    Tokenize {
        file: PathBuf,

        #[command(flatten)]
        source: GrammarSource,

        #[arg(long, short = 'f', value_enum, default_value = "text")]
        format: OutputFormat,

        /// Render every unmatched span with its source line
        #[arg(long)]
        report_unmatched: bool,
    },

    /// Load and validate a grammar document
    Check {
        grammar: PathBuf,

        #[arg(long, short = 'f', value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the built-in grammars
    Languages,

    /// Tokenize every matching file under a directory
    Batch {
        directory: PathBuf,

        #[command(flatten)]
        source: GrammarSource,

        /// Only files with this extension (repeatable)
        #[arg(long, short = 'e')]
        extension: Vec<String>,

        /// Worker threads (default: available cores)
        #[arg(long, short = 't')]
        threads: Option<usize>,

        #[arg(long)]
        sequential: bool,

        /// Don't search subdirectories
        #[arg(long)]
        no_recursive: bool,

        #[arg(long)]
        max_files: Option<usize>,

        /// Stop at the first file that fails
        #[arg(long)]
        fail_fast: bool,

        /// Suppress progress reporting
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    logging::init_global_logging()?;
    hilite_engine::init_subsystems()?;
    log::debug!("logging initialized");

    match cli.command {
        Commands::Tokenize {
            file,
            source,
            format,
            report_unmatched,
        } => cmd_tokenize(&file, &source, format, report_unmatched),
        Commands::Check { grammar, format } => cmd_check(&grammar, format),
        Commands::Languages => cmd_languages(),
        Commands::Batch {
            directory,
            source,
            extension,
            threads,
            sequential,
            no_recursive,
            max_files,
            fail_fast,
            quiet,
        } => {
            let config = build_batch_config(
                &extension,
                threads,
                sequential,
                no_recursive,
                max_files,
                fail_fast,
                quiet,
            );
            cmd_batch(&directory, &source, &config)
        }
    }
}

fn resolve_grammar(source: &GrammarSource) -> CliResult<Arc<Grammar>> {
    match (&source.grammar, &source.language) {
        (Some(path), _) => {
            log::info!("loading grammar from {}", path.display());
            Ok(Arc::new(load_grammar_file(path)?))
        }
        (None, Some(name)) => {
            let registry = GrammarRegistry::with_builtins()?;
            Ok(registry.require(name)?)
        }
        (None, None) => Err("one of --grammar or --language is required".into()),
    }
}

// ============================================================================
// TOKENIZE
// ============================================================================

fn cmd_tokenize(
    file: &Path,
    source: &GrammarSource,
    format: OutputFormat,
    report_unmatched: bool,
) -> CliResult<()> {
    let grammar = resolve_grammar(source)?;
    let file_result = file_processor::process_file(file)?;
    let document = tokenize_file_result(Arc::clone(&grammar), &file_result)?;

    match format {
        OutputFormat::Text => print!("{}", render_text(&document)),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&JsonDocument::from_document(&document))?)
        }
    }

    if report_unmatched {
        let reports = render_unmatched(&document, &file_result.source);
        for report in &reports {
            eprint!("{}", report);
        }
        log::info!("{} unmatched spans", reports.len());
    }

    Ok(())
}

/// One `line:col-col kind "text"` row per span
fn render_text(document: &TokenizedDocument) -> String {
    let mut output = String::new();
    for line in document.lines() {
        for token in line.tokens() {
            output.push_str(&format!("{} {:?}\n", token, token.text(line.text())));
        }
    }
    output
}

fn render_unmatched(document: &TokenizedDocument, source: &str) -> Vec<String> {
    let source_map = SourceMap::new(source.to_string());
    let default_token = document.grammar().default_token().as_str();
    let message = format!("input not matched by grammar '{}'", document.grammar().name());

    document
        .tokens()
        .filter(|token| token.is_kind(default_token))
        .map(|token| source_map.format_error(&token.span, &message))
        .collect()
}

#[derive(Serialize)]
struct JsonToken<'a> {
    start: usize,
    end: usize,
    kind: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bracket: Option<BracketKind>,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    line: usize,
    tokens: Vec<JsonToken<'a>>,
    end_state: &'a StateStack,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    grammar: &'a str,
    lines: Vec<JsonLine<'a>>,
}

impl<'a> JsonDocument<'a> {
    fn from_document(document: &'a TokenizedDocument) -> Self {
        let lines = document
            .lines()
            .iter()
            .enumerate()
            .map(|(index, line)| JsonLine {
                line: index + 1,
                tokens: line
                    .tokens()
                    .iter()
                    .map(|token| JsonToken {
                        start: token.span.start.offset,
                        end: token.span.end.offset,
                        kind: token.kind.as_str(),
                        text: token.text(line.text()),
                        bracket: token.bracket,
                    })
                    .collect(),
                end_state: line.end_state(),
            })
            .collect();

        Self {
            grammar: document.grammar().name(),
            lines,
        }
    }
}

// ============================================================================
// CHECK / LANGUAGES
// ============================================================================

fn cmd_check(path: &Path, format: OutputFormat) -> CliResult<()> {
    let grammar = load_grammar_file(path)?;
    let summary = grammar.summary();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => {
            println!("Grammar '{}' is valid", summary.name);
            println!("  Initial state: {}", summary.initial);
            println!("  Default token: {}", summary.default_token);
            println!("  Ignore case: {}", summary.ignore_case);
            println!(
                "  States: {} ({} rules)",
                summary.states.len(),
                summary.rule_count
            );
            for state in &summary.states {
                println!("    {}: {} rules", state.name, state.rules);
            }
            println!("  Bracket pairs: {}", summary.bracket_pairs);
            println!("  Token kinds: {}", summary.token_kinds.join(", "));
            if !summary.unreachable_states.is_empty() {
                println!(
                    "  Unreachable states: {}",
                    summary.unreachable_states.join(", ")
                );
            }
        }
    }

    Ok(())
}

fn cmd_languages() -> CliResult<()> {
    let registry = GrammarRegistry::with_builtins()?;

    println!("Built-in grammars:");
    for name in registry.names() {
        let Some(grammar) = registry.get(name) else {
            continue;
        };
        let aliases = registry.aliases_of(name);
        let alias_note = if aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", aliases.join(", "))
        };
        println!(
            "  {}{}: {} states, {} rules",
            name,
            alias_note,
            grammar.state_count(),
            grammar.rule_count()
        );
    }

    Ok(())
}

// ============================================================================
// BATCH
// ============================================================================

fn build_batch_config(
    extensions: &[String],
    threads: Option<usize>,
    sequential: bool,
    no_recursive: bool,
    max_files: Option<usize>,
    fail_fast: bool,
    quiet: bool,
) -> batch::BatchConfig {
    let max_threads = if sequential {
        1
    } else {
        threads
            .unwrap_or_else(num_cpus::get)
            .clamp(1, MAX_WORKER_THREADS)
    };

    let config = batch::BatchConfig {
        max_threads,
        recursive: !no_recursive,
        extensions: Vec::new(),
        max_files,
        progress_reporting: !quiet,
        fail_fast,
    };

    extensions
        .iter()
        .fold(config, |config, ext| config.with_extension(ext))
}

fn cmd_batch(directory: &Path, source: &GrammarSource, config: &batch::BatchConfig) -> CliResult<()> {
    let grammar = resolve_grammar(source)?;

    if config.progress_reporting {
        println!("Starting batch tokenization: {}", directory.display());
        println!(
            "Configuration: grammar={}, {} threads, recursive={}, fail_fast={}",
            grammar.name(),
            config.max_threads,
            config.recursive,
            config.fail_fast
        );
    }

    let results = batch::process_directory(directory, grammar, config)?;
    print_batch_results(&results);
    if let Some(diagnostics) = render_diagnostics(&logging::processing_summary()) {
        print!("{}", diagnostics);
    }

    if results.failure_count() > 0 {
        if logging::config::use_cargo_style_output() {
            if let Some(report) = logging::format_cargo_style_summary() {
                eprint!("{}", report);
            }
        }
        return Err(format!("{} of {} files failed", results.failure_count(), results.files_processed).into());
    }

    Ok(())
}

/// Per-file error and warning counts gathered by the logging layer. `None`
/// before logging is initialized or when no file was processed.
fn render_diagnostics(summary: &ProcessingSummary) -> Option<String> {
    if summary.files == 0 {
        return None;
    }

    let mut output = String::from("\nDiagnostics:\n");
    output.push_str(&format!(
        "  Files: {} clean, {} with warnings, {} with errors\n",
        summary.clean_files, summary.files_with_warnings, summary.files_with_errors
    ));
    if summary.has_errors() || summary.has_warnings() {
        output.push_str(&format!(
            "  Logged: {} errors, {} warnings\n",
            summary.total_errors, summary.total_warnings
        ));
    }
    Some(output)
}

fn print_batch_results(results: &batch::BatchResults) {
    println!("Batch Tokenization Summary:");
    println!("  Files discovered: {}", results.files_discovered);
    println!("  Files processed: {}", results.files_processed);
    println!(
        "  Successful: {} ({:.1}%)",
        results.success_count(),
        results.success_rate() * 100.0
    );
    println!("  Failed: {}", results.failure_count());
    println!(
        "  Tokens: {} ({} unmatched)",
        results.total_tokens(),
        results.total_unmatched()
    );
    println!(
        "  Total time: {:.2}s",
        results.processing_duration.as_secs_f64()
    );

    let seconds = results.processing_duration.as_secs_f64();
    if seconds > 0.0 && !results.successful_files.is_empty() {
        let total_bytes: u64 = results
            .successful_files
            .iter()
            .map(|(_, stats)| stats.size_bytes)
            .sum();
        println!(
            "  Processing rate: {:.0} bytes/sec, {:.0} tokens/sec",
            total_bytes as f64 / seconds,
            results.total_tokens() as f64 / seconds
        );
    }

    if results.failure_count() > 0 {
        println!("\nFailed Files:");
        for (file_path, error) in &results.failed_files {
            println!("  {}: [{}] {}", file_path.display(), error.error_code(), error);
        }
    }

    if results.success_count() > 0 && results.success_count() <= 10 {
        println!("\nSuccessful Files:");
        for (file_path, stats) in &results.successful_files {
            println!(
                "  {}: {} lines, {} tokens, {} unmatched",
                file_path.display(),
                stats.lines,
                stats.tokens,
                stats.unmatched
            );
        }
    }
}
