//! Batch tokenization of source directories
//!
//! Documents are independent, so they are spread over worker threads that
//! share one compiled grammar. Each document is still tokenized line by line
//! on a single thread.

use crate::config::compile_time::batch_processing::{MAX_FILES_PER_BATCH, MAX_WORKER_THREADS};
use crate::file_processor::{FileProcessor, FileProcessorError};
use crate::grammar::Grammar;
use crate::logging::{self, codes};
use crate::tokenizer::{tokenize_file_result, TokenizeError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_threads: usize,
    pub recursive: bool,
    /// Lowercase extensions without the dot; empty accepts every file
    pub extensions: Vec<String>,
    pub max_files: Option<usize>,
    pub progress_reporting: bool,
    pub fail_fast: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_threads: thread::available_parallelism()
                .map(|n| n.get().min(8))
                .unwrap_or(4),
            recursive: true,
            extensions: Vec::new(),
            max_files: None,
            progress_reporting: true,
            fail_fast: false,
        }
    }
}

impl BatchConfig {
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extensions
            .push(extension.trim_start_matches('.').to_lowercase());
        self
    }

    fn worker_threads(&self) -> usize {
        self.max_threads.clamp(1, MAX_WORKER_THREADS)
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

/// Token counts for one tokenized file
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileTokenStats {
    pub lines: usize,
    pub tokens: usize,
    /// Spans carrying the grammar's default token
    pub unmatched: usize,
    pub size_bytes: u64,
    /// Whether the last line ended back in the initial state
    pub ends_in_initial_state: bool,
}

#[derive(Debug)]
pub struct BatchResults {
    pub successful_files: Vec<(PathBuf, FileTokenStats)>,
    pub failed_files: Vec<(PathBuf, FileTokenizeError)>,
    pub processing_duration: Duration,
    pub files_processed: usize,
    pub files_discovered: usize,
}

impl BatchResults {
    pub fn new() -> Self {
        Self {
            successful_files: Vec::new(),
            failed_files: Vec::new(),
            processing_duration: Duration::new(0, 0),
            files_processed: 0,
            files_discovered: 0,
        }
    }

    pub fn success_count(&self) -> usize {
        self.successful_files.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed_files.len()
    }

    pub fn success_rate(&self) -> f64 {
        if self.files_processed == 0 {
            0.0
        } else {
            self.successful_files.len() as f64 / self.files_processed as f64
        }
    }

    pub fn total_tokens(&self) -> usize {
        self.successful_files.iter().map(|(_, s)| s.tokens).sum()
    }

    pub fn total_unmatched(&self) -> usize {
        self.successful_files.iter().map(|(_, s)| s.unmatched).sum()
    }

    pub fn add_success(&mut self, file_path: PathBuf, stats: FileTokenStats) {
        self.successful_files.push((file_path, stats));
        self.files_processed += 1;
    }

    pub fn add_failure(&mut self, file_path: PathBuf, error: FileTokenizeError) {
        self.failed_files.push((file_path, error));
        self.files_processed += 1;
    }

    pub fn merge(&mut self, other: BatchResults) {
        self.successful_files.extend(other.successful_files);
        self.failed_files.extend(other.failed_files);
        self.files_processed += other.files_processed;
    }

    /// Order results by path so output does not depend on thread scheduling
    fn sort(&mut self) {
        self.successful_files.sort_by(|a, b| a.0.cmp(&b.0));
        self.failed_files.sort_by(|a, b| a.0.cmp(&b.0));
    }

    pub fn summary(&self) -> String {
        format!(
            "Batch tokenization completed: {} files processed, {} successful ({:.1}%), {} failed, {} tokens ({} unmatched), {:.2}s total",
            self.files_processed,
            self.success_count(),
            self.success_rate() * 100.0,
            self.failure_count(),
            self.total_tokens(),
            self.total_unmatched(),
            self.processing_duration.as_secs_f64()
        )
    }
}

impl Default for BatchResults {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a single file in a batch produced no tokens
#[derive(Debug, Clone, thiserror::Error)]
pub enum FileTokenizeError {
    #[error(transparent)]
    File(#[from] FileProcessorError),

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
}

impl FileTokenizeError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            FileTokenizeError::File(error) => error.error_code(),
            FileTokenizeError::Tokenize(error) => error.error_code(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("No matching files found in directory: {path}")]
    NoFilesFound { path: String },

    #[error("Worker thread failed: {message}")]
    ThreadFailure { message: String },

    #[error("Too many files found: {count} (max: {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("I/O error during directory traversal: {error}")]
    IoError { error: String },
}

impl BatchError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            BatchError::DirectoryNotFound { .. } => codes::batch::DIRECTORY_NOT_FOUND,
            BatchError::NoFilesFound { .. } => codes::batch::NO_FILES_FOUND,
            BatchError::ThreadFailure { .. } => codes::batch::THREAD_FAILURE,
            BatchError::TooManyFiles { .. } => codes::batch::TOO_MANY_FILES,
            BatchError::IoError { .. } => codes::file_processing::IO_ERROR,
        }
    }
}

// ============================================================================
// FILE DISCOVERY
// ============================================================================

/// Collect the files under `dir_path` the config accepts, sorted by path
pub fn discover_files(dir_path: &Path, config: &BatchConfig) -> Result<Vec<PathBuf>, BatchError> {
    crate::log_info!("Starting file discovery",
        "directory" => dir_path.display(),
        "recursive" => config.recursive
    );

    if !dir_path.is_dir() {
        let error = BatchError::DirectoryNotFound {
            path: dir_path.display().to_string(),
        };
        crate::log_error!(error.error_code(), "Batch directory not found",
            "directory" => dir_path.display()
        );
        return Err(error);
    }

    let mut files = Vec::new();
    visit_directory(dir_path, &mut files, config)?;

    if files.is_empty() {
        return Err(BatchError::NoFilesFound {
            path: dir_path.display().to_string(),
        });
    }

    if files.len() > MAX_FILES_PER_BATCH {
        let error = BatchError::TooManyFiles {
            count: files.len(),
            max: MAX_FILES_PER_BATCH,
        };
        crate::log_error!(error.error_code(), "Batch exceeds file limit",
            "files_found" => files.len(),
            "limit" => MAX_FILES_PER_BATCH
        );
        return Err(error);
    }

    files.sort();

    if let Some(max_files) = config.max_files {
        if files.len() > max_files {
            crate::log_warning!("Reached maximum file limit",
                "files_found" => files.len(),
                "limit" => max_files
            );
            files.truncate(max_files);
        }
    }

    crate::log_debug!("File discovery completed",
        "files_found" => files.len(),
        "directory" => dir_path.display()
    );

    Ok(files)
}

fn visit_directory(
    dir_path: &Path,
    files: &mut Vec<PathBuf>,
    config: &BatchConfig,
) -> Result<(), BatchError> {
    let entries = fs::read_dir(dir_path).map_err(|e| BatchError::IoError {
        error: e.to_string(),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| BatchError::IoError {
            error: e.to_string(),
        })?;
        let path = entry.path();

        if path.is_dir() {
            if config.recursive {
                visit_directory(&path, files, config)?;
            }
        } else if path.is_file() && config.accepts(&path) {
            files.push(path);
        }
    }

    Ok(())
}

// ============================================================================
// BATCH PROCESSING
// ============================================================================

fn tokenize_one(
    grammar: &Arc<Grammar>,
    processor: &FileProcessor,
    file_path: &Path,
) -> Result<FileTokenStats, FileTokenizeError> {
    let file_result = processor.process_file(file_path)?;
    let document = tokenize_file_result(Arc::clone(grammar), &file_result)?;
    let default_token = grammar.default_token().as_str();

    let mut tokens = 0;
    let mut unmatched = 0;
    for token in document.tokens() {
        tokens += 1;
        if token.is_kind(default_token) {
            unmatched += 1;
        }
    }

    Ok(FileTokenStats {
        lines: document.line_count(),
        tokens,
        unmatched,
        size_bytes: file_result.metadata.size,
        ends_in_initial_state: document.end_state().is_initial(),
    })
}

/// Tokenize every discovered file on the calling thread
pub fn process_directory_sequential(
    dir_path: &Path,
    grammar: Arc<Grammar>,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();

    crate::log_info!("Starting sequential batch tokenization",
        "directory" => dir_path.display(),
        "grammar" => grammar.name()
    );

    let files = discover_files(dir_path, config)?;
    let processor = FileProcessor::default().with_performance_logging(false);

    let mut results = BatchResults::new();
    results.files_discovered = files.len();

    for (file_id, file_path) in files.iter().enumerate() {
        if config.progress_reporting {
            println!(
                "Tokenizing file {} of {}: {}",
                file_id + 1,
                files.len(),
                file_path.display()
            );
        }

        let should_continue = logging::with_file_context(file_path.clone(), file_id, || {
            match tokenize_one(&grammar, &processor, file_path) {
                Ok(stats) => {
                    results.add_success(file_path.clone(), stats);
                    true
                }
                Err(error) => {
                    crate::log_error!(error.error_code(), "File tokenization failed",
                        "file" => file_path.display(),
                        "error" => error
                    );
                    results.add_failure(file_path.clone(), error);
                    if config.fail_fast {
                        crate::log_warning!("Fail-fast mode enabled, stopping batch processing");
                        return false;
                    }
                    true
                }
            }
        });

        if !should_continue {
            break;
        }
    }

    results.processing_duration = start_time.elapsed();
    log_batch_complete(&results, 1);
    Ok(results)
}

/// Tokenize discovered files across worker threads
pub fn process_directory_parallel(
    dir_path: &Path,
    grammar: Arc<Grammar>,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();
    let threads = config.worker_threads();

    crate::log_info!("Starting parallel batch tokenization",
        "directory" => dir_path.display(),
        "grammar" => grammar.name(),
        "max_threads" => threads
    );

    let files = discover_files(dir_path, config)?;

    let mut results = BatchResults::new();
    results.files_discovered = files.len();

    let chunk_size = calculate_chunk_size(files.len(), threads);
    crate::log_debug!("Parallel processing configuration",
        "total_files" => files.len(),
        "chunk_size" => chunk_size,
        "threads" => threads
    );

    for (chunk_index, chunk) in files.chunks(chunk_size).enumerate() {
        let chunk_results = process_chunk_parallel(
            chunk,
            chunk_index * chunk_size,
            &grammar,
            threads,
            config.progress_reporting,
        )?;
        results.merge(chunk_results);

        if config.fail_fast && results.failure_count() > 0 {
            crate::log_warning!("Fail-fast mode enabled, stopping batch processing");
            break;
        }
    }

    results.sort();
    results.processing_duration = start_time.elapsed();
    log_batch_complete(&results, threads);
    Ok(results)
}

fn process_chunk_parallel(
    files: &[PathBuf],
    first_file_id: usize,
    grammar: &Arc<Grammar>,
    threads: usize,
    progress_reporting: bool,
) -> Result<BatchResults, BatchError> {
    let results = Arc::new(Mutex::new(BatchResults::new()));
    let files_per_thread = (files.len() + threads - 1) / threads;
    let mut handles = Vec::new();

    for thread_id in 0..threads {
        let start_idx = thread_id * files_per_thread;
        if start_idx >= files.len() {
            break;
        }
        let end_idx = ((thread_id + 1) * files_per_thread).min(files.len());

        let thread_files: Vec<PathBuf> = files[start_idx..end_idx].to_vec();
        let results_clone = Arc::clone(&results);
        let grammar = Arc::clone(grammar);

        let handle = thread::spawn(move || {
            let processor = FileProcessor::default().with_performance_logging(false);

            for (local_file_id, file_path) in thread_files.iter().enumerate() {
                let file_id = first_file_id + start_idx + local_file_id;
                if progress_reporting {
                    println!("Tokenizing file {}: {}", file_id + 1, file_path.display());
                }

                logging::with_file_context(file_path.clone(), file_id, || {
                    let outcome = tokenize_one(&grammar, &processor, file_path);
                    let mut results_guard = results_clone.lock().unwrap();
                    match outcome {
                        Ok(stats) => results_guard.add_success(file_path.clone(), stats),
                        Err(error) => {
                            crate::log_error!(error.error_code(), "File tokenization failed",
                                "file" => file_path.display(),
                                "error" => error
                            );
                            results_guard.add_failure(file_path.clone(), error);
                        }
                    }
                });
            }
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.join().map_err(|_| {
            let error = BatchError::ThreadFailure {
                message: "Worker panicked during tokenization".to_string(),
            };
            crate::log_error!(error.error_code(), "Batch worker failed");
            error
        })?;
    }

    let results = Arc::try_unwrap(results)
        .map_err(|_| BatchError::ThreadFailure {
            message: "Worker results still shared after join".to_string(),
        })?
        .into_inner()
        .map_err(|_| BatchError::ThreadFailure {
            message: "Worker results lock poisoned".to_string(),
        })?;

    Ok(results)
}

fn calculate_chunk_size(file_count: usize, max_threads: usize) -> usize {
    const MIN_CHUNK_SIZE: usize = 1;
    const MAX_CHUNK_SIZE: usize = 50;

    let ideal_chunk_size = (file_count + max_threads - 1) / max_threads;
    ideal_chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE)
}

fn log_batch_complete(results: &BatchResults, threads: usize) {
    crate::log_success!(
        codes::success::BATCH_COMPLETE,
        "Batch tokenization completed",
        "files_processed" => results.files_processed,
        "successful" => results.success_count(),
        "failed" => results.failure_count(),
        "tokens" => results.total_tokens(),
        "threads_used" => threads,
        "duration_ms" => format!("{:.2}", results.processing_duration.as_secs_f64() * 1000.0)
    );
}

/// Tokenize a directory, sequentially when the config allows one thread
pub fn process_directory(
    dir_path: &Path,
    grammar: Arc<Grammar>,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    if config.worker_threads() == 1 {
        process_directory_sequential(dir_path, grammar, config)
    } else {
        process_directory_parallel(dir_path, grammar, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compile_time::tokenizer::MAX_STATE_STACK_DEPTH;
    use crate::grammar::builtin;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn quiet_config() -> BatchConfig {
        BatchConfig {
            progress_reporting: false,
            ..BatchConfig::default()
        }
    }

    fn write_jobs(dir: &Path, count: usize) {
        for i in 0..count {
            fs::write(
                dir.join(format!("job{:02}.jcl", i)),
                format!("//JOB{} JOB\n//STEP1 EXEC PGM=IEFBR14\n", i),
            )
            .unwrap();
        }
    }

    #[test]
    fn test_discovery_filters_extensions() {
        let dir = tempdir().unwrap();
        write_jobs(dir.path(), 2);
        fs::write(dir.path().join("notes.txt"), "not a job").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("deep.JCL"), "//* deep\n").unwrap();

        let config = quiet_config().with_extension(".jcl");
        let files = discover_files(dir.path(), &config).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.windows(2).all(|w| w[0] <= w[1]));

        let shallow = BatchConfig {
            recursive: false,
            ..config
        };
        assert_eq!(discover_files(dir.path(), &shallow).unwrap().len(), 2);

        let everything = quiet_config();
        assert_eq!(discover_files(dir.path(), &everything).unwrap().len(), 4);
    }

    #[test]
    fn test_discovery_errors() {
        let dir = tempdir().unwrap();
        let config = quiet_config();

        assert_matches!(
            discover_files(&dir.path().join("missing"), &config),
            Err(BatchError::DirectoryNotFound { .. })
        );
        assert_matches!(
            discover_files(dir.path(), &config),
            Err(BatchError::NoFilesFound { .. })
        );
    }

    #[test]
    fn test_max_files_truncates() {
        let dir = tempdir().unwrap();
        write_jobs(dir.path(), 5);

        let config = BatchConfig {
            max_files: Some(2),
            ..quiet_config()
        };
        let files = discover_files(dir.path(), &config).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("job00.jcl"));
    }

    #[test]
    fn test_sequential_batch() {
        let dir = tempdir().unwrap();
        write_jobs(dir.path(), 3);

        let config = BatchConfig {
            max_threads: 1,
            ..quiet_config()
        };
        let results = process_directory(dir.path(), builtin::jcl().unwrap(), &config).unwrap();

        assert_eq!(results.files_discovered, 3);
        assert_eq!(results.success_count(), 3);
        assert_eq!(results.failure_count(), 0);
        for (_, stats) in &results.successful_files {
            assert_eq!(stats.lines, 3);
            assert!(stats.tokens > 0);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dir = tempdir().unwrap();
        write_jobs(dir.path(), 7);
        let grammar = builtin::jcl().unwrap();

        let sequential = process_directory_sequential(dir.path(), Arc::clone(&grammar), &quiet_config())
            .unwrap();
        let parallel = process_directory_parallel(
            dir.path(),
            grammar,
            &BatchConfig {
                max_threads: 3,
                ..quiet_config()
            },
        )
        .unwrap();

        assert_eq!(parallel.success_count(), 7);
        assert_eq!(parallel.successful_files, sequential.successful_files);
    }

    #[test]
    fn test_failures_are_collected() {
        let dir = tempdir().unwrap();
        write_jobs(dir.path(), 2);
        fs::write(dir.path().join("broken.jcl"), [0xff, 0xfe, 0xfd]).unwrap();

        let config = BatchConfig {
            max_threads: 1,
            ..quiet_config()
        };
        let results = process_directory(dir.path(), builtin::jcl().unwrap(), &config).unwrap();
        assert_eq!(results.success_count(), 2);
        assert_eq!(results.failure_count(), 1);
        assert_matches!(
            results.failed_files[0].1,
            FileTokenizeError::File(FileProcessorError::InvalidEncoding { .. })
        );

        let fail_fast = BatchConfig {
            fail_fast: true,
            ..config
        };
        let results = process_directory(dir.path(), builtin::jcl().unwrap(), &fail_fast).unwrap();
        // broken.jcl sorts first
        assert_eq!(results.files_processed, 1);
        assert_eq!(results.failure_count(), 1);
    }

    #[test]
    fn test_runaway_nesting_fails_only_that_file() {
        let dir = tempdir().unwrap();
        write_jobs(dir.path(), 2);
        fs::write(dir.path().join("nested.jcl"), "(".repeat(MAX_STATE_STACK_DEPTH + 1)).unwrap();

        let grammar = Grammar::from_toml_str(
            r#"
            [[states.root]]
            pattern = '\('
            token = "open"
            next = { push = "root" }

            [[states.root]]
            pattern = '[^(]+'
            token = "text"
            "#,
        )
        .unwrap();
        let config = BatchConfig {
            max_threads: 2,
            ..quiet_config()
        };
        let results = process_directory(dir.path(), Arc::new(grammar), &config).unwrap();

        assert_eq!(results.success_count(), 2);
        assert_eq!(results.failure_count(), 1);
        assert!(results.failed_files[0].0.ends_with("nested.jcl"));
        assert_matches!(
            results.failed_files[0].1,
            FileTokenizeError::Tokenize(TokenizeError::StackDepthExceeded { .. })
        );
        assert_eq!(results.failed_files[0].1.error_code().as_str(), "K012");
    }

    #[test]
    fn test_chunk_size_calculation() {
        assert_eq!(calculate_chunk_size(100, 4), 25);
        assert_eq!(calculate_chunk_size(10, 4), 3);
        assert_eq!(calculate_chunk_size(1, 4), 1);
        assert_eq!(calculate_chunk_size(200, 4), 50);
    }

    #[test]
    fn test_batch_results_summary() {
        let mut results = BatchResults::new();
        assert_eq!(results.success_rate(), 0.0);

        results.add_success(
            PathBuf::from("a.jcl"),
            FileTokenStats {
                lines: 2,
                tokens: 5,
                unmatched: 1,
                size_bytes: 20,
                ends_in_initial_state: true,
            },
        );
        results.add_failure(
            PathBuf::from("b.jcl"),
            FileProcessorError::FileNotFound {
                path: "b.jcl".to_string(),
            }
            .into(),
        );

        assert_eq!(results.success_rate(), 0.5);
        assert_eq!(results.total_tokens(), 5);
        assert!(results.summary().contains("2 files processed"));
    }

    #[test]
    fn test_error_codes() {
        let error = BatchError::TooManyFiles { count: 9, max: 1 };
        assert_eq!(error.error_code().as_str(), "B004");
    }
}
