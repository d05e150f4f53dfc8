// build.rs - TOML-driven limit generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    grammar: GrammarLimits,
    tokenizer: TokenizerLimits,
    file_processing: FileProcessingLimits,
    batch_processing: BatchProcessingLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct GrammarLimits {
    max_states_per_grammar: usize,
    max_rules_per_state: usize,
    max_pattern_length: usize,
}

#[derive(serde::Deserialize)]
struct TokenizerLimits {
    max_state_stack_depth: usize,
    max_tokenization_line_length: usize,
}

#[derive(serde::Deserialize)]
struct FileProcessingLimits {
    max_file_size: u64,
    large_file_threshold: u64,
    max_line_count: usize,
}

#[derive(serde::Deserialize)]
struct BatchProcessingLimits {
    max_worker_threads: usize,
    max_files_per_batch: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_events_per_file: usize,
    max_log_message_length: usize,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=HILITE_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=HILITE_CONFIG_DIR");

    let profile = env::var("HILITE_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("HILITE_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of hilite_engine
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_limits(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_limits(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_FILE_SIZE: u64 = 1_000_000_000;
    const ABSOLUTE_MAX_STACK_DEPTH: usize = 10_000;
    const ABSOLUTE_MAX_THREADS: usize = 256;

    if config.file_processing.max_file_size > ABSOLUTE_MAX_FILE_SIZE {
        panic!("LIMITS: max_file_size exceeds absolute maximum");
    }

    if config.file_processing.large_file_threshold > config.file_processing.max_file_size {
        panic!("LIMITS: large_file_threshold must not exceed max_file_size");
    }

    if config.tokenizer.max_state_stack_depth == 0
        || config.tokenizer.max_state_stack_depth > ABSOLUTE_MAX_STACK_DEPTH
    {
        panic!("LIMITS: max_state_stack_depth must be in 1..={}", ABSOLUTE_MAX_STACK_DEPTH);
    }

    if config.tokenizer.max_tokenization_line_length == 0 {
        panic!("LIMITS: max_tokenization_line_length cannot be zero");
    }

    if config.grammar.max_states_per_grammar == 0 || config.grammar.max_rules_per_state == 0 {
        panic!("LIMITS: grammar state and rule limits cannot be zero");
    }

    if config.batch_processing.max_worker_threads == 0
        || config.batch_processing.max_worker_threads > ABSOLUTE_MAX_THREADS
    {
        panic!("LIMITS: max_worker_threads must be in 1..={}", ABSOLUTE_MAX_THREADS);
    }

    if config.logging.max_log_events_per_file > config.logging.log_buffer_size {
        panic!("LIMITS: max_log_events_per_file exceeds log_buffer_size");
    }

    if profile == "production" && config.file_processing.max_file_size > 50_000_000 {
        panic!("PRODUCTION: max_file_size too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod grammar {{
        pub const MAX_STATES_PER_GRAMMAR: usize = {};
        pub const MAX_RULES_PER_STATE: usize = {};
        pub const MAX_PATTERN_LENGTH: usize = {};
    }}

    pub mod tokenizer {{
        pub const MAX_STATE_STACK_DEPTH: usize = {};
        pub const MAX_TOKENIZATION_LINE_LENGTH: usize = {};
    }}

    pub mod file_processing {{
        pub const MAX_FILE_SIZE: u64 = {};
        pub const LARGE_FILE_THRESHOLD: u64 = {};
        pub const MAX_LINE_COUNT: usize = {};
    }}

    pub mod batch_processing {{
        pub const MAX_WORKER_THREADS: usize = {};
        pub const MAX_FILES_PER_BATCH: usize = {};
    }}

    pub mod logging {{
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_EVENTS_PER_FILE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
    }}
}}
"#,
        profile,
        // Grammar
        config.grammar.max_states_per_grammar,
        config.grammar.max_rules_per_state,
        config.grammar.max_pattern_length,
        // Tokenizer
        config.tokenizer.max_state_stack_depth,
        config.tokenizer.max_tokenization_line_length,
        // File Processing
        config.file_processing.max_file_size,
        config.file_processing.large_file_threshold,
        config.file_processing.max_line_count,
        // Batch Processing
        config.batch_processing.max_worker_threads,
        config.batch_processing.max_files_per_batch,
        // Logging
        config.logging.log_buffer_size,
        config.logging.max_log_events_per_file,
        config.logging.max_log_message_length,
    );

    fs::write(output_path, constants_code).unwrap();
}
