//! Error and success codes with their classification metadata
//!
//! Every coded event the engine emits is registered here. Error enums in the
//! grammar, tokenizer, file processor and batch modules map their variants to
//! these codes through `error_code()`.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Code wrapper shared by error, warning and success events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

pub mod file_processing {
    use super::Code;

    pub const FILE_NOT_FOUND: Code = Code::new("E005");
    pub const NOT_A_FILE: Code = Code::new("E006");
    pub const FILE_TOO_LARGE: Code = Code::new("E007");
    pub const TOO_MANY_LINES: Code = Code::new("E008");
    pub const PERMISSION_DENIED: Code = Code::new("E009");
    pub const INVALID_ENCODING: Code = Code::new("E010");
    pub const IO_ERROR: Code = Code::new("E011");
}

/// Grammar loading and validation
pub mod grammar {
    use super::Code;

    pub const PARSE_ERROR: Code = Code::new("G001");
    pub const MISSING_INITIAL_STATE: Code = Code::new("G002");
    pub const UNKNOWN_TRANSITION_TARGET: Code = Code::new("G003");
    pub const EMPTY_STATE: Code = Code::new("G004");
    pub const INVALID_PATTERN: Code = Code::new("G005");
    pub const INVALID_TOKEN_ACTION: Code = Code::new("G006");
    pub const EMPTY_TOKEN_LABEL: Code = Code::new("G007");
    pub const MISSING_BRACKETS: Code = Code::new("G008");
    pub const INVALID_BRACKET: Code = Code::new("G009");
    pub const LIMIT_EXCEEDED: Code = Code::new("G010");
    pub const UNSUPPORTED_FORMAT: Code = Code::new("G011");
    pub const UNKNOWN_LANGUAGE: Code = Code::new("G012");
    pub const UNREACHABLE_STATE: Code = Code::new("G020");
}

/// Line tokenization
pub mod tokenizer {
    use super::Code;

    pub const UNKNOWN_STATE: Code = Code::new("K001");
    pub const LINE_OUT_OF_RANGE: Code = Code::new("K002");
    pub const EMBEDDED_LINE_BREAK: Code = Code::new("K003");
    pub const UNMATCHED_INPUT: Code = Code::new("K010");
    pub const LINE_TOO_LONG: Code = Code::new("K011");
    pub const STACK_DEPTH_EXCEEDED: Code = Code::new("K012");
}

pub mod batch {
    use super::Code;

    pub const DIRECTORY_NOT_FOUND: Code = Code::new("B001");
    pub const NO_FILES_FOUND: Code = Code::new("B002");
    pub const THREAD_FAILURE: Code = Code::new("B003");
    pub const TOO_MANY_FILES: Code = Code::new("B004");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

pub mod success {
    use super::Code;

    pub const OPERATION_COMPLETED_SUCCESSFULLY: Code = Code::new("I001");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");

    pub const FILE_PROCESSING_SUCCESS: Code = Code::new("I006");

    pub const GRAMMAR_LOADED: Code = Code::new("I010");
    pub const GRAMMAR_VALIDATION_PASSED: Code = Code::new("I011");

    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
    pub const DOCUMENT_UPDATED: Code = Code::new("I021");

    pub const BATCH_COMPLETE: Code = Code::new("I030");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let entries = [
            // System
            ErrorMetadata::new(
                "ERR001",
                "System",
                Severity::Critical,
                false,
                true,
                "Critical internal error",
                "File a bug report with the input that triggered it",
            ),
            ErrorMetadata::new(
                "ERR002",
                "System",
                Severity::Critical,
                false,
                true,
                "System initialization failure",
                "Check logging configuration and environment variables",
            ),
            // File processing
            ErrorMetadata::new(
                "E005",
                "FileProcessing",
                Severity::Medium,
                false,
                true,
                "File not found at specified path",
                "Check file path and ensure file exists",
            ),
            ErrorMetadata::new(
                "E006",
                "FileProcessing",
                Severity::Medium,
                false,
                true,
                "Path does not refer to a regular file",
                "Pass a file, or use the batch command for directories",
            ),
            ErrorMetadata::new(
                "E007",
                "FileProcessing",
                Severity::Medium,
                false,
                true,
                "File exceeds maximum size limit",
                "Split the document or build with a larger limit profile",
            ),
            ErrorMetadata::new(
                "E008",
                "FileProcessing",
                Severity::Medium,
                false,
                true,
                "File exceeds maximum line count",
                "Split the document or build with a larger limit profile",
            ),
            ErrorMetadata::new(
                "E009",
                "FileProcessing",
                Severity::Medium,
                false,
                true,
                "Permission denied accessing file",
                "Check file permissions and user access rights",
            ),
            ErrorMetadata::new(
                "E010",
                "FileProcessing",
                Severity::Medium,
                false,
                true,
                "Invalid UTF-8 encoding in file",
                "Convert file to UTF-8 encoding",
            ),
            ErrorMetadata::new(
                "E011",
                "FileProcessing",
                Severity::Medium,
                false,
                true,
                "I/O error during file operation",
                "Check disk space, permissions, and file system integrity",
            ),
            // Grammar
            ErrorMetadata::new(
                "G001",
                "Grammar",
                Severity::High,
                false,
                true,
                "Grammar document could not be parsed",
                "Fix the TOML or JSON syntax of the grammar document",
            ),
            ErrorMetadata::new(
                "G002",
                "Grammar",
                Severity::High,
                false,
                true,
                "Initial state is not defined",
                "Define the initial state or set `initial` to an existing state",
            ),
            ErrorMetadata::new(
                "G003",
                "Grammar",
                Severity::High,
                false,
                true,
                "Rule pushes a state that is not defined",
                "Define the target state or correct the push target name",
            ),
            ErrorMetadata::new(
                "G004",
                "Grammar",
                Severity::High,
                false,
                true,
                "Reachable state has no rules",
                "Add at least one rule to the state",
            ),
            ErrorMetadata::new(
                "G005",
                "Grammar",
                Severity::High,
                false,
                true,
                "Rule pattern is not a valid regular expression",
                "Fix the pattern syntax",
            ),
            ErrorMetadata::new(
                "G006",
                "Grammar",
                Severity::High,
                false,
                true,
                "Rule must set exactly one of `token` or `brackets`",
                "Give the rule a token label or mark it as a bracket rule",
            ),
            ErrorMetadata::new(
                "G007",
                "Grammar",
                Severity::High,
                false,
                true,
                "Token label is empty",
                "Use a non-empty token label",
            ),
            ErrorMetadata::new(
                "G008",
                "Grammar",
                Severity::High,
                false,
                true,
                "Bracket rule in a grammar without a bracket table",
                "Add [[brackets]] entries to the grammar",
            ),
            ErrorMetadata::new(
                "G009",
                "Grammar",
                Severity::High,
                false,
                true,
                "Bracket pair is malformed",
                "Use non-empty open and close delimiters and a non-empty token",
            ),
            ErrorMetadata::new(
                "G010",
                "Grammar",
                Severity::High,
                false,
                true,
                "Grammar exceeds a configured limit",
                "Reduce the grammar size or build with a larger limit profile",
            ),
            ErrorMetadata::new(
                "G011",
                "Grammar",
                Severity::Medium,
                false,
                true,
                "Grammar file format not recognised",
                "Use a .toml or .json grammar file",
            ),
            ErrorMetadata::new(
                "G012",
                "Grammar",
                Severity::Medium,
                false,
                true,
                "No built-in grammar with that name",
                "Run `hilite languages` to list built-in grammars",
            ),
            ErrorMetadata::new(
                "G020",
                "Grammar",
                Severity::Low,
                true,
                false,
                "State cannot be reached from the initial state",
                "Remove the state or add a rule that pushes it",
            ),
            // Tokenizer
            ErrorMetadata::new(
                "K001",
                "Tokenizer",
                Severity::High,
                false,
                true,
                "State stack names a state absent from the grammar",
                "Reset the session or tokenize from the initial stack",
            ),
            ErrorMetadata::new(
                "K002",
                "Tokenizer",
                Severity::Medium,
                false,
                true,
                "Line index outside the document",
                "Use an index below the document line count",
            ),
            ErrorMetadata::new(
                "K003",
                "Tokenizer",
                Severity::Medium,
                false,
                true,
                "Replacement text for a single line contains a line break",
                "Split the text and insert each line separately",
            ),
            ErrorMetadata::new(
                "K010",
                "Tokenizer",
                Severity::Low,
                true,
                false,
                "Input not matched by any rule of the current state",
                "Add a rule covering the input if it should be classified",
            ),
            ErrorMetadata::new(
                "K011",
                "Tokenizer",
                Severity::Low,
                true,
                false,
                "Line exceeds the tokenization length limit",
                "Line is emitted as a single default span",
            ),
            ErrorMetadata::new(
                "K012",
                "Tokenizer",
                Severity::High,
                false,
                true,
                "A push would take the state stack past its depth limit",
                "Check the grammar for pushes without matching pops",
            ),
            // Batch
            ErrorMetadata::new(
                "B001",
                "Batch",
                Severity::Medium,
                false,
                true,
                "Batch directory not found",
                "Check the directory path",
            ),
            ErrorMetadata::new(
                "B002",
                "Batch",
                Severity::Medium,
                true,
                false,
                "No matching files found",
                "Check the directory contents and extension filter",
            ),
            ErrorMetadata::new(
                "B003",
                "Batch",
                Severity::High,
                false,
                true,
                "Worker thread failed",
                "Rerun sequentially to isolate the failing file",
            ),
            ErrorMetadata::new(
                "B004",
                "Batch",
                Severity::Medium,
                false,
                true,
                "Too many files for one batch",
                "Narrow the directory or raise the file limit",
            ),
            // Success
            ErrorMetadata::new(
                "I001",
                "System",
                Severity::Low,
                true,
                false,
                "Operation completed successfully",
                "No action required",
            ),
            ErrorMetadata::new(
                "I004",
                "System",
                Severity::Low,
                true,
                false,
                "Logging system initialized",
                "No action required",
            ),
            ErrorMetadata::new(
                "I006",
                "FileProcessing",
                Severity::Low,
                true,
                false,
                "File read successfully",
                "No action required",
            ),
            ErrorMetadata::new(
                "I010",
                "Grammar",
                Severity::Low,
                true,
                false,
                "Grammar loaded",
                "No action required",
            ),
            ErrorMetadata::new(
                "I011",
                "Grammar",
                Severity::Low,
                true,
                false,
                "Grammar validation passed",
                "No action required",
            ),
            ErrorMetadata::new(
                "I020",
                "Tokenizer",
                Severity::Low,
                true,
                false,
                "Document tokenized",
                "No action required",
            ),
            ErrorMetadata::new(
                "I021",
                "Tokenizer",
                Severity::Low,
                true,
                false,
                "Document retokenized after edit",
                "No action required",
            ),
            ErrorMetadata::new(
                "I030",
                "Batch",
                Severity::Low,
                true,
                false,
                "Batch processing finished",
                "No action required",
            ),
        ];

        entries.into_iter().map(|meta| (meta.code, meta)).collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}
