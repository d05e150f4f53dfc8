//! File processor module with compile-time limits and global logging integration

mod processor;

use crate::config::compile_time::file_processing::{
    LARGE_FILE_THRESHOLD, MAX_FILE_SIZE, MAX_LINE_COUNT,
};
use crate::config::runtime::FileProcessorPreferences;
use crate::log_debug;
use std::path::Path;

pub use processor::{FileMetadata, FileProcessingResult, FileProcessor, FileProcessorError};

/// Process a file with default settings
pub fn process_file<P: AsRef<Path>>(file_path: P) -> Result<FileProcessingResult, FileProcessorError> {
    processor::process_file(file_path)
}

/// Create a file processor from runtime preferences
pub fn create_processor(prefs: &FileProcessorPreferences) -> FileProcessor {
    FileProcessor::from_preferences(prefs)
}

pub fn should_halt_on_error(error: &FileProcessorError) -> bool {
    error.requires_halt()
}

pub fn get_error_code(error: &FileProcessorError) -> crate::logging::Code {
    error.error_code()
}

/// Size limit baked in at build time
pub fn get_max_file_size() -> u64 {
    MAX_FILE_SIZE
}

pub fn get_large_file_threshold() -> u64 {
    LARGE_FILE_THRESHOLD
}

/// Check that every file processor code is registered
pub fn init_file_processor_logging() -> Result<(), String> {
    use crate::logging::codes;

    let file_codes = [
        codes::file_processing::FILE_NOT_FOUND,
        codes::file_processing::NOT_A_FILE,
        codes::file_processing::FILE_TOO_LARGE,
        codes::file_processing::TOO_MANY_LINES,
        codes::file_processing::PERMISSION_DENIED,
        codes::file_processing::INVALID_ENCODING,
        codes::file_processing::IO_ERROR,
    ];

    for code in &file_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "File processor code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    log_debug!("File processor limits loaded",
        "max_file_size" => MAX_FILE_SIZE,
        "large_file_threshold" => LARGE_FILE_THRESHOLD,
        "max_line_count" => MAX_LINE_COUNT
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_module_api() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("hello.asm");
        fs::write(&file_path, "HELLO    CSECT\n         END\n").unwrap();

        let result = process_file(&file_path).unwrap();
        assert_eq!(result.metadata.line_count, 2);
        assert_eq!(result.metadata.extension.as_deref(), Some("asm"));
    }

    #[test]
    fn test_create_processor() {
        let processor = create_processor(&FileProcessorPreferences {
            enable_performance_logging: true,
            warn_on_large_files: false,
        });
        assert!(processor.enable_performance_logging);
        assert!(!processor.warn_on_large_files);
        assert_eq!(FileProcessor::max_file_size(), get_max_file_size());
    }

    #[test]
    fn test_error_helpers() {
        let error = FileProcessorError::InvalidEncoding {
            path: "job.jcl".to_string(),
        };

        assert!(should_halt_on_error(&error));
        assert_eq!(get_error_code(&error).as_str(), "E010");
    }

    #[test]
    fn test_limits_are_consistent() {
        assert!(get_large_file_threshold() > 0);
        assert!(get_large_file_threshold() <= get_max_file_size());
    }

    #[test]
    fn test_init_logging() {
        assert!(init_file_processor_logging().is_ok());
    }
}
