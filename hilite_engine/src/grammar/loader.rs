//! Grammar loading from strings and files

use super::compiled::Grammar;
use super::compiler::compile;
use super::definition::GrammarDocument;
use super::GrammarError;
use crate::log_info;
use std::fs;
use std::path::Path;

const UNNAMED_GRAMMAR: &str = "grammar";

impl Grammar {
    pub fn from_document(document: &GrammarDocument) -> Result<Self, GrammarError> {
        compile(document, UNNAMED_GRAMMAR)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, GrammarError> {
        compile(&GrammarDocument::from_toml_str(source)?, UNNAMED_GRAMMAR)
    }

    pub fn from_json_str(source: &str) -> Result<Self, GrammarError> {
        compile(&GrammarDocument::from_json_str(source)?, UNNAMED_GRAMMAR)
    }
}

/// Load a `.toml` or `.json` grammar file. Unnamed grammars take the file stem.
pub fn load_grammar_file<P: AsRef<Path>>(path: P) -> Result<Grammar, GrammarError> {
    let path = path.as_ref();

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let parse: fn(&str) -> Result<GrammarDocument, GrammarError> = match extension.as_deref() {
        Some("toml") => GrammarDocument::from_toml_str,
        Some("json") => GrammarDocument::from_json_str,
        _ => {
            return Err(GrammarError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    log_info!("Loading grammar", "path" => path.display());

    let source = fs::read_to_string(path).map_err(|source| GrammarError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let document = parse(&source)?;
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(UNNAMED_GRAMMAR);

    compile(&document, stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    const SIMPLE_TOML: &str = r#"
        [[states.root]]
        pattern = '\w+'
        token = "word"
    "#;

    fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = Builder::new()
            .prefix("deck")
            .suffix(suffix)
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_toml_file_takes_name_from_stem() {
        let file = write_temp(".toml", SIMPLE_TOML);
        let grammar = load_grammar_file(file.path()).unwrap();

        let stem = file.path().file_stem().unwrap().to_str().unwrap();
        assert_eq!(grammar.name(), stem);
        assert!(grammar.name().starts_with("deck"));
    }

    #[test]
    fn test_load_json_file_keeps_declared_name() {
        let file = write_temp(
            ".JSON",
            r#"{ "name": "words", "states": { "root": [{ "pattern": "\\w+", "token": "word" }] } }"#,
        );
        let grammar = load_grammar_file(file.path()).unwrap();
        assert_eq!(grammar.name(), "words");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".yaml", SIMPLE_TOML);
        assert_matches!(
            load_grammar_file(file.path()),
            Err(GrammarError::UnsupportedFormat { .. })
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_grammar_file(dir.path().join("absent.toml"));
        assert_matches!(result, Err(GrammarError::Io { ref source, .. })
            if source.kind() == std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_parse_errors_surface_from_files() {
        let file = write_temp(".toml", "states = 3");
        assert_matches!(
            load_grammar_file(file.path()),
            Err(GrammarError::Parse { format: "TOML", .. })
        );
    }

    #[test]
    fn test_from_str_constructors() {
        assert_eq!(Grammar::from_toml_str(SIMPLE_TOML).unwrap().name(), "grammar");
        let json = Grammar::from_json_str(
            r#"{ "states": { "root": [{ "pattern": "x", "token": "x" }] } }"#,
        )
        .unwrap();
        assert_eq!(json.rule_count(), 1);
    }
}
