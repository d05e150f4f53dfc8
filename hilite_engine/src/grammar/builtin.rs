//! Grammars shipped with the engine, compiled on first use

use super::compiled::Grammar;
use super::GrammarError;
use std::sync::{Arc, OnceLock};

const HLASM_SOURCE: &str = include_str!("../../grammars/hlasm.toml");
const JCL_SOURCE: &str = include_str!("../../grammars/jcl.toml");

static HLASM: OnceLock<Arc<Grammar>> = OnceLock::new();
static JCL: OnceLock<Arc<Grammar>> = OnceLock::new();

/// Built-in language names with their accepted aliases
pub const BUILTIN_LANGUAGES: &[(&str, &[&str])] = &[
    ("hlasm", &["assembly", "hlsm"]),
    ("jcl", &[]),
];

/// TOML source of a built-in grammar
pub fn builtin_source(name: &str) -> Option<&'static str> {
    match canonical_name(name)? {
        "hlasm" => Some(HLASM_SOURCE),
        "jcl" => Some(JCL_SOURCE),
        _ => None,
    }
}

/// Resolve a language name or alias, ignoring case
pub fn canonical_name(name: &str) -> Option<&'static str> {
    let name = name.to_ascii_lowercase();
    BUILTIN_LANGUAGES
        .iter()
        .find(|(canonical, aliases)| *canonical == name || aliases.contains(&name.as_str()))
        .map(|(canonical, _)| *canonical)
}

pub fn builtin(name: &str) -> Result<Arc<Grammar>, GrammarError> {
    match canonical_name(name) {
        Some("hlasm") => hlasm(),
        Some("jcl") => jcl(),
        _ => Err(GrammarError::UnknownLanguage {
            name: name.to_string(),
        }),
    }
}

pub fn hlasm() -> Result<Arc<Grammar>, GrammarError> {
    cached(&HLASM, HLASM_SOURCE)
}

pub fn jcl() -> Result<Arc<Grammar>, GrammarError> {
    cached(&JCL, JCL_SOURCE)
}

fn cached(cell: &OnceLock<Arc<Grammar>>, source: &str) -> Result<Arc<Grammar>, GrammarError> {
    if let Some(grammar) = cell.get() {
        return Ok(Arc::clone(grammar));
    }
    let grammar = Arc::new(Grammar::from_toml_str(source)?);
    Ok(Arc::clone(cell.get_or_init(|| grammar)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_builtins_compile() {
        let hlasm = hlasm().unwrap();
        assert_eq!(hlasm.name(), "hlasm");
        assert_eq!(hlasm.default_token().as_str(), "source");
        assert!(hlasm.ignore_case());
        assert_eq!(hlasm.state_count(), 6);

        let jcl = jcl().unwrap();
        assert_eq!(jcl.name(), "jcl");
        assert_eq!(jcl.default_token().as_str(), "default");
        assert_eq!(jcl.brackets().len(), 1);
        assert_eq!(jcl.state_count(), 9);
    }

    #[test]
    fn test_builtins_are_cached() {
        let first = builtin("jcl").unwrap();
        let second = builtin("JCL").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_aliases_resolve() {
        assert_eq!(canonical_name("ASSEMBLY"), Some("hlasm"));
        assert_eq!(canonical_name("hlsm"), Some("hlasm"));
        assert_eq!(canonical_name("cobol"), None);
        assert!(builtin_source("Hlasm").is_some());
    }

    #[test]
    fn test_unknown_language() {
        assert_matches!(
            builtin("rexx"),
            Err(GrammarError::UnknownLanguage { name }) if name == "rexx"
        );
    }

    #[test]
    fn test_hlasm_comment_state_is_unreachable() {
        let hlasm = hlasm().unwrap();
        let unreachable: Vec<&str> = hlasm
            .unreachable_states()
            .iter()
            .map(|s| s.as_ref())
            .collect();
        assert_eq!(unreachable, vec!["comment"]);
        assert!(jcl().unwrap().unreachable_states().is_empty());
    }
}
