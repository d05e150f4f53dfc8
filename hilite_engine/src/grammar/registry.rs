//! Name-to-grammar lookup

use super::builtin::{self, BUILTIN_LANGUAGES};
use super::compiled::Grammar;
use super::GrammarError;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct GrammarRegistry {
    grammars: BTreeMap<String, Arc<Grammar>>,
    aliases: BTreeMap<String, String>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in grammar and its aliases
    pub fn with_builtins() -> Result<Self, GrammarError> {
        let mut registry = Self::new();
        for (name, aliases) in BUILTIN_LANGUAGES {
            registry.register_shared(builtin::builtin(name)?);
            for alias in aliases.iter() {
                registry.alias(alias, name);
            }
        }
        Ok(registry)
    }

    /// Register under the grammar's own name, replacing any previous entry
    pub fn register(&mut self, grammar: Grammar) -> Arc<Grammar> {
        self.register_shared(Arc::new(grammar))
    }

    pub fn register_shared(&mut self, grammar: Arc<Grammar>) -> Arc<Grammar> {
        let key = grammar.name().to_ascii_lowercase();
        self.aliases.remove(&key);
        self.grammars.insert(key, Arc::clone(&grammar));
        grammar
    }

    pub fn alias(&mut self, alias: &str, name: &str) {
        self.aliases
            .insert(alias.to_ascii_lowercase(), name.to_ascii_lowercase());
    }

    /// Case-insensitive lookup by name or alias
    pub fn get(&self, name: &str) -> Option<Arc<Grammar>> {
        let key = name.to_ascii_lowercase();
        let key = self.aliases.get(&key).unwrap_or(&key);
        self.grammars.get(key).cloned()
    }

    pub fn require(&self, name: &str) -> Result<Arc<Grammar>, GrammarError> {
        self.get(name).ok_or_else(|| GrammarError::UnknownLanguage {
            name: name.to_string(),
        })
    }

    pub fn names(&self) -> Vec<&str> {
        self.grammars.keys().map(String::as_str).collect()
    }

    /// Aliases pointing at `name`
    pub fn aliases_of(&self, name: &str) -> Vec<&str> {
        let name = name.to_ascii_lowercase();
        self.aliases
            .iter()
            .filter(|(_, target)| **target == name)
            .map(|(alias, _)| alias.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }
}
