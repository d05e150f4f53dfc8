//! Serde model of a grammar document (TOML or JSON)
//!
//! ```toml
//! name = "demo"
//! default_token = "source"
//!
//! [[brackets]]
//! open = "("
//! close = ")"
//! token = "delimiter"
//!
//! [[states.root]]
//! pattern = '^\*.*$'
//! token = "comment"
//! next = "pop_all"
//!
//! [[states.root]]
//! pattern = '\w+'
//! token = "keyword"
//! next = { push = "operands" }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_INITIAL_STATE: &str = "root";
pub const DEFAULT_UNMATCHED_TOKEN: &str = "unmatched";

fn default_initial() -> String {
    DEFAULT_INITIAL_STATE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarDocument {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_initial")]
    pub initial: String,

    /// Label for input no rule matches
    #[serde(default)]
    pub default_token: Option<String>,

    #[serde(default)]
    pub ignore_case: bool,

    #[serde(default)]
    pub brackets: Vec<BracketDefinition>,

    pub states: BTreeMap<String, Vec<RuleDefinition>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BracketDefinition {
    pub open: String,
    pub close: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    pub pattern: String,

    #[serde(default)]
    pub token: Option<String>,

    /// Classify the match through the bracket table instead of `token`
    #[serde(default)]
    pub brackets: bool,

    #[serde(default)]
    pub next: TransitionDefinition,

    /// Overrides the grammar-wide `ignore_case`
    #[serde(default)]
    pub ignore_case: Option<bool>,
}

/// State change applied after a rule matches
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionDefinition {
    #[default]
    Stay,
    Push(String),
    Pop,
    PopAll,
}

impl GrammarDocument {
    pub fn from_toml_str(source: &str) -> Result<Self, super::GrammarError> {
        toml::from_str(source).map_err(|e| super::GrammarError::Parse {
            format: "TOML",
            message: e.to_string(),
        })
    }

    pub fn from_json_str(source: &str) -> Result<Self, super::GrammarError> {
        serde_json::from_str(source).map_err(|e| super::GrammarError::Parse {
            format: "JSON",
            message: e.to_string(),
        })
    }

    pub fn rule_count(&self) -> usize {
        self.states.values().map(Vec::len).sum()
    }
}
