//! # htmlconv-core
//!
//! Pattern-based attribute rewrite engine.
//!
//! This crate holds everything about attribute rewriting that does not
//! require an HTML parser: the rule-set data model (loaded from JSON),
//! literal/regex pattern matching, `%N` placeholder substitution, and the
//! per-element rewrite state that accumulates pending attribute changes.
//!
//! The `htmlconv` crate drives this engine over a parsed document; any
//! other host can do the same by feeding it `(name, value)` pairs.
//!
//! ## Example
//!
//! ```rust
//! use htmlconv_core::{apply_rule, ElementState, RuleSet, TokenGen};
//!
//! let rules = RuleSet::from_json(r#"{"img": {"attr": {"/^src$/": "data-src"}}}"#).unwrap();
//! let group = &rules.selectors[0];
//!
//! let snapshot = vec![("src".to_string(), "a.jpg".to_string())];
//! let mut state = ElementState::new();
//! let mut tokens = TokenGen::default();
//!
//! for (attr, value) in &snapshot {
//!     for (i, rule) in group.rules.iter().enumerate() {
//!         apply_rule(&mut state, &snapshot, attr, value, rule, (0, i), &mut tokens).unwrap();
//!     }
//! }
//!
//! assert_eq!(state.pending.get("data-src").unwrap(), "a.jpg");
//! ```

mod casing;
mod pattern;
mod placeholder;
mod rewrite;
mod rules;

pub use casing::{camelize, dasherize};
pub use pattern::{Pattern, PatternKind};
pub use placeholder::{substitute, CaseTransform, Manipulation};
pub use rewrite::{apply_rule, ElementState, RuleId, TokenGen};
pub use rules::{AttrRule, Directive, MergeSpec, ReplaceSpec, RuleSet, SelectorRules, ValueRule};

/// Error type for rule parsing and application
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Malformed rule: missing `replace`, unknown `method`, malformed
    /// pattern or selector.
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    /// Placeholder substitution was requested without capture context.
    #[error("no capture context for placeholder template {0:?}")]
    MissingCapture(String),

    /// Rule definitions were not valid JSON.
    #[error("invalid rule JSON: {0}")]
    RuleJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
