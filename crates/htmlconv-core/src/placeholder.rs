//! `%N` placeholder substitution.
//!
//! Replacement templates may contain `%N` or `%aN` tokens (N a single
//! digit) that are substituted with capture group N of a designated match.
//! Group 0 is the whole match. Which match supplies the captures is the
//! caller's decision: attribute-rename templates use the attribute-name
//! match, and nested value templates use the *parent* attribute-name
//! match rather than a value-level match.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::casing::{camelize, dasherize};
use crate::{ConvertError, Result};

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"%a?([0-9])").unwrap());

/// Casing transform applied to a capture before substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseTransform {
    Camelize,
    Dasherize,
}

impl CaseTransform {
    pub fn apply(&self, s: &str) -> String {
        match self {
            CaseTransform::Camelize => camelize(s),
            CaseTransform::Dasherize => dasherize(s),
        }
    }
}

/// Per-capture manipulation directive from a rule's `manipulation` list
#[derive(Debug, Clone)]
pub struct Manipulation {
    /// Capture group index the transform applies to
    pub index: usize,
    pub kind: CaseTransform,
}

/// Expand `%N`/`%aN` tokens in `template` from `captures`.
///
/// A template without placeholder syntax passes through unchanged even
/// when `captures` is `None`. A template *with* placeholder syntax and no
/// capture context fails with [`ConvertError::MissingCapture`]. A group
/// index the match does not define substitutes the empty string.
pub fn substitute(
    template: &str,
    captures: Option<&Captures>,
    manipulations: &[Manipulation],
) -> Result<String> {
    if !PLACEHOLDER_RE.is_match(template) {
        return Ok(template.to_string());
    }

    let captures = captures.ok_or_else(|| ConvertError::MissingCapture(template.to_string()))?;

    let mut result = String::with_capacity(template.len());
    let mut last = 0;

    for token in PLACEHOLDER_RE.captures_iter(template) {
        let whole = token.get(0).unwrap();
        let index: usize = token[1].parse().unwrap_or(0);

        result.push_str(&template[last..whole.start()]);

        let text = captures.get(index).map(|g| g.as_str()).unwrap_or("");
        match manipulations.iter().find(|m| m.index == index) {
            Some(manipulation) => result.push_str(&manipulation.kind.apply(text)),
            None => result.push_str(text),
        }

        last = whole.end();
    }

    result.push_str(&template[last..]);
    Ok(result)
}
