//! Literal and regex patterns for attribute names and values.
//!
//! A pattern string delimited by a leading and trailing `/` is a regular
//! expression; anything else is a literal substring. Both kinds compile to
//! a [`regex::Regex`] so testing and replacing behave identically.

use regex::{Captures, NoExpand, Regex};

use crate::{ConvertError, Result};

/// How a pattern string was written in the rule file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// `/…/`-delimited regular expression
    Regex,
    /// Literal substring, matched via an escaped regex
    Literal,
}

/// A compiled attribute-name or value pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    kind: PatternKind,
    re: Regex,
}

impl Pattern {
    /// Compile a pattern string.
    ///
    /// Fails with [`ConvertError::InvalidRule`] when the regex source does
    /// not compile.
    pub fn parse(raw: &str) -> Result<Self> {
        let (kind, expr) = if raw.len() >= 2 && raw.starts_with('/') && raw.ends_with('/') {
            (PatternKind::Regex, raw[1..raw.len() - 1].to_string())
        } else {
            (PatternKind::Literal, regex::escape(raw))
        };

        let re = Regex::new(&expr)
            .map_err(|err| ConvertError::InvalidRule(format!("malformed pattern {raw:?}: {err}")))?;

        Ok(Self {
            source: raw.to_string(),
            kind,
            re,
        })
    }

    /// The pattern string as written in the rule file
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Test the pattern against a target string
    pub fn is_match(&self, target: &str) -> bool {
        self.re.is_match(target)
    }

    /// Capture groups for the first match, if any
    pub fn captures<'t>(&self, target: &'t str) -> Option<Captures<'t>> {
        self.re.captures(target)
    }

    /// Replace the first occurrence of the pattern in `target` with a
    /// pre-expanded replacement string.
    ///
    /// The replacement is taken verbatim; `$` has no special meaning
    /// because placeholder expansion happens before this call.
    pub fn replace_first(&self, target: &str, replacement: &str) -> String {
        self.re.replace(target, NoExpand(replacement)).into_owned()
    }
}
