//! Rule-set model: JSON shape and canonical in-memory form.
//!
//! A rule file maps selector strings to attribute-rule groups:
//!
//! ```json
//! {
//!   "img": {
//!     "attr": {
//!       "/^src$/": "data-src",
//!       "/^data-(\\w+)$/": {"replace": "%a1", "value": {"/.*/": "val-%a1"}}
//!     }
//!   }
//! }
//! ```
//!
//! A selector may carry an attribute-existence guard suffix, written
//! `div[/^data-/]`: the group only applies to matched elements that have
//! at least one attribute name matching the guard regex. The suffix is
//! stripped here so the remaining string is a plain CSS selector.
//!
//! The heterogeneous JSON shapes (string vs. object directives) are
//! normalized exactly once, into [`Directive`]; application code never
//! inspects raw JSON.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::pattern::Pattern;
use crate::placeholder::{CaseTransform, Manipulation};
use crate::{ConvertError, Result};

/// Raw JSON shape of a single directive: rename string, structured
/// object, or anything else (ignored).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawDirective {
    Rename(String),
    Structured(RawReplace),
    Other(serde::de::IgnoredAny),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReplace {
    replace: Option<String>,
    value: Option<IndexMap<String, RawDirective>>,
    empty_value: Option<bool>,
    method: Option<String>,
    open: Option<String>,
    close: Option<String>,
    separator: Option<String>,
    value_pattern: Option<String>,
    value_replace: Option<String>,
    new_attribute: Option<String>,
    manipulation: Option<Vec<RawManipulation>>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawManipulation {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "match")]
    index: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSelectorRules {
    attr: Option<IndexMap<String, RawDirective>>,
}

type RawRuleSet = IndexMap<String, RawSelectorRules>;

/// Canonical, validated rule set
#[derive(Debug, Default)]
pub struct RuleSet {
    /// Selector groups in rule-file order; application order is
    /// significant and follows this order.
    pub selectors: Vec<SelectorRules>,
}

/// All attribute rules scoped to one selector
#[derive(Debug)]
pub struct SelectorRules {
    /// CSS selector with any guard suffix stripped
    pub selector: String,
    /// Attribute-existence guard from a `[/regex/]` selector suffix
    pub guard: Option<Pattern>,
    pub rules: Vec<AttrRule>,
}

/// One attribute-name pattern and what to do when it matches
#[derive(Debug)]
pub struct AttrRule {
    pub pattern: Pattern,
    pub directive: Directive,
}

/// Normalized form of the string-or-object rule shapes
#[derive(Debug)]
pub enum Directive {
    /// Bare string: rename the attribute, leave the value untouched
    Rename(String),
    /// Structured replacement object
    Structured(ReplaceSpec),
    /// Unsupported JSON value type; the attribute passes through
    Passthrough,
}

#[derive(Debug)]
pub struct ReplaceSpec {
    /// New attribute name template; may contain `%N` placeholders
    /// referring to the attribute-name match. Absent only for merge
    /// rules that name their output via `newAttribute`.
    pub replace: Option<String>,
    /// Value patterns applied to the attribute's value after a rename
    pub value_rules: Vec<ValueRule>,
    /// Force the attribute to serialize without a value
    pub empty_value: bool,
    /// Present when `method` is `"merge"`
    pub merge: Option<MergeSpec>,
    pub manipulations: Vec<Manipulation>,
}

/// One entry of a nested `value` pattern map
#[derive(Debug)]
pub struct ValueRule {
    pub pattern: Pattern,
    pub template: String,
}

/// Aggregation settings for a `method: "merge"` rule
#[derive(Debug)]
pub struct MergeSpec {
    /// Explicit output attribute name; takes precedence over `replace`
    pub new_attribute: Option<String>,
    pub open: String,
    pub close: String,
    pub separator: String,
    pub value_pattern: Option<Pattern>,
    pub value_replace: Option<String>,
}

impl RuleSet {
    /// Parse and normalize a JSON rule set.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawRuleSet = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    fn from_raw(raw: RawRuleSet) -> Result<Self> {
        let mut selectors = Vec::with_capacity(raw.len());

        for (raw_selector, group) in raw {
            let (selector, guard) = split_guard(&raw_selector)?;

            let mut rules = Vec::new();
            if let Some(attr_rules) = group.attr {
                for (raw_pattern, raw_directive) in attr_rules {
                    let pattern = Pattern::parse(&raw_pattern)?;
                    let directive = normalize_directive(&raw_pattern, raw_directive)?;
                    rules.push(AttrRule { pattern, directive });
                }
            }

            selectors.push(SelectorRules {
                selector,
                guard,
                rules,
            });
        }

        Ok(Self { selectors })
    }
}

/// Split a `selector[/regex/]` guard suffix off a selector string.
fn split_guard(raw: &str) -> Result<(String, Option<Pattern>)> {
    if !raw.ends_with("/]") {
        return Ok((raw.to_string(), None));
    }

    let Some(open) = raw.rfind("[/") else {
        return Ok((raw.to_string(), None));
    };

    // Interior including both slashes, so it parses as a regex pattern.
    let guard_src = &raw[open + 1..raw.len() - 1];
    let guard = Pattern::parse(guard_src)?;
    Ok((raw[..open].to_string(), Some(guard)))
}

fn normalize_directive(pattern: &str, raw: RawDirective) -> Result<Directive> {
    let raw = match raw {
        RawDirective::Rename(name) => return Ok(Directive::Rename(name)),
        RawDirective::Structured(raw) => raw,
        RawDirective::Other(_) => return Ok(Directive::Passthrough),
    };

    let merge = match raw.method.as_deref() {
        None => None,
        Some("merge") => Some(MergeSpec {
            new_attribute: raw.new_attribute.clone(),
            open: raw.open.clone().unwrap_or_default(),
            close: raw.close.clone().unwrap_or_default(),
            separator: raw.separator.clone().unwrap_or_default(),
            value_pattern: raw
                .value_pattern
                .as_deref()
                .map(Pattern::parse)
                .transpose()?,
            value_replace: raw.value_replace.clone(),
        }),
        // Recognized historically, but no semantics were ever defined.
        Some("split") => {
            return Err(ConvertError::InvalidRule(format!(
                "method \"split\" is not supported for pattern {pattern:?}"
            )))
        }
        Some(other) => {
            return Err(ConvertError::InvalidRule(format!(
                "unknown method {other:?} for pattern {pattern:?}"
            )))
        }
    };

    match &merge {
        None if raw.replace.is_none() => {
            return Err(ConvertError::InvalidRule(format!(
                "rule for pattern {pattern:?} is missing `replace`"
            )))
        }
        Some(spec) if spec.new_attribute.is_none() && raw.replace.is_none() => {
            return Err(ConvertError::InvalidRule(format!(
                "merge rule for pattern {pattern:?} needs `replace` or `newAttribute`"
            )))
        }
        _ => {}
    }

    let mut value_rules = Vec::new();
    if let Some(value_map) = raw.value {
        for (raw_value_pattern, raw_value_directive) in value_map {
            let value_pattern = Pattern::parse(&raw_value_pattern)?;
            let template = match raw_value_directive {
                RawDirective::Rename(template) => template,
                RawDirective::Structured(obj) => obj.replace.ok_or_else(|| {
                    ConvertError::InvalidRule(format!(
                        "value rule {raw_value_pattern:?} under pattern {pattern:?} is missing `replace`"
                    ))
                })?,
                // Unsupported value types are a no-op, not an error.
                RawDirective::Other(_) => continue,
            };
            value_rules.push(ValueRule {
                pattern: value_pattern,
                template,
            });
        }
    }

    let mut manipulations = Vec::new();
    for raw_manipulation in raw.manipulation.unwrap_or_default() {
        let kind = match raw_manipulation.kind.as_str() {
            "camelize" => CaseTransform::Camelize,
            "dasherize" => CaseTransform::Dasherize,
            other => {
                return Err(ConvertError::InvalidRule(format!(
                    "unknown manipulation {other:?} for pattern {pattern:?}"
                )))
            }
        };
        manipulations.push(Manipulation {
            index: raw_manipulation.index,
            kind,
        });
    }

    Ok(Directive::Structured(ReplaceSpec {
        replace: raw.replace,
        value_rules,
        empty_value: raw.empty_value.unwrap_or(false),
        merge,
        manipulations,
    }))
}
