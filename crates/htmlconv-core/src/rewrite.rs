//! Attribute rewriter and per-element rewrite state.
//!
//! The driver feeds every `(name, value)` pair of an element through
//! [`apply_rule`] once per rule. Results accumulate in an [`ElementState`]
//! side table owned by the caller; the live element is only updated when
//! the caller flushes the pending cache, so every selector group matches
//! against the element's original attributes.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use regex::Captures;

use crate::placeholder::substitute;
use crate::rules::{AttrRule, Directive, MergeSpec, ReplaceSpec};
use crate::{ConvertError, Result};

/// Identifies one rule within one selector group: `(selector index, rule
/// index)`. Used to run merge rules at most once per element.
pub type RuleId = (usize, usize);

/// Pending attribute changes for a single element, accumulated across all
/// selector groups of one conversion.
#[derive(Debug, Default)]
pub struct ElementState {
    /// Replacement attribute set, in insertion order. Flushed onto the
    /// element once every selector group has run.
    pub pending: IndexMap<String, String>,
    /// Original attribute names that a rule has already replaced
    replaced: HashSet<String>,
    /// Original name -> current pending name, so a later rewrite of the
    /// same attribute supersedes the earlier one instead of duplicating it
    renamed: HashMap<String, String>,
    /// Merge rules that already ran on this element
    merges_applied: HashSet<RuleId>,
    /// `(attribute name, token)` pairs standing in for empty values
    pub empty_tokens: Vec<(String, String)>,
}

impl ElementState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an attribute through unchanged unless a rule already
    /// replaced it.
    fn passthrough(&mut self, attr: &str, value: &str) {
        if !self.replaced.contains(attr) && !self.pending.contains_key(attr) {
            self.pending.insert(attr.to_string(), value.to_string());
        }
    }

    /// Record a rename of `attr` to `new_name`, dropping any earlier
    /// pending entry for the same original attribute.
    fn commit(&mut self, attr: &str, new_name: &str, value: String) {
        if let Some(previous) = self.renamed.get(attr) {
            if previous != new_name {
                let previous = previous.clone();
                self.pending.shift_remove(&previous);
            }
        }
        if new_name != attr {
            self.pending.shift_remove(attr);
        }
        self.pending.insert(new_name.to_string(), value);
        self.replaced.insert(attr.to_string());
        self.renamed.insert(attr.to_string(), new_name.to_string());
    }

    /// Mark a merge source attribute as consumed without writing a
    /// standalone entry for it.
    fn consume(&mut self, attr: &str, merged_into: &str) {
        if let Some(previous) = self.renamed.get(attr) {
            if previous != merged_into {
                let previous = previous.clone();
                self.pending.shift_remove(&previous);
            }
        }
        self.pending.shift_remove(attr);
        self.replaced.insert(attr.to_string());
        self.renamed.insert(attr.to_string(), merged_into.to_string());
    }
}

/// Generates document-unique stand-in values for `emptyValue` attributes.
///
/// The serializer cannot emit a valueless attribute, so the tree carries a
/// real string which the orchestrator strips from the serialized output.
#[derive(Debug, Default)]
pub struct TokenGen {
    seq: u32,
}

impl TokenGen {
    pub fn next_token(&mut self) -> String {
        self.seq += 1;
        format!("$htmlconv$empty${}", self.seq)
    }
}

/// Apply one rule to one `(attr, value)` pair of one element.
///
/// `snapshot` is the element's attribute set as it was when the selector
/// group started; merge rules aggregate over it.
pub fn apply_rule(
    state: &mut ElementState,
    snapshot: &[(String, String)],
    attr: &str,
    value: &str,
    rule: &AttrRule,
    rule_id: RuleId,
    tokens: &mut TokenGen,
) -> Result<()> {
    match &rule.directive {
        Directive::Passthrough => {
            state.passthrough(attr, value);
            Ok(())
        }
        Directive::Rename(template) => {
            let Some(captures) = rule.pattern.captures(attr) else {
                state.passthrough(attr, value);
                return Ok(());
            };
            let new_name = rule
                .pattern
                .replace_first(attr, &substitute(template, Some(&captures), &[])?);
            state.commit(attr, &new_name, value.to_string());
            Ok(())
        }
        Directive::Structured(spec) => {
            apply_structured(state, snapshot, attr, value, rule, spec, rule_id, tokens)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_structured(
    state: &mut ElementState,
    snapshot: &[(String, String)],
    attr: &str,
    value: &str,
    rule: &AttrRule,
    spec: &ReplaceSpec,
    rule_id: RuleId,
    tokens: &mut TokenGen,
) -> Result<()> {
    let Some(captures) = rule.pattern.captures(attr) else {
        state.passthrough(attr, value);
        return Ok(());
    };

    if let Some(merge) = &spec.merge {
        // At most once per element, no matter how many attributes match.
        if state.merges_applied.contains(&rule_id) {
            return Ok(());
        }
        apply_merge(state, snapshot, attr, &captures, rule, spec, merge)?;
        state.merges_applied.insert(rule_id);
        return Ok(());
    }

    let template = spec.replace.as_ref().ok_or_else(|| {
        ConvertError::InvalidRule(format!(
            "rule for pattern {:?} is missing `replace`",
            rule.pattern.source()
        ))
    })?;
    let new_name = rule.pattern.replace_first(
        attr,
        &substitute(template, Some(&captures), &spec.manipulations)?,
    );
    state.commit(attr, &new_name, value.to_string());

    // Nested value rules substitute placeholders from the attribute-name
    // match, not from a value-level match. First matching pattern wins.
    for value_rule in &spec.value_rules {
        if value_rule.pattern.is_match(value) {
            let replacement =
                substitute(&value_rule.template, Some(&captures), &spec.manipulations)?;
            let new_value = value_rule.pattern.replace_first(value, &replacement);
            state.pending.insert(new_name.clone(), new_value);
            break;
        }
    }

    if spec.empty_value {
        let token = tokens.next_token();
        state.pending.insert(new_name.clone(), token.clone());
        state.empty_tokens.push((new_name, token));
    }

    Ok(())
}

/// Aggregate every attribute whose name matches the rule's pattern into
/// the value of a single new attribute.
fn apply_merge(
    state: &mut ElementState,
    snapshot: &[(String, String)],
    trigger_attr: &str,
    trigger_captures: &Captures,
    rule: &AttrRule,
    spec: &ReplaceSpec,
    merge: &MergeSpec,
) -> Result<()> {
    let new_name = match &merge.new_attribute {
        Some(name) => name.clone(),
        None => {
            let template = spec.replace.as_ref().ok_or_else(|| {
                ConvertError::InvalidRule(format!(
                    "merge rule for pattern {:?} needs `replace` or `newAttribute`",
                    rule.pattern.source()
                ))
            })?;
            rule.pattern.replace_first(
                trigger_attr,
                &substitute(template, Some(trigger_captures), &spec.manipulations)?,
            )
        }
    };

    let mut parts = Vec::new();
    for (name, val) in snapshot {
        if !rule.pattern.is_match(name) {
            continue;
        }

        let part = match (&merge.value_pattern, &merge.value_replace) {
            (Some(value_pattern), Some(template)) => match value_pattern.captures(val) {
                Some(value_captures) => {
                    let replacement =
                        substitute(template, Some(&value_captures), &spec.manipulations)?;
                    value_pattern.replace_first(val, &replacement)
                }
                None => val.clone(),
            },
            _ => val.clone(),
        };

        parts.push(part);
        state.consume(name, &new_name);
    }

    let merged = format!("{}{}{}", merge.open, parts.join(&merge.separator), merge.close);
    state.pending.insert(new_name, merged);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Directive, RuleSet};
    use pretty_assertions::assert_eq;

    fn run(rules_json: &str, snapshot: &[(&str, &str)]) -> ElementState {
        try_run(rules_json, snapshot).unwrap()
    }

    fn try_run(rules_json: &str, snapshot: &[(&str, &str)]) -> Result<ElementState> {
        let rules = RuleSet::from_json(rules_json)?;
        let snapshot: Vec<(String, String)> = snapshot
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut state = ElementState::new();
        let mut tokens = TokenGen::default();
        for (selector_index, group) in rules.selectors.iter().enumerate() {
            for (attr, value) in &snapshot {
                for (rule_index, rule) in group.rules.iter().enumerate() {
                    apply_rule(
                        &mut state,
                        &snapshot,
                        attr,
                        value,
                        rule,
                        (selector_index, rule_index),
                        &mut tokens,
                    )?;
                }
            }
        }
        Ok(state)
    }

    fn pending(state: &ElementState) -> Vec<(&str, &str)> {
        state
            .pending
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn test_simple_rename() {
        let state = run(
            r#"{"img": {"attr": {"/^src$/": "data-src"}}}"#,
            &[("src", "a.jpg"), ("alt", "x")],
        );
        assert_eq!(pending(&state), vec![("data-src", "a.jpg"), ("alt", "x")]);
    }

    #[test]
    fn test_non_matching_rule_passes_through() {
        let state = run(
            r#"{"img": {"attr": {"/^href$/": "data-href"}}}"#,
            &[("src", "a.jpg")],
        );
        assert_eq!(pending(&state), vec![("src", "a.jpg")]);
    }

    #[test]
    fn test_rename_with_placeholder() {
        let state = run(
            r#"{"div": {"attr": {"/^ng-(\\w+)$/": "data-ng-%1"}}}"#,
            &[("ng-click", "go()")],
        );
        assert_eq!(pending(&state), vec![("data-ng-click", "go()")]);
    }

    #[test]
    fn test_value_cascade_uses_attribute_captures() {
        // The value template's %a1 refers to the attribute-name match.
        let state = run(
            r#"{"div": {"attr": {"/^data-(\\w+)$/": {
                "replace": "%a1",
                "value": {"/.*/": "val-%a1"}
            }}}}"#,
            &[("data-foo", "x")],
        );
        assert_eq!(pending(&state), vec![("foo", "val-foo")]);
    }

    #[test]
    fn test_value_rule_first_match_wins() {
        let state = run(
            r#"{"div": {"attr": {"/^x$/": {
                "replace": "x",
                "value": {"/^a/": "first", "/a/": "second"}
            }}}}"#,
            &[("x", "abc")],
        );
        assert_eq!(pending(&state), vec![("x", "firstbc")]);
    }

    #[test]
    fn test_later_rule_supersedes_earlier_rename() {
        // Both rules match the same original name; the final cache holds
        // one entry, from the later rule.
        let state = run(
            r#"{"div": {"attr": {"/^src$/": "data-src", "/^s/": "x-src"}}}"#,
            &[("src", "a.jpg")],
        );
        assert_eq!(pending(&state), vec![("x-srcrc", "a.jpg")]);
    }

    #[test]
    fn test_merge_runs_once_per_element() {
        let state = run(
            r#"{"div": {"attr": {"/^img-(\\w+)$/": {
                "replace": "img-size",
                "method": "merge",
                "open": "[", "close": "]", "separator": ",",
                "valuePattern": "/.*/", "valueReplace": "%a0"
            }}}}"#,
            &[("img-w", "10"), ("img-h", "20"), ("id", "pic")],
        );
        assert_eq!(pending(&state), vec![("img-size", "[10,20]"), ("id", "pic")]);
    }

    #[test]
    fn test_merge_new_attribute_wins_over_replace() {
        let state = run(
            r#"{"div": {"attr": {"/^img-(\\w+)$/": {
                "replace": "ignored",
                "newAttribute": "size",
                "method": "merge",
                "separator": "x"
            }}}}"#,
            &[("img-w", "10"), ("img-h", "20")],
        );
        assert_eq!(pending(&state), vec![("size", "10x20")]);
    }

    #[test]
    fn test_empty_value_token() {
        let state = run(
            r#"{"input": {"attr": {"/^required$/": {"replace": "required", "emptyValue": true}}}}"#,
            &[("required", "true")],
        );
        assert_eq!(state.empty_tokens.len(), 1);
        let (name, token) = &state.empty_tokens[0];
        assert_eq!(name, "required");
        assert_eq!(state.pending.get("required").unwrap(), token);
    }

    #[test]
    fn test_empty_value_tokens_are_unique() {
        let state = run(
            r#"{"input": {"attr": {"/^(required|checked)$/": {"replace": "%1", "emptyValue": true}}}}"#,
            &[("required", "true"), ("checked", "true")],
        );
        assert_eq!(state.empty_tokens.len(), 2);
        assert_ne!(state.empty_tokens[0].1, state.empty_tokens[1].1);
    }

    #[test]
    fn test_passthrough_directive_keeps_attribute() {
        let state = run(r#"{"div": {"attr": {"x": 42}}}"#, &[("x", "1"), ("y", "2")]);
        assert_eq!(pending(&state), vec![("x", "1"), ("y", "2")]);
    }

    #[test]
    fn test_literal_pattern_renames_substring() {
        let state = run(
            r#"{"div": {"attr": {"ng-": "data-ng-"}}}"#,
            &[("ng-click", "go()")],
        );
        assert_eq!(pending(&state), vec![("data-ng-click", "go()")]);
    }

    #[test]
    fn test_manipulation_applies_to_capture() {
        let state = run(
            r#"{"div": {"attr": {"/^x-([\\w-]+)$/": {
                "replace": "%a1",
                "manipulation": [{"type": "camelize", "match": 1}]
            }}}}"#,
            &[("x-my-attr", "1")],
        );
        assert_eq!(pending(&state), vec![("myAttr", "1")]);
    }

    #[test]
    fn test_rename_directive_shape() {
        let rules = RuleSet::from_json(r#"{"a": {"attr": {"b": "c"}}}"#).unwrap();
        assert!(matches!(
            rules.selectors[0].rules[0].directive,
            Directive::Rename(_)
        ));
    }
}
