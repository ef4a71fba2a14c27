//! Traversal driver: applies one selector group to its matched elements.

use std::collections::HashMap;

use ego_tree::NodeId;
use scraper::{Html, Selector};
use tracing::{debug, trace};

use htmlconv_core::{apply_rule, ConvertError, ElementState, Result, SelectorRules, TokenGen};

/// Apply every rule of `group` to every element the selector matches, in
/// document order.
///
/// Matching and attribute snapshots always come from the live document,
/// which is not mutated until the orchestrator flushes the side table;
/// each selector group therefore sees the original attribute set.
pub(crate) fn apply_selector(
    document: &Html,
    selector_index: usize,
    group: &SelectorRules,
    states: &mut HashMap<NodeId, ElementState>,
    tokens: &mut TokenGen,
) -> Result<()> {
    if group.rules.is_empty() {
        return Ok(());
    }

    let selector = Selector::parse(&group.selector).map_err(|err| {
        ConvertError::InvalidRule(format!("invalid selector {:?}: {err}", group.selector))
    })?;

    debug!(selector = %group.selector, "applying selector group");

    for element in document.select(&selector) {
        let snapshot: Vec<(String, String)> = element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        if snapshot.is_empty() {
            continue;
        }

        if let Some(guard) = &group.guard {
            if !snapshot.iter().any(|(name, _)| guard.is_match(name)) {
                trace!(selector = %group.selector, "guard unsatisfied, skipping element");
                continue;
            }
        }

        let state = states.entry(element.id()).or_default();
        for (attr, value) in &snapshot {
            for (rule_index, rule) in group.rules.iter().enumerate() {
                apply_rule(
                    state,
                    &snapshot,
                    attr,
                    value,
                    rule,
                    (selector_index, rule_index),
                    tokens,
                )?;
            }
        }
    }

    Ok(())
}
