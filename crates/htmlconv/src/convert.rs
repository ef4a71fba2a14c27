//! Top-level conversion: parse, apply every selector group, flush, and
//! serialize.

use std::collections::HashMap;

use html5ever::tendril::StrTendril;
use html5ever::{namespace_url, ns, LocalName, QualName};
use scraper::{Html, Node};
use tracing::debug;

use htmlconv_core::{RuleSet, TokenGen};

use crate::driver::apply_selector;
use crate::Result;

/// Rewrite the attributes of `input` according to `rules`.
///
/// With no rules (or an empty rule set) the input string is returned
/// unchanged, without a parse/serialize round trip, so untouched
/// documents keep their exact original bytes.
///
/// Selector groups run in rule-set order and all match against the
/// original document; pending attribute changes are committed to the
/// tree only after every group has run, then the document is serialized.
/// Attributes rewritten with `emptyValue` carry a generated stand-in
/// token in the tree, stripped from the serialized output here because
/// the serializer cannot emit a valueless attribute.
pub fn convert(input: &str, rules: Option<&RuleSet>) -> Result<String> {
    let Some(rules) = rules.filter(|rules| !rules.is_empty()) else {
        return Ok(input.to_string());
    };

    let mut document = Html::parse_document(input);
    let mut states = HashMap::new();
    let mut tokens = TokenGen::default();

    for (selector_index, group) in rules.selectors.iter().enumerate() {
        apply_selector(&document, selector_index, group, &mut states, &mut tokens)?;
    }

    debug!(elements = states.len(), "flushing pending attribute caches");

    let mut empty_tokens = Vec::new();
    for (id, state) in states {
        if let Some(mut node) = document.tree.get_mut(id) {
            if let Node::Element(element) = node.value() {
                element.attrs.clear();
                for (name, value) in &state.pending {
                    element.attrs.insert(
                        QualName::new(None, ns!(), LocalName::from(name.as_str())),
                        StrTendril::from(value.as_str()),
                    );
                }
            }
        }
        empty_tokens.extend(state.empty_tokens);
    }

    let mut output = document.html();
    for (name, token) in &empty_tokens {
        output = output.replace(&format!("{name}=\"{token}\""), name);
    }

    Ok(output)
}
