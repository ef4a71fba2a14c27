//! # htmlconv
//!
//! Rewrite HTML element attributes according to declarative,
//! selector-scoped pattern rules.
//!
//! Rules map CSS selectors to attribute patterns (literal substrings or
//! `/…/` regexes) and replacement directives: rename, value rewriting
//! with `%N` back-references, merging sibling attributes into one, and
//! forcing valueless attributes. Tag structure and text content are left
//! intact.
//!
//! ## Example
//!
//! ```rust
//! use htmlconv::{convert, RuleSet};
//!
//! let rules = RuleSet::from_json(r#"{"img": {"attr": {"/^src$/": "data-src"}}}"#).unwrap();
//! let output = convert(r#"<img src="a.jpg">"#, Some(&rules)).unwrap();
//! assert!(output.contains(r#"<img data-src="a.jpg">"#));
//! ```
//!
//! Without rules the input is returned untouched, byte for byte:
//!
//! ```rust
//! use htmlconv::convert;
//!
//! let input = "<p>unchanged</p>";
//! assert_eq!(convert(input, None).unwrap(), input);
//! ```

mod convert;
mod driver;

pub use convert::convert;
pub use htmlconv_core::{ConvertError, Pattern, PatternKind, Result, RuleSet};
