//! Configuration settings for interactive selection.
//!
//! This module defines the highlight styles pushed into the page and how
//! candidates are collected. Configuration can be loaded from environment
//! variables or constructed programmatically.

use std::collections::BTreeMap;
use std::env;

/// CSS declarations as `attribute -> value`.
pub type StyleRules = BTreeMap<String, String>;

/// Runtime configuration for selection commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Style of every element matching the current input.
    pub candidate_style: StyleRules,
    /// Style of the element the user points at.
    pub selected_style: StyleRules,
    /// Only offer links currently visible in the viewport.
    pub viewport_only: bool,
}

impl SelectionConfig {
    /// Construct a new `SelectionConfig` with explicit values.
    #[inline]
    #[must_use]
    pub fn new(
        candidate_style: StyleRules,
        selected_style: StyleRules,
        viewport_only: bool,
    ) -> Self {
        Self {
            candidate_style,
            selected_style,
            viewport_only,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `PAGE_SELECT_CANDIDATE_STYLE`: `attr:value;attr:value` rules for matching elements
    /// - `PAGE_SELECT_SELECTED_STYLE`: `attr:value;attr:value` rules for the pointed-at element
    /// - `PAGE_SELECT_VIEWPORT_ONLY`: Set to "0" to offer off-screen links too (default: on)
    ///
    /// Unset or empty style variables keep the defaults.
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let candidate_style = env::var("PAGE_SELECT_CANDIDATE_STYLE")
            .ok()
            .map(|raw| parse_style(&raw))
            .filter(|rules| !rules.is_empty())
            .unwrap_or(defaults.candidate_style);
        let selected_style = env::var("PAGE_SELECT_SELECTED_STYLE")
            .ok()
            .map(|raw| parse_style(&raw))
            .filter(|rules| !rules.is_empty())
            .unwrap_or(defaults.selected_style);
        let viewport_only = env::var("PAGE_SELECT_VIEWPORT_ONLY").ok().as_deref() != Some("0");
        Self {
            candidate_style,
            selected_style,
            viewport_only,
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            candidate_style: rules(&[("border", "1px dashed blue"), ("background", "#0000ff20")]),
            selected_style: rules(&[("border", "1px dashed red"), ("background", "#ff000020")]),
            viewport_only: true,
        }
    }
}

fn rules(pairs: &[(&str, &str)]) -> StyleRules {
    pairs
        .iter()
        .map(|(attribute, value)| ((*attribute).to_owned(), (*value).to_owned()))
        .collect()
}

/// Parse `attr:value;attr:value`; malformed declarations are ignored.
pub fn parse_style(raw: &str) -> StyleRules {
    raw.split(';')
        .filter_map(|declaration| {
            let (attribute, value) = declaration.split_once(':')?;
            let attribute = attribute.trim();
            let value = value.trim();
            (!attribute.is_empty() && !value.is_empty())
                .then(|| (attribute.to_owned(), value.to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declarations_and_skips_garbage() {
        let parsed = parse_style(" border : 2px solid green ; bogus; background:#fff;:x");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get("border").map(String::as_str), Some("2px solid green"));
        assert_eq!(parsed.get("background").map(String::as_str), Some("#fff"));
    }

    #[test]
    fn defaults_style_both_classes() {
        let config = SelectionConfig::default();
        assert!(config.candidate_style.contains_key("border"));
        assert!(config.selected_style.contains_key("background"));
        assert!(config.viewport_only);
    }
}
