//! Named style blocks inserted into the page head.

use crate::JSValue;
use crate::naming::mangle;
use std::collections::BTreeMap;

/// A named set of class rules, each an `attribute -> value` map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleSheet {
    name: String,
    rules: BTreeMap<String, BTreeMap<String, String>>,
}

impl StyleSheet {
    /// Create an empty sheet called `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            rules: BTreeMap::new(),
        }
    }

    /// Add (or replace) the rule for `class`.
    #[must_use]
    pub fn with_rule<I, K, V>(mut self, class: &str, declarations: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.rules.insert(
            class.to_owned(),
            declarations
                .into_iter()
                .map(|(attribute, value)| (attribute.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Sheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the `<style>` element carrying this sheet.
    pub fn element_id(&self) -> String {
        format!("__bridge_style_{}", mangle(&self.name))
    }

    /// Render the rules as CSS text.
    pub fn css(&self) -> String {
        self.rules
            .iter()
            .map(|(class, declarations)| {
                let body = declarations
                    .iter()
                    .map(|(attribute, value)| format!("{attribute}: {value};"))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!(".{class} {{ {body} }}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Script inserting the sheet into the head unless an element with its id already exists.
    pub fn injection_script(&self) -> String {
        let id = JSValue::from(self.element_id()).to_literal();
        let css = JSValue::from(self.css()).to_literal();
        format!(
            "(function() {{\n  if (document.getElementById({id})) {{ return; }}\n  var style = document.createElement('style');\n  style.id = {id};\n  style.textContent = {css};\n  (document.head || document.documentElement).appendChild(style);\n}})();"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_rules_in_class_order() {
        let sheet = StyleSheet::new("link-hints")
            .with_rule("selected", [("border", "1px dashed red")])
            .with_rule(
                "candidate",
                [("border", "1px dashed blue"), ("background", "#0000ff20")],
            );
        assert_eq!(
            sheet.css(),
            ".candidate { background: #0000ff20; border: 1px dashed blue; }\n.selected { border: 1px dashed red; }"
        );
        assert_eq!(sheet.element_id(), "__bridge_style_link_hints");
    }

    #[test]
    fn injection_is_guarded_by_existence_check() {
        let script = StyleSheet::new("s").injection_script();
        assert!(script.contains("if (document.getElementById(\"__bridge_style_s\")) { return; }"));
        assert_eq!(script.matches("appendChild").count(), 1);
    }
}
