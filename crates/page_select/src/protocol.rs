//! Page-side protocols for the built-in selection namespaces.
//!
//! Every namespace implements the same four functions:
//! - `fetch() -> {id: [label, target]}`: collect candidates and remember them page-side
//! - `highlight(matchingIds, selectedId)`: clear markers, mark matches, mark and reveal the selection
//! - `action(selectedId)`: act on the chosen element
//! - `cleanup()`: remove every marker and forget the remembered elements
//!
//! Page elements never cross the bridge; the host refers to them by id only.

use crate::config::{SelectionConfig, StyleRules};
use page_bridge::{BridgeError, BridgeFunction, NamespaceBuilder, ScriptRegistry, StyleSheet, mangle};

/// Namespace for following links.
pub const LINK_HINTS: &str = "link-hints";
/// Namespace for jumping to headings.
pub const SECTIONS: &str = "sections";

const LINK_FETCH: &str = r"
var viewportOnly = @VIEWPORT_ONLY@;
var store = [];
var result = {};
var anchors = document.querySelectorAll('a[href]');
for (var i = 0; i < anchors.length; i++) {
  var anchor = anchors[i];
  if (viewportOnly) {
    var rect = anchor.getBoundingClientRect();
    if (rect.width === 0 || rect.height === 0 || rect.bottom < 0 || rect.right < 0 ||
        rect.top > window.innerHeight || rect.left > window.innerWidth) {
      continue;
    }
  }
  var id = store.length;
  store.push(anchor);
  result[id] = [anchor.innerText || anchor.textContent || anchor.href, anchor.href];
}
globalThis.@STORE@ = store;
return result;
";

const LINK_ACTION: &str = r"
var element = (globalThis.@STORE@ || [])[selected];
if (element) {
  element.click();
}
";

const SECTION_FETCH: &str = r"
var store = [];
var result = {};
var headings = document.querySelectorAll('h1, h2, h3, h4, h5, h6');
for (var i = 0; i < headings.length; i++) {
  var heading = headings[i];
  var title = heading.textContent || '';
  if (!title.trim()) {
    continue;
  }
  var id = store.length;
  store.push(heading);
  result[id] = [title, title];
}
globalThis.@STORE@ = store;
return result;
";

const SECTION_ACTION: &str = r"
var element = (globalThis.@STORE@ || [])[selected];
if (element) {
  element.scrollIntoView({block: 'start'});
}
";

const HIGHLIGHT: &str = r"
var store = globalThis.@STORE@ || [];
for (var i = 0; i < store.length; i++) {
  store[i].classList.remove('@CANDIDATE@', '@SELECTED@');
}
if (matching) {
  for (var j = 0; j < matching.length; j++) {
    var element = store[matching[j]];
    if (element) {
      element.classList.add('@CANDIDATE@');
    }
  }
}
if (selected !== null && selected !== undefined && store[selected]) {
  store[selected].classList.add('@SELECTED@');
  store[selected].scrollIntoView({block: 'nearest', inline: 'nearest'});
}
";

const CLEANUP: &str = r"
var store = globalThis.@STORE@ || [];
for (var i = 0; i < store.length; i++) {
  store[i].classList.remove('@CANDIDATE@', '@SELECTED@');
}
delete globalThis.@STORE@;
";

/// Substitute `@KEY@` placeholders.
fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    substitutions
        .iter()
        .fold(template.to_owned(), |body, (key, value)| {
            body.replace(&format!("@{key}@"), value)
        })
}

/// Script bodies of the namespace-specific functions.
struct Bodies<'a> {
    fetch: &'a str,
    action: &'a str,
}

/// The four stubs and the style sheet of one selection namespace.
#[derive(Clone, Debug)]
pub struct PageProtocol {
    namespace: String,
    style: StyleSheet,
    fetch: BridgeFunction,
    highlight: BridgeFunction,
    action: BridgeFunction,
    cleanup: BridgeFunction,
}

impl PageProtocol {
    /// Register the link-following namespace.
    ///
    /// # Errors
    /// Returns [`BridgeError::InvalidDefinition`] if a body fails validation.
    pub fn link_hints(
        registry: &mut ScriptRegistry,
        config: &SelectionConfig,
    ) -> Result<Self, BridgeError> {
        let viewport_only = if config.viewport_only { "true" } else { "false" };
        let fetch = render(LINK_FETCH, &[("VIEWPORT_ONLY", viewport_only)]);
        Self::install(
            registry,
            LINK_HINTS,
            config,
            &Bodies {
                fetch: &fetch,
                action: LINK_ACTION,
            },
        )
    }

    /// Register the heading navigation namespace.
    ///
    /// # Errors
    /// Returns [`BridgeError::InvalidDefinition`] if a body fails validation.
    pub fn sections(
        registry: &mut ScriptRegistry,
        config: &SelectionConfig,
    ) -> Result<Self, BridgeError> {
        Self::install(
            registry,
            SECTIONS,
            config,
            &Bodies {
                fetch: SECTION_FETCH,
                action: SECTION_ACTION,
            },
        )
    }

    fn install(
        registry: &mut ScriptRegistry,
        namespace: &str,
        config: &SelectionConfig,
        bodies: &Bodies<'_>,
    ) -> Result<Self, BridgeError> {
        let store = format!("__bridge_{}_elements", mangle(namespace));
        let candidate = candidate_class(namespace);
        let selected = selected_class(namespace);
        let substitutions = [
            ("STORE", store.as_str()),
            ("CANDIDATE", candidate.as_str()),
            ("SELECTED", selected.as_str()),
        ];
        let defined = NamespaceBuilder::new(namespace)
            .function("fetch", &[], &render(bodies.fetch, &substitutions))
            .function(
                "highlight",
                &["matching", "selected"],
                &render(HIGHLIGHT, &substitutions),
            )
            .function("action", &["selected"], &render(bodies.action, &substitutions))
            .function("cleanup", &[], &render(CLEANUP, &substitutions))
            .install(registry)?;
        Ok(Self {
            namespace: namespace.to_owned(),
            style: style_sheet(namespace, &config.candidate_style, &config.selected_style),
            fetch: defined.require("fetch")?,
            highlight: defined.require("highlight")?,
            action: defined.require("action")?,
            cleanup: defined.require("cleanup")?,
        })
    }

    /// Namespace name.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Highlight styles for this namespace.
    pub const fn style(&self) -> &StyleSheet {
        &self.style
    }

    /// `fetch()` stub.
    pub const fn fetch(&self) -> &BridgeFunction {
        &self.fetch
    }

    /// `highlight(matchingIds, selectedId)` stub.
    pub const fn highlight(&self) -> &BridgeFunction {
        &self.highlight
    }

    /// `action(selectedId)` stub.
    pub const fn action(&self) -> &BridgeFunction {
        &self.action
    }

    /// `cleanup()` stub.
    pub const fn cleanup(&self) -> &BridgeFunction {
        &self.cleanup
    }
}

/// CSS class of elements matching the input.
pub fn candidate_class(namespace: &str) -> String {
    format!("bridge-{}-candidate", mangle(namespace))
}

/// CSS class of the pointed-at element.
pub fn selected_class(namespace: &str) -> String {
    format!("bridge-{}-selected", mangle(namespace))
}

fn style_sheet(namespace: &str, candidate: &StyleRules, selected: &StyleRules) -> StyleSheet {
    StyleSheet::new(namespace)
        .with_rule(&candidate_class(namespace), candidate.clone())
        .with_rule(&selected_class(namespace), selected.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_fully_substituted() {
        let mut registry = ScriptRegistry::new();
        PageProtocol::link_hints(&mut registry, &SelectionConfig::default())
            .expect("built-in bodies are valid");
        PageProtocol::sections(&mut registry, &SelectionConfig::default())
            .expect("built-in bodies are valid");
        for namespace in [LINK_HINTS, SECTIONS] {
            let script = registry.render_injection_script(namespace);
            assert!(!script.contains('@'), "unsubstituted placeholder in {namespace}");
            assert_eq!(registry.entries(namespace).len(), 4);
        }
    }

    #[test]
    fn selected_rule_follows_candidate_rule() {
        let sheet = style_sheet(
            LINK_HINTS,
            &SelectionConfig::default().candidate_style,
            &SelectionConfig::default().selected_style,
        );
        let css = sheet.css();
        let candidate = css.find("bridge-link_hints-candidate").expect("candidate rule");
        let selected = css.find("bridge-link_hints-selected").expect("selected rule");
        assert!(candidate < selected);
    }
}
