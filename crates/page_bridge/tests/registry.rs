//! Tests for the script registry and the namespace definition facility.
//!
//! These validate registration order, in-place replacement, the rendered
//! injection script, and definition-time rejection of malformed rows.

use page_bridge::{BridgeError, BridgeFunction, NamespaceBuilder, ScriptRegistry};

/// Unknown namespaces render to an empty script instead of failing.
#[test]
fn unknown_namespace_renders_empty_script() {
    let registry = ScriptRegistry::new();
    assert_eq!(registry.render_injection_script("missing"), "");
    assert!(registry.entries("missing").is_empty());
}

/// Re-registering a name replaces the source but keeps its original position.
#[test]
fn reregistering_replaces_in_place() {
    let mut registry = ScriptRegistry::new();
    registry.register("ns", "first", "var a = 1;");
    let key = registry.register("ns", "second", "var b = 2;");
    registry.register("ns", "first", "var a = 3;");

    assert_eq!(key.namespace, "ns");
    assert_eq!(key.name, "second");
    assert_eq!(registry.entries("ns").len(), 2);
    assert_eq!(
        registry.render_injection_script("ns"),
        "var a = 3;\nvar b = 2"
    );
}

/// Namespaces are kept apart.
#[test]
fn namespaces_do_not_mix() {
    let mut registry = ScriptRegistry::new();
    registry.register("one", "f", "1");
    registry.register("two", "f", "2");
    assert_eq!(registry.render_injection_script("one"), "1");
    assert_eq!(registry.render_injection_script("two"), "2");
    assert_eq!(registry.namespaces().collect::<Vec<_>>(), vec!["one", "two"]);
}

/// A defined function is registered under its mangled global name with mangled parameters.
#[test]
fn define_builds_global_function_source() {
    let mut registry = ScriptRegistry::new();
    let function = BridgeFunction::define(
        &mut registry,
        "link-hints",
        "highlight",
        &["matching-ids", "selected"],
        "return matching_ids.length;",
    )
    .expect("definition is valid");

    assert_eq!(function.params(), ["matching_ids", "selected"]);
    let entry = registry
        .get("link-hints", "highlight")
        .expect("entry registered");
    assert_eq!(
        entry.source,
        "globalThis.__bridge_link_hints_highlight = function __bridge_link_hints_highlight(matching_ids, selected) {\nreturn matching_ids.length;\n};"
    );
}

/// Builder rows are validated as a whole; a bad row registers nothing.
#[test]
fn builder_rejects_malformed_rows_atomically() {
    let mut registry = ScriptRegistry::new();
    let result = NamespaceBuilder::new("ns")
        .function("ok", &[], "return 1;")
        .function("broken", &["a", "a"], "return a;")
        .install(&mut registry);

    assert!(matches!(result, Err(BridgeError::InvalidDefinition(_))));
    assert!(registry.entries("ns").is_empty());
}

/// Unbalanced bodies and reserved parameter names are definition errors.
#[test]
fn malformed_templates_are_rejected() {
    let mut registry = ScriptRegistry::new();
    assert!(BridgeFunction::define(&mut registry, "ns", "f", &[], "if (x) {").is_err());
    assert!(BridgeFunction::define(&mut registry, "ns", "f", &["var"], "return 1;").is_err());
    assert!(BridgeFunction::define(&mut registry, "", "f", &[], "return 1;").is_err());
}

/// Installed namespaces hand out their stubs by name.
#[test]
fn defined_namespace_exposes_stubs() {
    let mut registry = ScriptRegistry::new();
    let defined = NamespaceBuilder::new("sections")
        .function("fetch", &[], "return {};")
        .function("action", &["id"], "return id;")
        .install(&mut registry)
        .expect("valid table");

    assert_eq!(defined.namespace(), "sections");
    assert_eq!(
        defined.get("action").map(BridgeFunction::params),
        Some(&[String::from("id")][..])
    );
    assert!(defined.require("cleanup").is_err());
    assert_eq!(registry.entries("sections").len(), 2);
}
