//! Per-namespace storage of page-side function definitions.
//!
//! The registry never touches a page; it only produces the concatenated
//! injection script that [`crate::BridgeHost`] runs.

use std::collections::BTreeMap;

/// Key identifying a registered function.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionKey {
    /// Namespace the function belongs to.
    pub namespace: String,
    /// Function name, unique within the namespace.
    pub name: String,
}

/// One registered function definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionEntry {
    /// Function name, unique within its namespace.
    pub name: String,
    /// Declared parameter names, already mangled.
    pub params: Vec<String>,
    /// Self-contained script-context definition.
    pub source: String,
}

/// Registered definitions grouped by namespace, kept in registration order.
#[derive(Clone, Debug, Default)]
pub struct ScriptRegistry {
    namespaces: BTreeMap<String, Vec<FunctionEntry>>,
}

impl ScriptRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` as the definition of `name` in `namespace`.
    pub fn register(&mut self, namespace: &str, name: &str, source: &str) -> FunctionKey {
        self.register_entry(
            namespace,
            FunctionEntry {
                name: name.to_owned(),
                params: Vec::new(),
                source: source.to_owned(),
            },
        )
    }

    /// Insert `entry`, replacing an existing entry of the same name in place.
    pub fn register_entry(&mut self, namespace: &str, entry: FunctionEntry) -> FunctionKey {
        let key = FunctionKey {
            namespace: namespace.to_owned(),
            name: entry.name.clone(),
        };
        let entries = self.namespaces.entry(namespace.to_owned()).or_default();
        if let Some(existing) = entries
            .iter_mut()
            .find(|existing| existing.name == entry.name)
        {
            *existing = entry;
        } else {
            entries.push(entry);
        }
        key
    }

    /// Look up a single entry.
    pub fn get(&self, namespace: &str, name: &str) -> Option<&FunctionEntry> {
        self.namespaces
            .get(namespace)?
            .iter()
            .find(|entry| entry.name == name)
    }

    /// Entries of `namespace` in registration order (empty for unknown namespaces).
    pub fn entries(&self, namespace: &str) -> &[FunctionEntry] {
        self.namespaces
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Names of every namespace with at least one entry.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// Concatenate every definition of `namespace` into one script.
    /// Returns an empty string for an unknown namespace.
    pub fn render_injection_script(&self, namespace: &str) -> String {
        self.entries(namespace)
            .iter()
            .map(|entry| entry.source.trim_end().trim_end_matches(';'))
            .collect::<Vec<_>>()
            .join(";\n")
    }
}
