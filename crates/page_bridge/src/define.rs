//! Declarative definition of paired (host stub, page body) functions.
//!
//! A [`NamespaceBuilder`] is the static table for one namespace: each
//! `function(name, params, body)` row becomes a page-side definition in the
//! [`ScriptRegistry`] and a host-callable [`BridgeFunction`] stub that forwards
//! to the invoker. Malformed rows are rejected when the table is installed,
//! never at call time.

use crate::invoker::{self, Arg};
use crate::naming::{bridge_function_name, is_valid_parameter, mangle};
use crate::registry::{FunctionEntry, FunctionKey, ScriptRegistry};
use crate::{BridgeError, Completion, JSValue, PageContext};
use log::warn;
use std::collections::BTreeMap;

/// Host-side stub for one page-side function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeFunction {
    namespace: String,
    name: String,
    params: Vec<String>,
}

impl BridgeFunction {
    /// Build the page-side definition of `name`, register it, and return its stub.
    ///
    /// # Errors
    /// Returns [`BridgeError::InvalidDefinition`] for empty names, invalid or duplicate
    /// parameter names, or a body with unbalanced brackets.
    pub fn define(
        registry: &mut ScriptRegistry,
        namespace: &str,
        name: &str,
        params: &[&str],
        body: &str,
    ) -> Result<Self, BridgeError> {
        let (entry, function) = Self::build(namespace, name, params, body)?;
        registry.register_entry(namespace, entry);
        Ok(function)
    }

    fn build(
        namespace: &str,
        name: &str,
        params: &[&str],
        body: &str,
    ) -> Result<(FunctionEntry, Self), BridgeError> {
        if namespace.trim().is_empty() || name.trim().is_empty() {
            return Err(BridgeError::InvalidDefinition(format!(
                "empty namespace or function name in {namespace:?}/{name:?}"
            )));
        }
        let mut mangled_params: Vec<String> = Vec::with_capacity(params.len());
        for param in params {
            let mangled = mangle(param);
            if !is_valid_parameter(&mangled) {
                return Err(BridgeError::InvalidDefinition(format!(
                    "{namespace}/{name}: invalid parameter name {param:?}"
                )));
            }
            if mangled_params.contains(&mangled) {
                return Err(BridgeError::InvalidDefinition(format!(
                    "{namespace}/{name}: duplicate parameter {param:?}"
                )));
            }
            mangled_params.push(mangled);
        }
        check_brackets(body).map_err(|reason| {
            BridgeError::InvalidDefinition(format!("{namespace}/{name}: {reason}"))
        })?;

        let global = bridge_function_name(namespace, name);
        let source = format!(
            "globalThis.{global} = function {global}({}) {{\n{}\n}};",
            mangled_params.join(", "),
            body.trim_matches('\n')
        );
        let entry = FunctionEntry {
            name: name.to_owned(),
            params: mangled_params.clone(),
            source,
        };
        let function = Self {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
            params: mangled_params,
        };
        Ok((entry, function))
    }

    /// Namespace of the function.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name of the function within its namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared (mangled) parameter names.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Registry key of the function.
    pub fn key(&self) -> FunctionKey {
        FunctionKey {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }

    /// Call the page-side function. A trailing [`Arg::Callback`] receives the result.
    ///
    /// # Errors
    /// Returns [`BridgeError::ContextUnavailable`] if the page is not live.
    pub fn invoke(&self, page: &mut dyn PageContext, args: Vec<Arg>) -> Result<(), BridgeError> {
        let (values, completion) = invoker::split_trailing_callback(args);
        self.dispatch(page, values, completion)
    }

    /// Call the page-side function and deliver its result to `completion`.
    ///
    /// # Errors
    /// Returns [`BridgeError::ContextUnavailable`] if the page is not live.
    pub fn invoke_with<F>(
        &self,
        page: &mut dyn PageContext,
        values: Vec<JSValue>,
        completion: F,
    ) -> Result<(), BridgeError>
    where
        F: FnOnce(Result<JSValue, BridgeError>) + 'static,
    {
        self.dispatch(page, values, Some(Box::new(completion)))
    }

    /// Call the page-side function without waiting for a result.
    ///
    /// # Errors
    /// Returns [`BridgeError::ContextUnavailable`] if the page is not live.
    pub fn notify(&self, page: &mut dyn PageContext, values: Vec<JSValue>) -> Result<(), BridgeError> {
        self.dispatch(page, values, None)
    }

    fn dispatch(
        &self,
        page: &mut dyn PageContext,
        values: Vec<JSValue>,
        completion: Option<Completion>,
    ) -> Result<(), BridgeError> {
        if values.len() != self.params.len() {
            warn!(
                "{}/{} declared {} parameter(s) but was called with {}",
                self.namespace,
                self.name,
                self.params.len(),
                values.len()
            );
        }
        invoker::call_values(page, &self.namespace, &self.name, &values, completion)
    }
}

/// Static table of functions for one namespace.
#[derive(Clone, Debug)]
pub struct NamespaceBuilder {
    namespace: String,
    rows: Vec<(String, Vec<String>, String)>,
}

impl NamespaceBuilder {
    /// Start a table for `namespace`.
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            rows: Vec::new(),
        }
    }

    /// Add a function row.
    #[must_use]
    pub fn function(mut self, name: &str, params: &[&str], body: &str) -> Self {
        self.rows.push((
            name.to_owned(),
            params.iter().map(|param| (*param).to_owned()).collect(),
            body.to_owned(),
        ));
        self
    }

    /// Validate every row and register it. Nothing is registered if any row is malformed.
    ///
    /// # Errors
    /// Returns [`BridgeError::InvalidDefinition`] for the first malformed row.
    pub fn install(self, registry: &mut ScriptRegistry) -> Result<DefinedNamespace, BridgeError> {
        let mut built = Vec::with_capacity(self.rows.len());
        for (name, params, body) in &self.rows {
            let param_refs: Vec<&str> = params.iter().map(String::as_str).collect();
            built.push(BridgeFunction::build(&self.namespace, name, &param_refs, body)?);
        }
        let mut functions = BTreeMap::new();
        for (entry, function) in built {
            registry.register_entry(&self.namespace, entry);
            functions.insert(function.name.clone(), function);
        }
        Ok(DefinedNamespace {
            namespace: self.namespace,
            functions,
        })
    }
}

/// Stubs produced by installing a [`NamespaceBuilder`].
#[derive(Clone, Debug)]
pub struct DefinedNamespace {
    namespace: String,
    functions: BTreeMap<String, BridgeFunction>,
}

impl DefinedNamespace {
    /// Namespace name.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Stub for `name`, if defined.
    pub fn get(&self, name: &str) -> Option<&BridgeFunction> {
        self.functions.get(name)
    }

    /// Stub for `name`, or an [`BridgeError::InvalidDefinition`] naming what is missing.
    ///
    /// # Errors
    /// Returns an error when the namespace has no function called `name`.
    pub fn require(&self, name: &str) -> Result<BridgeFunction, BridgeError> {
        self.get(name).cloned().ok_or_else(|| {
            BridgeError::InvalidDefinition(format!("{} does not define {name}", self.namespace))
        })
    }
}

/// Reject bodies whose brackets do not pair up, skipping strings and comments.
fn check_brackets(body: &str) -> Result<(), String> {
    let mut stack: Vec<char> = Vec::new();
    let mut chars = body.chars().peekable();
    while let Some(character) = chars.next() {
        match character {
            '"' | '\'' | '`' => {
                let quote = character;
                let mut closed = false;
                while let Some(inner) = chars.next() {
                    if inner == '\\' {
                        chars.next();
                    } else if inner == quote {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(format!("unterminated {quote} string"));
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut last = '\0';
                let mut closed = false;
                for inner in chars.by_ref() {
                    if last == '*' && inner == '/' {
                        closed = true;
                        break;
                    }
                    last = inner;
                }
                if !closed {
                    return Err(String::from("unterminated block comment"));
                }
            }
            '(' | '[' | '{' => stack.push(character),
            ')' | ']' | '}' => {
                let expected = match character {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return Err(format!("unbalanced {character:?}"));
                }
            }
            _ => {}
        }
    }
    match stack.last() {
        Some(open) => Err(format!("unclosed {open:?}")),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brackets_inside_strings_and_comments_are_ignored() {
        assert_eq!(check_brackets("var a = '{'; // )\n/* ] */ return [a];"), Ok(()));
        assert!(check_brackets("if (x) { return 1;").is_err());
        assert!(check_brackets("return (1]);").is_err());
        assert!(check_brackets("return \"open;").is_err());
    }
}
