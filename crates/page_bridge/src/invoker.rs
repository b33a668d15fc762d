//! Host-side invocation of page-side bridge functions.
//!
//! Arguments are encoded as page literals and spliced into a call of the
//! function's global name. The page answers asynchronously: a result, when
//! requested, reaches the callback on a later pump of the page context.

use crate::naming::bridge_function_name;
use crate::{BridgeError, Completion, JSValue, PageContext};
use log::{trace, warn};
use std::fmt::{Debug, Formatter, Result as FmtResult};

/// One positional argument of a bridge call.
pub enum Arg {
    /// A value encoded into the call expression.
    Value(JSValue),
    /// A result callback; only honoured in trailing position.
    Callback(Completion),
}

impl Arg {
    /// Wrap anything convertible into a value argument.
    pub fn value<T: Into<JSValue>>(value: T) -> Self {
        Self::Value(value.into())
    }

    /// Wrap a result callback.
    pub fn callback<F>(callback: F) -> Self
    where
        F: FnOnce(Result<JSValue, BridgeError>) + 'static,
    {
        Self::Callback(Box::new(callback))
    }
}

impl From<JSValue> for Arg {
    fn from(value: JSValue) -> Self {
        Self::Value(value)
    }
}

impl Debug for Arg {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Separate a trailing callback from the encoded arguments.
///
/// A callback anywhere else cannot be encoded and is passed as `undefined`.
pub fn split_trailing_callback(mut args: Vec<Arg>) -> (Vec<JSValue>, Option<Completion>) {
    let completion = match args.pop() {
        Some(Arg::Callback(callback)) => Some(callback),
        Some(other) => {
            args.push(other);
            None
        }
        None => None,
    };
    let values = args
        .into_iter()
        .enumerate()
        .map(|(position, arg)| match arg {
            Arg::Value(value) => value,
            Arg::Callback(_) => {
                warn!("callback at argument {position} is not trailing; passing undefined");
                JSValue::Undefined
            }
        })
        .collect();
    (values, completion)
}

/// Build `<global-name>(<encoded-args>)` for `(namespace, name)`.
pub fn call_expression(namespace: &str, name: &str, values: &[JSValue]) -> String {
    let mut expression = bridge_function_name(namespace, name);
    expression.push('(');
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            expression.push(',');
        }
        value.write_literal(&mut expression);
    }
    expression.push(')');
    expression
}

/// Call `name` in `namespace` with positional `args`; a trailing callback receives the result.
///
/// # Errors
/// Returns [`BridgeError::ContextUnavailable`] if the page is not live.
pub fn call(
    page: &mut dyn PageContext,
    namespace: &str,
    name: &str,
    args: Vec<Arg>,
) -> Result<(), BridgeError> {
    let (values, completion) = split_trailing_callback(args);
    call_values(page, namespace, name, &values, completion)
}

/// Call with already separated values and completion.
///
/// # Errors
/// Returns [`BridgeError::ContextUnavailable`] if the page is not live.
pub fn call_values(
    page: &mut dyn PageContext,
    namespace: &str,
    name: &str,
    values: &[JSValue],
    completion: Option<Completion>,
) -> Result<(), BridgeError> {
    if !page.is_live() {
        return Err(BridgeError::ContextUnavailable);
    }
    let expression = call_expression(namespace, name, values);
    trace!(
        "bridge call on page {}: {expression} (callback: {})",
        page.context_id(),
        completion.is_some()
    );
    page.execute(&expression, completion)
}
