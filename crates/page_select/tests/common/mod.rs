//! Shared test helpers: an in-memory page context.
//!
//! `FakePage` records every executed script and answers bridge calls with
//! canned values. Results are only delivered on `pump`/`wait`, like a real page.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use page_bridge::{BRIDGE_PREFIX, BridgeError, Completion, JSValue, PageContext, bridge_function_name};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct FakePage {
    context_id: u64,
    document_id: u64,
    live: bool,
    scripts: Vec<String>,
    responses: HashMap<String, Result<Value, String>>,
    queued: VecDeque<(Completion, Result<JSValue, BridgeError>)>,
}

impl FakePage {
    pub fn new(context_id: u64) -> Self {
        Self {
            context_id,
            document_id: 1,
            live: true,
            scripts: Vec::new(),
            responses: HashMap::new(),
            queued: VecDeque::new(),
        }
    }

    /// Make `namespace/name` return `value`.
    pub fn respond(&mut self, namespace: &str, name: &str, value: Value) {
        self.responses
            .insert(bridge_function_name(namespace, name), Ok(value));
    }

    /// Make `namespace/name` throw `message`.
    pub fn throw(&mut self, namespace: &str, name: &str, message: &str) {
        self.responses
            .insert(bridge_function_name(namespace, name), Err(message.to_owned()));
    }

    pub fn close(&mut self) {
        self.live = false;
    }

    pub fn navigate(&mut self) {
        self.document_id += 1;
    }

    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    /// Global names of bridge calls, in execution order.
    pub fn call_order(&self) -> Vec<String> {
        self.scripts
            .iter()
            .filter_map(|script| split_call(script).map(|(name, _)| name.to_owned()))
            .collect()
    }

    /// Decoded arguments of every call to `namespace/name`.
    pub fn calls(&self, namespace: &str, name: &str) -> Vec<Vec<Value>> {
        let wanted = bridge_function_name(namespace, name);
        self.scripts
            .iter()
            .filter_map(|script| split_call(script))
            .filter(|(function, _)| *function == wanted)
            .map(|(_, args)| {
                let decoded: Value =
                    serde_json::from_str(&format!("[{args}]")).expect("arguments are JSON literals");
                match decoded {
                    Value::Array(items) => items,
                    other => vec![other],
                }
            })
            .collect()
    }

    /// Position of the first call to `namespace/name`.
    pub fn position(&self, namespace: &str, name: &str) -> Option<usize> {
        let wanted = bridge_function_name(namespace, name);
        self.call_order().iter().position(|function| *function == wanted)
    }

    fn deliver_all(&mut self) -> usize {
        let mut delivered = 0;
        while let Some((completion, result)) = self.queued.pop_front() {
            completion(result);
            delivered += 1;
        }
        delivered
    }
}

/// Split `__bridge_x_y(args)` into its function name and argument text.
fn split_call(script: &str) -> Option<(&str, &str)> {
    if !script.starts_with(BRIDGE_PREFIX) {
        return None;
    }
    let open = script.find('(')?;
    let args = script[open + 1..].strip_suffix(')')?;
    Some((&script[..open], args))
}

impl PageContext for FakePage {
    fn context_id(&self) -> u64 {
        self.context_id
    }

    fn document_id(&self) -> u64 {
        self.document_id
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn execute(&mut self, source: &str, completion: Option<Completion>) -> Result<(), BridgeError> {
        if !self.live {
            return Err(BridgeError::ContextUnavailable);
        }
        self.scripts.push(source.to_owned());
        if let Some(completion) = completion {
            let response = split_call(source)
                .and_then(|(name, _)| self.responses.get(name).cloned())
                .unwrap_or(Ok(Value::Null));
            let result = response
                .map(JSValue::from)
                .map_err(BridgeError::CallbackDeliveryFailure);
            self.queued.push_back((completion, result));
        }
        Ok(())
    }

    fn pump(&mut self) -> Result<usize, BridgeError> {
        Ok(self.deliver_all())
    }

    fn wait(&mut self) -> Result<usize, BridgeError> {
        Ok(self.deliver_all())
    }
}
