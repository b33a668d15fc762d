//! Channel transport between the host loop and an embedder that owns the page.
//!
//! [`ChannelPage`] is the host half: it implements [`PageContext`] by sending
//! [`ScriptRequest`]s and keeping completions until the matching
//! [`ScriptReply`] arrives. [`PageEndpoint`] is the embedder half: it runs each
//! script with a handler and sends results back. Both messages are serde types
//! so an embedder can forward them over its own IPC.

use crate::{BridgeError, Completion, JSValue, PageConsole, PageContext};
use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// A script to run in the page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRequest {
    /// Request id, echoed in the reply.
    pub id: u64,
    /// Classic script source.
    pub source: String,
    /// Whether the host waits for the script's value.
    pub wants_result: bool,
}

/// The value (or error message) a script produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptReply {
    /// Id of the request this answers.
    pub id: u64,
    /// The script's value, or the message of what it threw.
    pub result: Result<Value, String>,
}

/// Create a connected host/embedder pair for page context `context_id`.
pub fn channel_page(context_id: u64) -> (ChannelPage, PageEndpoint) {
    let (request_tx, request_rx) = unbounded_channel();
    let (reply_tx, reply_rx) = unbounded_channel();
    let document = Arc::new(AtomicU64::new(1));
    let page = ChannelPage {
        context_id,
        document: Arc::clone(&document),
        requests: request_tx,
        replies: reply_rx,
        pending: HashMap::new(),
        next_id: 0,
    };
    let endpoint = PageEndpoint {
        context_id,
        document,
        requests: request_rx,
        replies: reply_tx,
    };
    (page, endpoint)
}

/// Host half of a channel transport.
pub struct ChannelPage {
    context_id: u64,
    document: Arc<AtomicU64>,
    requests: UnboundedSender<ScriptRequest>,
    replies: UnboundedReceiver<ScriptReply>,
    pending: HashMap<u64, Completion>,
    next_id: u64,
}

impl ChannelPage {
    /// Number of completions still waiting for a reply.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.next_id
    }

    fn deliver(&mut self, reply: ScriptReply) -> bool {
        let Some(completion) = self.pending.remove(&reply.id) else {
            PageConsole::debug(
                self.context_id,
                format!("reply for unknown request {}", reply.id),
            );
            return false;
        };
        completion(
            reply
                .result
                .map(JSValue::from)
                .map_err(BridgeError::CallbackDeliveryFailure),
        );
        true
    }

    /// Fail every outstanding completion once the embedder is gone.
    fn fail_pending(&mut self) -> usize {
        let failed = self.pending.len();
        for (_, completion) in self.pending.drain() {
            completion(Err(BridgeError::ContextUnavailable));
        }
        failed
    }
}

impl PageContext for ChannelPage {
    fn context_id(&self) -> u64 {
        self.context_id
    }

    fn document_id(&self) -> u64 {
        self.document.load(Ordering::Acquire)
    }

    fn is_live(&self) -> bool {
        !self.requests.is_closed()
    }

    fn execute(&mut self, source: &str, completion: Option<Completion>) -> Result<(), BridgeError> {
        let id = self.allocate_id();
        let request = ScriptRequest {
            id,
            source: source.to_owned(),
            wants_result: completion.is_some(),
        };
        self.requests
            .send(request)
            .map_err(|_| BridgeError::ContextUnavailable)?;
        if let Some(completion) = completion {
            self.pending.insert(id, completion);
        }
        Ok(())
    }

    fn pump(&mut self) -> Result<usize, BridgeError> {
        let mut delivered = 0;
        loop {
            match self.replies.try_recv() {
                Ok(reply) => {
                    if self.deliver(reply) {
                        delivered += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    delivered += self.fail_pending();
                    break;
                }
            }
        }
        Ok(delivered)
    }

    /// Must not be called from inside an async runtime; it blocks the thread.
    fn wait(&mut self) -> Result<usize, BridgeError> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        loop {
            let Some(reply) = self.replies.blocking_recv() else {
                self.fail_pending();
                return Err(BridgeError::ContextUnavailable);
            };
            if self.deliver(reply) {
                return Ok(1 + self.pump()?);
            }
        }
    }
}

/// Embedder half of a channel transport.
pub struct PageEndpoint {
    context_id: u64,
    document: Arc<AtomicU64>,
    requests: UnboundedReceiver<ScriptRequest>,
    replies: UnboundedSender<ScriptReply>,
}

impl PageEndpoint {
    /// Record that the page loaded a new document.
    pub fn navigated(&self) {
        self.document.fetch_add(1, Ordering::AcqRel);
    }

    /// Identifier of the current document.
    pub fn document_id(&self) -> u64 {
        self.document.load(Ordering::Acquire)
    }

    /// Run every request already queued, without blocking. Returns how many ran.
    pub fn serve_pending<F>(&mut self, mut handler: F) -> usize
    where
        F: FnMut(&str) -> anyhow::Result<Value>,
    {
        let mut served = 0;
        while let Ok(request) = self.requests.try_recv() {
            self.answer(request, &mut handler);
            served += 1;
        }
        served
    }

    /// Serve requests on the current thread until the host half is dropped.
    pub fn serve_blocking<F>(mut self, mut handler: F)
    where
        F: FnMut(&str) -> anyhow::Result<Value>,
    {
        while let Some(request) = self.requests.blocking_recv() {
            self.answer(request, &mut handler);
        }
    }

    /// Serve requests as an async task until the host half is dropped.
    pub async fn serve<F>(mut self, mut handler: F)
    where
        F: FnMut(&str) -> anyhow::Result<Value>,
    {
        while let Some(request) = self.requests.recv().await {
            self.answer(request, &mut handler);
        }
    }

    fn answer<F>(&self, request: ScriptRequest, handler: &mut F)
    where
        F: FnMut(&str) -> anyhow::Result<Value>,
    {
        trace!("page {} running request {}", self.context_id, request.id);
        let result = handler(&request.source).map_err(|error| format!("{error:#}"));
        if request.wants_result {
            let reply = ScriptReply {
                id: request.id,
                result,
            };
            if self.replies.send(reply).is_err() {
                PageConsole::debug(self.context_id, "host went away before reply");
            }
        } else if let Err(message) = result {
            PageConsole::warn(self.context_id, message);
        }
    }
}
