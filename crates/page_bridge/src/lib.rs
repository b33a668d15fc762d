//! Engine-agnostic bridge between a host application and an embedded page.
//! This crate centralizes the pieces needed to define functions whose bodies
//! run inside the page's script context, inject them, and call them from the
//! host with encoded arguments and asynchronous result delivery.

use std::fmt::{Debug, Formatter, Result as FmtResult};

pub mod channel;
pub use channel::{ChannelPage, PageEndpoint, ScriptReply, ScriptRequest, channel_page};

pub mod config;
pub use config::BridgeConfig;

pub mod console;
pub use console::PageConsole;

pub mod define;
pub use define::{BridgeFunction, DefinedNamespace, NamespaceBuilder};

mod error;
pub use error::BridgeError;

pub mod host;
pub use host::{BridgeHost, SessionClaim};

pub mod invoker;
pub use invoker::{Arg, call, call_expression, split_trailing_callback};

pub mod naming;
pub use naming::{BRIDGE_PREFIX, bridge_function_name, mangle};

pub mod registry;
pub use registry::{FunctionEntry, FunctionKey, ScriptRegistry};

pub mod style;
pub use style::StyleSheet;

mod value;
pub use value::JSValue;

/// Result delivery for a script execution; invoked at most once, on the host loop.
pub type Completion = Box<dyn FnOnce(Result<JSValue, BridgeError>)>;

// ============================
// Engine-agnostic page context trait
// ============================

/// A minimal interface to a live page's script execution environment.
/// Keep this trait small so embedders (webviews, test doubles, remote pages) can be swapped.
pub trait PageContext {
    /// Stable identifier of the embedded session.
    fn context_id(&self) -> u64;
    /// Identifier of the currently loaded document. Changes whenever the page navigates.
    fn document_id(&self) -> u64;
    /// Whether the embedded session can still run scripts.
    fn is_live(&self) -> bool;
    /// Queue a classic script for execution.
    ///
    /// When `completion` is given it receives the script's value on a later [`PageContext::pump`]
    /// or [`PageContext::wait`], never from inside this call.
    ///
    /// # Errors
    /// Returns [`BridgeError::ContextUnavailable`] if the page is gone.
    fn execute(&mut self, source: &str, completion: Option<Completion>) -> Result<(), BridgeError>;
    /// Deliver completions whose results have already arrived. Returns how many ran.
    ///
    /// # Errors
    /// Returns an error if the transport to the page broke.
    fn pump(&mut self) -> Result<usize, BridgeError>;
    /// Block until at least one pending completion is delivered. Returns `0` immediately
    /// when nothing is pending.
    ///
    /// # Errors
    /// Returns [`BridgeError::ContextUnavailable`] if the page closed while results were pending.
    fn wait(&mut self) -> Result<usize, BridgeError>;
}

impl Debug for dyn PageContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PageContext")
            .field("context_id", &self.context_id())
            .field("document_id", &self.document_id())
            .field("live", &self.is_live())
            .finish()
    }
}
