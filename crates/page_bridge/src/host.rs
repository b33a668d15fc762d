//! Shared bookkeeping for one application: registered scripts, what has been
//! injected into which document, and which page contexts are running an
//! interactive session.

use crate::{
    BridgeConfig, BridgeError, Completion, PageConsole, PageContext, ScriptRegistry, StyleSheet,
};
use log::debug;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Injection key: `(context, document, namespace)`.
type InjectionKey = (u64, u64, String);

/// Injections the page has not rejected. Shared with pending completions.
type InjectedSet = Rc<RefCell<HashSet<InjectionKey>>>;

/// Running sessions: context to the serial of the claim holding it.
type SessionTable = Rc<RefCell<HashMap<u64, u64>>>;

/// Registry owner and per-context injection/session state.
#[derive(Debug, Default)]
pub struct BridgeHost {
    config: BridgeConfig,
    registry: ScriptRegistry,
    injected: InjectedSet,
    sessions: SessionTable,
    next_claim: u64,
}

/// Exclusive hold on a page context's interactive session.
///
/// The context is released when the claim is dropped.
#[derive(Debug)]
pub struct SessionClaim {
    context: u64,
    serial: u64,
    sessions: SessionTable,
}

impl SessionClaim {
    /// Page context this claim holds.
    pub const fn context(&self) -> u64 {
        self.context
    }
}

impl Drop for SessionClaim {
    fn drop(&mut self) {
        let mut sessions = self.sessions.borrow_mut();
        if sessions.get(&self.context) == Some(&self.serial) {
            sessions.remove(&self.context);
            debug!("session on page {} released", self.context);
        }
    }
}

impl BridgeHost {
    /// Create a host with an empty registry.
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            registry: ScriptRegistry::new(),
            injected: Rc::default(),
            sessions: Rc::default(),
            next_claim: 0,
        }
    }

    /// Active configuration.
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Registered definitions.
    pub const fn registry(&self) -> &ScriptRegistry {
        &self.registry
    }

    /// Registered definitions, for definition-time registration.
    pub fn registry_mut(&mut self) -> &mut ScriptRegistry {
        &mut self.registry
    }

    /// Run the concatenated definitions of `namespace` in the page.
    ///
    /// The scripts tolerate repeated execution, so this is safe to call on every command.
    /// The injection is recorded right away and forgotten again if the page rejects it.
    ///
    /// # Errors
    /// Returns [`BridgeError::ContextUnavailable`] if the page is not live.
    pub fn inject(&mut self, page: &mut dyn PageContext, namespace: &str) -> Result<(), BridgeError> {
        if !page.is_live() {
            return Err(BridgeError::ContextUnavailable);
        }
        let script = self.registry.render_injection_script(namespace);
        if script.is_empty() {
            debug!("nothing registered for namespace {namespace}; skipping injection");
            return Ok(());
        }
        let context = page.context_id();
        let key = (context, page.document_id(), namespace.to_owned());
        let injected = Rc::clone(&self.injected);
        let rejected = key.clone();
        let completion: Completion = Box::new(move |result| {
            if let Err(error) = result {
                injected.borrow_mut().remove(&rejected);
                report_injection_failure(context, &format!("namespace {}", rejected.2), &error);
            }
        });
        page.execute(&script, Some(completion))?;
        self.injected.borrow_mut().insert(key);
        Ok(())
    }

    /// Inject `namespace` unless configuration allows skipping a document that already has it.
    ///
    /// # Errors
    /// Returns [`BridgeError::ContextUnavailable`] if the page is not live.
    pub fn ensure_injected(
        &mut self,
        page: &mut dyn PageContext,
        namespace: &str,
    ) -> Result<(), BridgeError> {
        if !self.config.reinject_each_command && self.is_injected(page, namespace) {
            debug!(
                "namespace {namespace} already injected into document {}",
                page.document_id()
            );
            return Ok(());
        }
        self.inject(page, namespace)
    }

    /// Whether `namespace` was injected into the page's current document.
    pub fn is_injected(&self, page: &dyn PageContext, namespace: &str) -> bool {
        self.injected
            .borrow()
            .contains(&(page.context_id(), page.document_id(), namespace.to_owned()))
    }

    /// Insert `sheet` into the page head; the page skips it when already present.
    ///
    /// # Errors
    /// Returns [`BridgeError::ContextUnavailable`] if the page is not live.
    pub fn inject_style(
        &mut self,
        page: &mut dyn PageContext,
        sheet: &StyleSheet,
    ) -> Result<(), BridgeError> {
        if !page.is_live() {
            return Err(BridgeError::ContextUnavailable);
        }
        let context = page.context_id();
        let label = format!("style {}", sheet.name());
        let completion: Completion = Box::new(move |result| {
            if let Err(error) = result {
                report_injection_failure(context, &label, &error);
            }
        });
        page.execute(&sheet.injection_script(), Some(completion))
    }

    /// Mark `context` as running an interactive session until the returned claim is dropped.
    ///
    /// # Errors
    /// Returns [`BridgeError::SessionActive`] if one is already running there.
    pub fn claim_session(&mut self, context: u64) -> Result<SessionClaim, BridgeError> {
        let mut sessions = self.sessions.borrow_mut();
        if sessions.contains_key(&context) {
            return Err(BridgeError::SessionActive(context));
        }
        self.next_claim = self.next_claim.wrapping_add(1);
        sessions.insert(context, self.next_claim);
        Ok(SessionClaim {
            context,
            serial: self.next_claim,
            sessions: Rc::clone(&self.sessions),
        })
    }

    /// Whether `context` is running an interactive session.
    pub fn has_session(&self, context: u64) -> bool {
        self.sessions.borrow().contains_key(&context)
    }

    /// Drop every record about `context`, e.g. after its embedded session closed.
    /// Outstanding claims on it become inert.
    pub fn forget_context(&mut self, context: u64) {
        self.injected
            .borrow_mut()
            .retain(|(owner, _, _)| *owner != context);
        self.sessions.borrow_mut().remove(&context);
    }
}

/// Log an [`BridgeError::InjectionFailure`] for a script the page rejected.
fn report_injection_failure(context: u64, label: &str, error: &BridgeError) {
    let failure = BridgeError::InjectionFailure(format!("{label}: {error}"));
    PageConsole::error(context, failure.to_string());
}
