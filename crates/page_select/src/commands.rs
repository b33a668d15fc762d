//! Top-level interactive commands.
//!
//! A command checks the page, starts a [`SelectionController`], and drives it
//! from a [`CompletionSession`] until the user commits or cancels. The running
//! session sits inside a scope guard, so cleanup happens on every way out,
//! including early returns and unwinding.

use crate::completion::{ActiveCandidateQuery, CompletionEvent, CompletionSession};
use crate::config::SelectionConfig;
use crate::controller::{Outcome, SelectionController};
use crate::protocol::PageProtocol;
use log::debug;
use page_bridge::{BridgeError, BridgeHost, JSValue, PageContext};

/// Run one interactive selection with `controller`.
///
/// # Errors
/// Only failures before the session exists are returned (no live page, a session already
/// running). Everything after that ends the session and is reported as [`Outcome::Errored`].
pub fn run_selection(
    host: &mut BridgeHost,
    page: &mut dyn PageContext,
    controller: &mut SelectionController,
    completion: &mut dyn CompletionSession,
) -> Result<Outcome, BridgeError> {
    controller.start(host, page)?;
    let outcome = {
        let mut guard = SessionGuard { page, controller };
        guard.drive(completion)
    };
    completion.close();
    Ok(outcome)
}

/// Owns a started session; dropping it while the session runs cleans up.
struct SessionGuard<'a, 'p> {
    page: &'a mut (dyn PageContext + 'p),
    controller: &'a mut SelectionController,
}

impl SessionGuard<'_, '_> {
    fn drive(&mut self, completion: &mut dyn CompletionSession) -> Outcome {
        let labels = match self.await_candidates() {
            Ok(labels) => labels,
            Err(error) => return self.controller.fail(self.page, &error),
        };
        completion.open(&labels);
        if let Err(error) = self.controller.on_update(self.page, &completion.matching()) {
            return self.controller.fail(self.page, &error);
        }
        loop {
            match completion.next_event() {
                CompletionEvent::Updated => {
                    let pushed = self
                        .controller
                        .on_update(self.page, &completion.matching())
                        .and_then(|()| self.page.pump());
                    if let Err(error) = pushed {
                        return self.controller.fail(self.page, &error);
                    }
                }
                CompletionEvent::Committed(label) => {
                    return self.controller.commit(self.page, &label);
                }
                CompletionEvent::Aborted => return self.controller.abort(self.page),
            }
        }
    }

    fn await_candidates(&mut self) -> Result<Vec<String>, BridgeError> {
        let raw = self.await_fetch()?;
        self.controller.on_fetch_result(&raw)
    }

    fn await_fetch(&mut self) -> Result<JSValue, BridgeError> {
        loop {
            if let Some(result) = self.controller.take_fetch_result() {
                return result;
            }
            if self.page.wait()? == 0 {
                return self.controller.take_fetch_result().unwrap_or_else(|| {
                    Err(BridgeError::MalformedResult(String::from(
                        "page settled without answering fetch",
                    )))
                });
            }
        }
    }
}

impl Drop for SessionGuard<'_, '_> {
    fn drop(&mut self) {
        if self.controller.is_active() {
            debug!("selection session left early; cleaning up");
            self.controller.finish(self.page);
        }
    }
}

/// The built-in selection commands, defined once at startup.
#[derive(Clone, Debug)]
pub struct SelectionCommands {
    links: PageProtocol,
    sections: PageProtocol,
}

impl SelectionCommands {
    /// Register the link and section namespaces with `host`.
    ///
    /// # Errors
    /// Returns [`BridgeError::InvalidDefinition`] if a built-in body fails validation.
    pub fn install(host: &mut BridgeHost, config: &SelectionConfig) -> Result<Self, BridgeError> {
        Ok(Self {
            links: PageProtocol::link_hints(host.registry_mut(), config)?,
            sections: PageProtocol::sections(host.registry_mut(), config)?,
        })
    }

    /// Link protocol.
    pub const fn links(&self) -> &PageProtocol {
        &self.links
    }

    /// Section protocol.
    pub const fn sections(&self) -> &PageProtocol {
        &self.sections
    }

    /// Pick a link by completion and follow it.
    ///
    /// # Errors
    /// Returns [`BridgeError::ContextUnavailable`] when there is no live page and
    /// [`BridgeError::SessionActive`] when the page already runs a selection.
    pub fn follow_link(
        &self,
        host: &mut BridgeHost,
        page: &mut dyn PageContext,
        completion: &mut dyn CompletionSession,
        providers: Vec<ActiveCandidateQuery>,
    ) -> Result<Outcome, BridgeError> {
        let mut controller = SelectionController::new(self.links.clone(), providers);
        run_selection(host, page, &mut controller, completion)
    }

    /// Pick a heading by completion and scroll to it.
    ///
    /// # Errors
    /// Returns [`BridgeError::ContextUnavailable`] when there is no live page and
    /// [`BridgeError::SessionActive`] when the page already runs a selection.
    pub fn goto_section(
        &self,
        host: &mut BridgeHost,
        page: &mut dyn PageContext,
        completion: &mut dyn CompletionSession,
        providers: Vec<ActiveCandidateQuery>,
    ) -> Result<Outcome, BridgeError> {
        let mut controller = SelectionController::new(self.sections.clone(), providers);
        run_selection(host, page, &mut controller, completion)
    }
}
