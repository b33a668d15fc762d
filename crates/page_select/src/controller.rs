//! Completion-to-highlight synchronization.
//!
//! The controller runs `Idle -> Fetching -> Selecting -> Idle`. Every exit
//! from a running session (commit, abort, failure) goes through
//! [`SelectionController::finish`], which calls the page's `cleanup` and
//! clears all session state. Page results arrive asynchronously; the fetch
//! result is parked in a slot until the driver hands it over.

use crate::candidate::{Candidate, CandidateList};
use crate::completion::{ActiveCandidateQuery, first_active};
use crate::protocol::PageProtocol;
use log::{debug, warn};
use page_bridge::{BridgeError, BridgeHost, JSValue, PageContext, SessionClaim};
use std::cell::RefCell;
use std::rc::Rc;

type FetchSlot = Rc<RefCell<Option<Result<JSValue, BridgeError>>>>;

/// Where the controller is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No session.
    Idle,
    /// Waiting for the page's candidates.
    Fetching,
    /// The user is narrowing candidates.
    Selecting,
}

/// How a session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The action ran on this candidate.
    Committed(Candidate),
    /// The user cancelled.
    Aborted,
    /// The session ended because of a failure; the reason is informational only.
    Errored(String),
}

/// Ephemeral state of one interactive selection.
#[derive(Clone, Debug, Default)]
pub struct SelectionSession {
    candidates: CandidateList,
    matching: Vec<i64>,
    pointed: Option<i64>,
}

impl SelectionSession {
    /// Candidates of the current fetch.
    pub const fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    /// Ids matching the current input.
    pub fn matching(&self) -> &[i64] {
        &self.matching
    }

    /// Id of the pointed-at candidate.
    pub const fn pointed(&self) -> Option<i64> {
        self.pointed
    }
}

/// State machine keeping a completion session and page highlights in step.
///
/// A started controller holds the page context's [`SessionClaim`]; dropping the controller
/// releases it even when [`SelectionController::finish`] never ran.
pub struct SelectionController {
    protocol: PageProtocol,
    providers: Vec<ActiveCandidateQuery>,
    phase: Phase,
    claim: Option<SessionClaim>,
    session: Option<SelectionSession>,
    fetched: FetchSlot,
}

impl SelectionController {
    /// Create an idle controller. `providers` are asked in order for the pointed-at label.
    pub fn new(protocol: PageProtocol, providers: Vec<ActiveCandidateQuery>) -> Self {
        Self {
            protocol,
            providers,
            phase: Phase::Idle,
            claim: None,
            session: None,
            fetched: Rc::default(),
        }
    }

    /// Current lifecycle phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a session is running (fetching or selecting).
    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// The running session, once candidates arrived.
    pub const fn session(&self) -> Option<&SelectionSession> {
        self.session.as_ref()
    }

    /// Protocol this controller drives.
    pub const fn protocol(&self) -> &PageProtocol {
        &self.protocol
    }

    /// Inject the namespace's style and scripts, then ask the page for candidates.
    ///
    /// # Errors
    /// Returns [`BridgeError::ContextUnavailable`] if the page is not live and
    /// [`BridgeError::SessionActive`] if a session already runs on this controller or context.
    /// Nothing is left claimed when this fails.
    pub fn start(
        &mut self,
        host: &mut BridgeHost,
        page: &mut dyn PageContext,
    ) -> Result<(), BridgeError> {
        if let Some(claim) = self.claim.as_ref() {
            return Err(BridgeError::SessionActive(claim.context()));
        }
        if !page.is_live() {
            return Err(BridgeError::ContextUnavailable);
        }
        let context = page.context_id();
        self.claim = Some(host.claim_session(context)?);
        if let Err(error) = self.begin_fetch(host, page) {
            self.finish(page);
            return Err(error);
        }
        debug!("{}: fetching candidates on page {context}", self.protocol.namespace());
        Ok(())
    }

    fn begin_fetch(
        &mut self,
        host: &mut BridgeHost,
        page: &mut dyn PageContext,
    ) -> Result<(), BridgeError> {
        host.inject_style(page, self.protocol.style())?;
        host.ensure_injected(page, self.protocol.namespace())?;
        self.fetched.borrow_mut().take();
        let slot = Rc::clone(&self.fetched);
        self.protocol
            .fetch()
            .invoke_with(page, Vec::new(), move |result| {
                *slot.borrow_mut() = Some(result);
            })?;
        self.phase = Phase::Fetching;
        Ok(())
    }

    /// Take the fetch result if the page has delivered it.
    pub fn take_fetch_result(&mut self) -> Option<Result<JSValue, BridgeError>> {
        self.fetched.borrow_mut().take()
    }

    /// Build the session from the page's candidates and return the labels to offer.
    ///
    /// # Errors
    /// Returns [`BridgeError::MalformedResult`] if the result cannot be decoded or no
    /// fetch is outstanding.
    pub fn on_fetch_result(&mut self, raw: &JSValue) -> Result<Vec<String>, BridgeError> {
        if self.phase != Phase::Fetching {
            return Err(BridgeError::MalformedResult(format!(
                "fetch result arrived while {:?}",
                self.phase
            )));
        }
        let candidates = CandidateList::from_fetch_result(raw)?;
        let labels = candidates.labels();
        debug!(
            "{}: {} candidate(s), {} distinct label(s)",
            self.protocol.namespace(),
            candidates.len(),
            labels.len()
        );
        self.session = Some(SelectionSession {
            candidates,
            matching: Vec::new(),
            pointed: None,
        });
        self.phase = Phase::Selecting;
        Ok(labels)
    }

    /// Recompute matches and the pointed-at candidate, then push both to the page.
    ///
    /// Pushes are fire-and-forget; the latest call always carries the latest state.
    ///
    /// # Errors
    /// Returns [`BridgeError::ContextUnavailable`] if the page went away.
    pub fn on_update<S: AsRef<str>>(
        &mut self,
        page: &mut dyn PageContext,
        matching_labels: &[S],
    ) -> Result<(), BridgeError> {
        let Some(session) = self.session.as_mut() else {
            debug!("ignoring completion update outside of a session");
            return Ok(());
        };
        session.matching = session.candidates.ids_for(matching_labels);
        session.pointed = first_active(&self.providers)
            .and_then(|label| session.candidates.resolve(&label))
            .map(|candidate| candidate.id);
        let matching = JSValue::from(session.matching.clone());
        let pointed = JSValue::from(session.pointed);
        self.protocol.highlight().notify(page, vec![matching, pointed])
    }

    /// Run the action on the candidate shown as `label`, then clean up.
    pub fn commit(&mut self, page: &mut dyn PageContext, label: &str) -> Outcome {
        let resolved = self
            .session
            .as_ref()
            .and_then(|session| session.candidates.resolve(label))
            .cloned();
        let outcome = match resolved {
            Some(candidate) => match self
                .protocol
                .action()
                .notify(page, vec![JSValue::from(candidate.id)])
            {
                Ok(()) => Outcome::Committed(candidate),
                Err(error) => Outcome::Errored(error.to_string()),
            },
            None => Outcome::Errored(format!("no candidate labelled {label:?}")),
        };
        self.finish(page);
        outcome
    }

    /// End the session without acting.
    pub fn abort(&mut self, page: &mut dyn PageContext) -> Outcome {
        debug!("{}: {}", self.protocol.namespace(), BridgeError::InteractionAborted);
        self.finish(page);
        Outcome::Aborted
    }

    /// End the session because of `error`. The error is not propagated further.
    pub fn fail(&mut self, page: &mut dyn PageContext, error: &BridgeError) -> Outcome {
        debug!("{}: session failed: {error}", self.protocol.namespace());
        self.finish(page);
        Outcome::Errored(error.to_string())
    }

    /// Call the page's cleanup (failures are logged, never raised), clear all state, and
    /// release the session claim.
    pub fn finish(&mut self, page: &mut dyn PageContext) {
        let Some(claim) = self.claim.take() else {
            return;
        };
        if let Err(error) = self.protocol.cleanup().notify(page, Vec::new()) {
            warn!("{}: cleanup failed: {error}", self.protocol.namespace());
        }
        self.session = None;
        self.fetched.borrow_mut().take();
        self.phase = Phase::Idle;
        drop(claim);
    }
}

impl Drop for SelectionController {
    fn drop(&mut self) {
        if self.claim.is_some() {
            warn!(
                "{}: controller dropped mid-session; page markers were not cleaned up",
                self.protocol.namespace()
            );
        }
    }
}
