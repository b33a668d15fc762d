//! Completion front-ends that narrow candidates by typed input.
//!
//! The controller only needs three things from a front-end: seed it with
//! labels, pull the next user event, and read the currently matching labels.
//! Which label is "pointed at" comes from a separate ordered list of
//! [`ActiveCandidateQuery`] providers, so any front-end can plug in.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Zero-argument query for the label the user currently points at.
pub type ActiveCandidateQuery = Box<dyn Fn() -> Option<String>>;

/// Ask each provider in order; the first answer wins.
pub fn first_active(providers: &[ActiveCandidateQuery]) -> Option<String> {
    providers.iter().find_map(|provider| provider())
}

/// What happened in the completion session since the last event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionEvent {
    /// Input or pointer changed; matching set and active candidate may differ.
    Updated,
    /// The user accepted this label.
    Committed(String),
    /// The user cancelled.
    Aborted,
}

/// An interactive completion session over a set of labels.
pub trait CompletionSession {
    /// Start a session offering `labels`.
    fn open(&mut self, labels: &[String]);
    /// Block until the next user event.
    fn next_event(&mut self) -> CompletionEvent;
    /// Labels matching the current input, in display order.
    fn matching(&self) -> Vec<String>;
    /// Tear down any front-end UI. Called on every exit path.
    fn close(&mut self) {}
}

/// A single input action for [`IncrementalCompletion`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keystroke {
    /// Append a character to the input.
    Insert(char),
    /// Delete the last input character.
    Backspace,
    /// Point at the next match, wrapping around.
    Next,
    /// Point at the previous match, wrapping around.
    Previous,
    /// Accept the pointed-at match (or the raw input when nothing matches).
    Submit,
    /// Cancel the session.
    Cancel,
}

impl Keystroke {
    /// One [`Keystroke::Insert`] per character of `text`.
    pub fn text(text: &str) -> Vec<Self> {
        text.chars().map(Self::Insert).collect()
    }
}

#[derive(Debug, Default)]
struct CompletionState {
    labels: Vec<String>,
    input: String,
    matches: Vec<String>,
    index: usize,
}

impl CompletionState {
    fn refilter(&mut self) {
        let terms: Vec<String> = self
            .input
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        self.matches = self
            .labels
            .iter()
            .filter(|label| {
                let folded = label.to_lowercase();
                terms.iter().all(|term| folded.contains(term.as_str()))
            })
            .cloned()
            .collect();
        if self.index >= self.matches.len() {
            self.index = 0;
        }
    }

    fn active(&self) -> Option<String> {
        self.matches.get(self.index).cloned()
    }
}

/// Headless incremental completion driven by a queue of keystrokes.
///
/// Matching is case-insensitive: every whitespace-separated term of the input must occur
/// in the label. Running out of keystrokes counts as cancelling.
#[derive(Debug, Default)]
pub struct IncrementalCompletion {
    state: Rc<RefCell<CompletionState>>,
    keys: VecDeque<Keystroke>,
}

impl IncrementalCompletion {
    /// A session that will replay `keys`.
    pub fn new<I: IntoIterator<Item = Keystroke>>(keys: I) -> Self {
        Self {
            state: Rc::default(),
            keys: keys.into_iter().collect(),
        }
    }

    /// Queue more keystrokes.
    pub fn feed<I: IntoIterator<Item = Keystroke>>(&mut self, keys: I) {
        self.keys.extend(keys);
    }

    /// Current input text.
    pub fn input(&self) -> String {
        self.state.borrow().input.clone()
    }

    /// Provider answering with this session's pointed-at label.
    pub fn active_query(&self) -> ActiveCandidateQuery {
        let state = Rc::clone(&self.state);
        Box::new(move || state.borrow().active())
    }
}

impl CompletionSession for IncrementalCompletion {
    fn open(&mut self, labels: &[String]) {
        let mut state = self.state.borrow_mut();
        state.labels = labels.to_vec();
        state.input.clear();
        state.index = 0;
        state.refilter();
    }

    fn next_event(&mut self) -> CompletionEvent {
        let Some(key) = self.keys.pop_front() else {
            return CompletionEvent::Aborted;
        };
        let mut state = self.state.borrow_mut();
        match key {
            Keystroke::Insert(character) => {
                state.input.push(character);
                state.index = 0;
                state.refilter();
            }
            Keystroke::Backspace => {
                state.input.pop();
                state.index = 0;
                state.refilter();
            }
            Keystroke::Next => {
                if !state.matches.is_empty() {
                    state.index = (state.index + 1) % state.matches.len();
                }
            }
            Keystroke::Previous => {
                if !state.matches.is_empty() {
                    let count = state.matches.len();
                    state.index = (state.index + count - 1) % count;
                }
            }
            Keystroke::Submit => {
                let label = state.active().unwrap_or_else(|| state.input.clone());
                return CompletionEvent::Committed(label);
            }
            Keystroke::Cancel => return CompletionEvent::Aborted,
        }
        CompletionEvent::Updated
    }

    fn matching(&self) -> Vec<String> {
        self.state.borrow().matches.clone()
    }

    fn close(&mut self) {
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec![
            String::from("Home"),
            String::from("About us"),
            String::from("Contact"),
        ]
    }

    #[test]
    fn typing_narrows_case_insensitively() {
        let mut session = IncrementalCompletion::new(Keystroke::text("ab"));
        session.open(&labels());
        assert_eq!(session.matching().len(), 3);
        assert_eq!(session.next_event(), CompletionEvent::Updated);
        assert_eq!(session.next_event(), CompletionEvent::Updated);
        assert_eq!(session.matching(), vec![String::from("About us")]);
        assert_eq!(session.next_event(), CompletionEvent::Aborted);
    }

    #[test]
    fn pointer_cycles_through_matches() {
        let mut session = IncrementalCompletion::new([
            Keystroke::Insert('o'),
            Keystroke::Next,
            Keystroke::Next,
            Keystroke::Next,
            Keystroke::Previous,
            Keystroke::Submit,
        ]);
        session.open(&labels());
        let active = session.active_query();
        assert_eq!(active(), Some(String::from("Home")));
        session.next_event();
        session.next_event();
        assert_eq!(active(), Some(String::from("About us")));
        session.next_event();
        session.next_event();
        assert_eq!(active(), Some(String::from("Home")));
        session.next_event();
        assert_eq!(active(), Some(String::from("Contact")));
        assert_eq!(
            session.next_event(),
            CompletionEvent::Committed(String::from("Contact"))
        );
    }

    #[test]
    fn submit_without_match_commits_input() {
        let mut session = IncrementalCompletion::new([Keystroke::Insert('z'), Keystroke::Submit]);
        session.open(&labels());
        session.next_event();
        assert!(session.matching().is_empty());
        assert_eq!(
            session.next_event(),
            CompletionEvent::Committed(String::from("z"))
        );
    }

    #[test]
    fn first_provider_with_an_answer_wins() {
        let providers: Vec<ActiveCandidateQuery> = vec![
            Box::new(|| None),
            Box::new(|| Some(String::from("second"))),
            Box::new(|| Some(String::from("third"))),
        ];
        assert_eq!(first_active(&providers), Some(String::from("second")));
        assert_eq!(first_active(&[]), None);
    }
}
