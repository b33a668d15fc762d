//! Interactive selection of page elements through incremental completion.
//!
//! Candidates are fetched from the page through a [`page_bridge`] namespace,
//! narrowed by a completion front-end, highlighted live in the page, and
//! finally acted upon. See [`controller`] for the state machine and
//! [`commands`] for the entry points.

pub mod candidate;
pub use candidate::{Candidate, CandidateList, RawEntries, decode_raw_entries, format_label, prepare};

pub mod commands;
pub use commands::{SelectionCommands, run_selection};

pub mod completion;
pub use completion::{
    ActiveCandidateQuery, CompletionEvent, CompletionSession, IncrementalCompletion, Keystroke,
    first_active,
};

pub mod config;
pub use config::SelectionConfig;

pub mod controller;
pub use controller::{Outcome, Phase, SelectionController, SelectionSession};

pub mod protocol;
pub use protocol::{LINK_HINTS, PageProtocol, SECTIONS};
