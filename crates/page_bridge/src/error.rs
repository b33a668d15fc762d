use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Failures raised while talking to a page context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeError {
    /// No live page session to run scripts in.
    ContextUnavailable,
    /// A style or script injection was rejected by the page.
    InjectionFailure(String),
    /// The user cancelled an interactive selection.
    InteractionAborted,
    /// The page-side function raised inside its own script context.
    CallbackDeliveryFailure(String),
    /// A bridge function declaration is malformed (programming error).
    InvalidDefinition(String),
    /// An interactive session is already running on this page context.
    SessionActive(u64),
    /// The page returned a value whose shape the host cannot use.
    MalformedResult(String),
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::ContextUnavailable => write!(f, "no live page context"),
            Self::InjectionFailure(message) => write!(f, "injection failed: {message}"),
            Self::InteractionAborted => write!(f, "interaction aborted"),
            Self::CallbackDeliveryFailure(message) => {
                write!(f, "page-side call failed: {message}")
            }
            Self::InvalidDefinition(message) => {
                write!(f, "invalid bridge definition: {message}")
            }
            Self::SessionActive(context) => write!(
                f,
                "an interactive session is already active on page context {context}"
            ),
            Self::MalformedResult(message) => write!(f, "malformed page result: {message}"),
        }
    }
}

impl Error for BridgeError {}
