use thiserror::Error;

use crate::ClientId;

/// Failures surfaced by the bridge. None of them are fatal: callers log and
/// drop, leaving accessibility briefly stale rather than tearing down the page.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("malformed channel message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unknown text input method `{0}`")]
    UnknownMethod(String),

    #[error("bad arguments for `{method}`: {reason}")]
    BadArguments { method: String, reason: String },

    #[error("command for {client} ignored; active client is {active:?}")]
    StaleClient {
        client: ClientId,
        active: Option<ClientId>,
    },

    #[error("host call failed: {0}")]
    Host(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
