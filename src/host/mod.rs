//! Host Module
//!
//! Everything that talks to the agent host: the event model, the HTTP
//! client behind the `HostApi` seam, and the SSE subscription.

pub mod client;
pub mod events;
pub mod stream;
#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

pub use client::{
    HostApi, HostMessage, HttpHostClient, MessageQuery, Part, PromptRequest, SessionInfo, ToastVariant,
};
pub use events::HostEvent;
pub use stream::{EventSubscription, SseDecoder};

#[derive(Error, Debug)]
pub enum HostError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Host returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Event stream error: {0}")]
    Stream(String),
}

impl From<reqwest::Error> for HostError {
    fn from(e: reqwest::Error) -> Self {
        HostError::Http(e.to_string())
    }
}
