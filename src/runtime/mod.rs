//! Update intake: admission gate, dispatch loop and per-update processing.

pub mod dispatch;
pub mod gate;
pub mod processor;

pub use dispatch::UpdateHandler;
pub use gate::{AdmissionGate, GatePermit};
pub use processor::Processor;

use crate::conversation::Input;

/// Transport-independent inbound update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    /// Inline button press; `id` must be answered so the client stops spinning.
    Callback { id: String, data: String },
}

impl Payload {
    pub fn to_input(&self) -> Input {
        match self {
            Payload::Text(text) => Input::Text(text.clone()),
            Payload::Callback { data, .. } => Input::Callback(data.clone()),
        }
    }
}
