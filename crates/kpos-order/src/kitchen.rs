//! Kitchen lifecycle of a placed order.
//!
//! ```text
//!   Placed ──Start──► InProgress ──MarkReady──► Ready ──Complete──► Completed
//!     │                   │                       │
//!     └──────Cancel───────┴─────────Cancel────────┴──► Cancelled
//! ```
//!
//! `Completed` and `Cancelled` are terminal. Re-sending the event that
//! produced the current state is a no-op, so a double-tapped kitchen screen
//! does not error.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KitchenStatus {
    Placed,
    InProgress,
    Ready,
    Completed,
    Cancelled,
}

impl KitchenStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, KitchenStatus::Completed | KitchenStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KitchenStatus::Placed => "placed",
            KitchenStatus::InProgress => "in_progress",
            KitchenStatus::Ready => "ready",
            KitchenStatus::Completed => "completed",
            KitchenStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for KitchenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KitchenEvent {
    Start,
    MarkReady,
    Complete,
    Cancel,
}

impl KitchenEvent {
    pub fn parse(raw: &str) -> Option<KitchenEvent> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "start" => Some(KitchenEvent::Start),
            "mark_ready" | "ready" => Some(KitchenEvent::MarkReady),
            "complete" | "completed" => Some(KitchenEvent::Complete),
            "cancel" => Some(KitchenEvent::Cancel),
            _ => None,
        }
    }
}

/// An event that cannot be applied in the order's current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: KitchenStatus,
    pub event: KitchenEvent,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "illegal kitchen transition: {} + {:?}",
            self.from, self.event
        )
    }
}

impl std::error::Error for TransitionError {}

/// Next status for `event`, or the error if it is illegal from `from`.
pub fn transition(from: KitchenStatus, event: KitchenEvent) -> Result<KitchenStatus, TransitionError> {
    use KitchenEvent::*;
    use KitchenStatus::*;

    let next = match (from, event) {
        (Placed, Start) => InProgress,
        (InProgress, MarkReady) => Ready,
        (Ready, Complete) => Completed,

        // Repeats of the event that led here.
        (InProgress, Start) => InProgress,
        (Ready, MarkReady) => Ready,
        (Completed, Complete) => Completed,
        (Cancelled, Cancel) => Cancelled,

        (Placed | InProgress | Ready, Cancel) => Cancelled,

        (from, event) => return Err(TransitionError { from, event }),
    };
    Ok(next)
}
