//! Change notifications published by the store.

use serde::Serialize;

/// A state change, published after the change has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    Created { id: String },
    MessageAdded { id: String, message_id: String },
    Updated { id: String },
    TitleChanged { id: String, title: String },
    ContextChanged { id: String },
    Switched { id: String },
    Deleted { id: String, was_current: bool },
    SummarizingChanged { id: String, is_summarizing: bool },
    Compacted { id: String, removed: usize },
    Cleared,
}

impl StoreEvent {
    /// The conversation this event concerns, if any.
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            StoreEvent::Created { id }
            | StoreEvent::MessageAdded { id, .. }
            | StoreEvent::Updated { id }
            | StoreEvent::TitleChanged { id, .. }
            | StoreEvent::ContextChanged { id }
            | StoreEvent::Switched { id }
            | StoreEvent::Deleted { id, .. }
            | StoreEvent::SummarizingChanged { id, .. }
            | StoreEvent::Compacted { id, .. } => Some(id),
            StoreEvent::Cleared => None,
        }
    }
}
