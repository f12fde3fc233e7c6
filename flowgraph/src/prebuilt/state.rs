//! Conversation state shared by the prebuilt nodes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::channels::{BoxedStateUpdater, FieldReducers};
use crate::message::Message;

/// State holding one conversation. Nodes return only the messages they add;
/// [`MessagesState::updater`] appends them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagesState {
    pub messages: Vec<Message>,
}

impl MessagesState {
    /// State for a new turn starting with one user message.
    pub fn from_user(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(content)],
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Updater declaring `messages` as append.
    pub fn updater() -> BoxedStateUpdater<MessagesState> {
        Arc::new(FieldReducers::new().append("messages", |s: &mut MessagesState| &mut s.messages))
    }
}
