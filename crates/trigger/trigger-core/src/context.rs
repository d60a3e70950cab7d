//! # Conversation Context
//!
//! The live conversation an engine run is evaluated against: the incoming message,
//! prior history (oldest first, most recent last), context keywords and optional
//! topic / emotional state supplied by the chat source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Speaker role of a history message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

/// One message of the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: MessageRole,
    /// Speaker name (user or character), when known.
    #[serde(default)]
    pub name: Option<String>,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl HistoryMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            name: None,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            name: None,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Per-turn input of the trigger pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub current_message: String,
    /// Ordered, most recent last.
    #[serde(default)]
    pub conversation_history: Vec<HistoryMessage>,
    #[serde(default)]
    pub context_keywords: HashSet<String>,
    #[serde(default)]
    pub current_topic: Option<String>,
    #[serde(default)]
    pub emotional_state: Option<String>,
}

impl ConversationContext {
    pub fn new(current_message: impl Into<String>) -> Self {
        Self {
            current_message: current_message.into(),
            ..Default::default()
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryMessage>) -> Self {
        self.conversation_history = history;
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.current_topic = Some(topic.into());
        self
    }

    pub fn with_emotional_state(mut self, emotion: impl Into<String>) -> Self {
        self.emotional_state = Some(emotion.into());
        self
    }

    /// Messages the matcher scans: the last `history_length` history contents followed by
    /// the current message.
    pub fn windowed_messages(&self, history_length: usize) -> Vec<&str> {
        let skip = self
            .conversation_history
            .len()
            .saturating_sub(history_length);
        self.conversation_history
            .iter()
            .skip(skip)
            .map(|m| m.content.as_str())
            .chain(std::iter::once(self.current_message.as_str()))
            .collect()
    }

    /// Most recent history message, if any.
    pub fn last_message(&self) -> Option<&HistoryMessage> {
        self.conversation_history.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_keeps_last_messages_and_appends_current() {
        let ctx = ConversationContext::new("now").with_history(vec![
            HistoryMessage::user("one"),
            HistoryMessage::assistant("two"),
            HistoryMessage::user("three"),
        ]);
        assert_eq!(ctx.windowed_messages(2), vec!["two", "three", "now"]);
        assert_eq!(ctx.windowed_messages(0), vec!["now"]);
        assert_eq!(ctx.windowed_messages(10), vec!["one", "two", "three", "now"]);
    }
}
