//! Decoded events from the agent's line-delimited JSON output.

use serde::{Deserialize, Serialize};

use super::content::{ContentItem, Role};
use super::usage::Usage;

/// One decoded line of agent output.
///
/// The agent writes one JSON object per stdout line. Recognized `type`
/// values are `message`, `complete`, `error`, and `notification`; anything
/// else fails the decode and is skipped by [`AgentEvent::decode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AgentEvent {
    /// A conversation message with ordered content items.
    Message(MessageEvent),
    /// Generation finished; carries token counts.
    Complete(CompleteEvent),
    /// The agent failed; carries the error string.
    Error(ErrorEvent),
    /// Informational event, ignored by the translator.
    Notification(NotificationEvent),
}

/// A conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Who authored the message.
    pub role: Role,
    /// Ordered content items.
    pub content: Vec<ContentItem>,
}

/// Final event of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteEvent {
    /// Token counts for the call.
    #[serde(flatten)]
    pub usage: Usage,
}

/// An error reported by the agent itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// The embedded error string.
    pub message: String,
}

/// Informational side-channel event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Optional human-readable note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AgentEvent {
    /// Decode one raw output line.
    ///
    /// Returns `None` for blank lines and for anything that does not parse
    /// as a recognized event; malformed lines are logged and skipped, never
    /// fatal to the call.
    pub fn decode(line: &str) -> Option<AgentEvent> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str(line) {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    line = %preview(line),
                    "skipping unparseable agent output line"
                );
                None
            }
        }
    }

    /// Check if this is a message event.
    pub fn is_message(&self) -> bool {
        matches!(self, AgentEvent::Message(_))
    }

    /// Check if this is the completion event.
    pub fn is_complete(&self) -> bool {
        matches!(self, AgentEvent::Complete(_))
    }

    /// Check if this is an error event.
    pub fn is_error(&self) -> bool {
        matches!(self, AgentEvent::Error(_))
    }

    /// Get as a message event if applicable.
    pub fn as_message(&self) -> Option<&MessageEvent> {
        match self {
            AgentEvent::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Get as a completion event if applicable.
    pub fn as_complete(&self) -> Option<&CompleteEvent> {
        match self {
            AgentEvent::Complete(c) => Some(c),
            _ => None,
        }
    }
}

/// Truncate a line for diagnostics.
fn preview(line: &str) -> String {
    line.chars().take(120).collect()
}
