//! JSON protocol types for the agent's structured output.
//!
//! With structured output enabled (`--output-format json`), the agent writes
//! one JSON object per stdout line. Each line decodes into an [`AgentEvent`]:
//!
//! - `message`: a conversation message with ordered [`ContentItem`]s
//! - `complete`: generation finished, with token counts
//! - `error`: the agent failed, with an embedded message
//! - `notification`: informational, ignored by the translator
//!
//! Unrecognized or malformed lines are skipped by [`AgentEvent::decode`]
//! rather than failing the call.
//!
//! # Example
//!
//! ```
//! use libgoose::protocol::AgentEvent;
//!
//! let line = r#"{"type": "message", "role": "assistant", "content": [{"type": "text", "text": "Hi"}]}"#;
//! let event = AgentEvent::decode(line).unwrap();
//! assert!(event.is_message());
//! ```

mod content;
mod events;
mod usage;

pub use content::{
    visible_text, Annotations, Audience, ContentItem, Role, TextItem, ToolRequestItem,
    ToolResponseItem, ToolResultItem,
};
pub use events::{AgentEvent, CompleteEvent, ErrorEvent, MessageEvent, NotificationEvent};
pub use usage::Usage;
