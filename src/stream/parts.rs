//! Caller-facing generation parts.

use serde_json::Value;

use crate::protocol::Usage;
use crate::Error;

/// Why a generation stream finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FinishReason {
    /// The agent completed normally.
    Stop,
    /// The output stream ended without a completion event.
    #[default]
    Unknown,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::Unknown => write!(f, "unknown"),
        }
    }
}

/// One unit of the normalized output stream.
///
/// Parts are emitted in strict order and consumed exactly once. A stream is
/// terminated by exactly one of [`Finish`](GenerationPart::Finish) or
/// [`Error`](GenerationPart::Error); nothing follows the terminator.
///
/// # Ordering invariants
///
/// - Every `TextDelta` follows an unmatched `TextStart` with the same id.
/// - Every opened text segment is closed by exactly one `TextEnd` before the
///   next `ToolCall` and before the stream ends.
/// - No `Finish` ever follows an `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationPart {
    /// A text segment opened.
    TextStart {
        /// Fresh identifier for the segment.
        id: String,
    },
    /// A fragment of text for the open segment.
    TextDelta {
        /// Identifier of the segment this fragment belongs to.
        id: String,
        /// The text fragment.
        text: String,
    },
    /// The open text segment closed.
    TextEnd {
        /// Identifier of the closed segment.
        id: String,
    },
    /// The assistant requested a tool invocation.
    ToolCall {
        /// Call-site identifier.
        id: String,
        /// Name of the requested tool.
        name: String,
        /// Tool arguments as JSON.
        arguments: Value,
    },
    /// A tool invocation finished.
    ToolResult {
        /// Call-site identifier of the matching request.
        id: String,
        /// Tool name resolved from the matching request, or the
        /// unresolved-name placeholder when no request was seen.
        name: String,
        /// Audience-filtered, concatenated result text.
        output: String,
        /// Whether the tool execution failed.
        is_error: bool,
    },
    /// The stream finished successfully. Terminal.
    Finish {
        /// Canonicalized finish reason.
        reason: FinishReason,
        /// Token counts reported by the agent.
        usage: Usage,
    },
    /// The call failed. Terminal; no `Finish` follows.
    Error(Error),
}

impl GenerationPart {
    /// Check if this part terminates the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationPart::Finish { .. } | GenerationPart::Error(_)
        )
    }

    /// Check if this is a text delta part.
    pub fn is_text_delta(&self) -> bool {
        matches!(self, GenerationPart::TextDelta { .. })
    }

    /// Get the text of a `TextDelta` part.
    pub fn text(&self) -> Option<&str> {
        match self {
            GenerationPart::TextDelta { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Get the error if this is an `Error` part.
    pub fn as_error(&self) -> Option<&Error> {
        match self {
            GenerationPart::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Get the reason and usage if this is a `Finish` part.
    pub fn as_finish(&self) -> Option<(FinishReason, &Usage)> {
        match self {
            GenerationPart::Finish { reason, usage } => Some((*reason, usage)),
            _ => None,
        }
    }
}
