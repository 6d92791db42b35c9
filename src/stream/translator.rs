//! The event-to-parts state machine.
//!
//! One translator instance exists per generation call and is advanced by a
//! single writer. It converts decoded [`AgentEvent`]s, in arrival order,
//! into the ordered [`GenerationPart`] sequence, tracking the open text
//! segment and tool-call lifecycles so the part-level invariants hold on
//! every exit path.

use std::collections::HashMap;

use crate::protocol::{
    visible_text, AgentEvent, Audience, ContentItem, MessageEvent, Role, ToolRequestItem,
    ToolResponseItem, Usage,
};
use crate::stream::parts::{FinishReason, GenerationPart};
use crate::Error;

/// Reported tool name when no matching request was seen for a result.
/// The agent does not echo names back on tool responses.
pub const UNRESOLVED_TOOL_NAME: &str = "unknown";

#[derive(Debug, Clone, PartialEq)]
enum State {
    /// Nothing open yet.
    Idle,
    /// A text segment is open; carries its id.
    TextOpen(String),
    /// A tool call was emitted and its result may still arrive.
    ToolPending,
    /// Terminal: a `Finish` or `Error` part went out. Nothing follows.
    Finished,
}

/// Per-call translation state.
pub(crate) struct Translator {
    state: State,
    audience: Audience,
    next_segment: u64,
    /// Call-site id → tool name, recorded when tool calls are emitted so
    /// results can report the name the agent omits.
    tool_names: HashMap<String, String>,
    usage: Usage,
}

impl Translator {
    pub(crate) fn new(audience: Audience) -> Self {
        Self {
            state: State::Idle,
            audience,
            next_segment: 0,
            tool_names: HashMap::new(),
            usage: Usage::default(),
        }
    }

    /// Whether a terminal part has been emitted.
    pub(crate) fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Advance the machine with one decoded event.
    ///
    /// `error` events are not handled here; the supervisor classifies them
    /// and routes the result through [`fail`](Self::fail).
    pub(crate) fn on_event(&mut self, event: AgentEvent) -> Vec<GenerationPart> {
        if self.is_finished() {
            tracing::debug!("dropping event after stream finished");
            return Vec::new();
        }

        match event {
            AgentEvent::Message(message) => self.on_message(message),
            AgentEvent::Complete(complete) => {
                let mut parts = Vec::new();
                self.close_text(&mut parts);
                self.usage = complete.usage;
                parts.push(GenerationPart::Finish {
                    reason: FinishReason::Stop,
                    usage: self.usage.clone(),
                });
                self.state = State::Finished;
                parts
            }
            AgentEvent::Notification(note) => {
                tracing::debug!(message = ?note.message, "agent notification");
                Vec::new()
            }
            AgentEvent::Error(err) => {
                tracing::debug!(message = %err.message, "error event reached translator");
                Vec::new()
            }
        }
    }

    /// Terminate the stream with an error part.
    ///
    /// Closes a dangling text segment first so every opened segment is
    /// closed exactly once, then emits the single terminal `Error` part.
    pub(crate) fn fail(&mut self, error: Error) -> Vec<GenerationPart> {
        if self.is_finished() {
            tracing::warn!(error = %error, "call failed after stream already finished");
            return Vec::new();
        }

        let mut parts = Vec::new();
        self.close_text(&mut parts);
        parts.push(GenerationPart::Error(error));
        self.state = State::Finished;
        parts
    }

    /// Terminate a stream whose process exited cleanly without a `complete`
    /// event. The one-terminator contract still holds: a dangling segment is
    /// closed and a `Finish` with an unknown reason goes out.
    pub(crate) fn finish_eof(&mut self) -> Vec<GenerationPart> {
        if self.is_finished() {
            return Vec::new();
        }

        let mut parts = Vec::new();
        self.close_text(&mut parts);
        parts.push(GenerationPart::Finish {
            reason: FinishReason::Unknown,
            usage: self.usage.clone(),
        });
        self.state = State::Finished;
        parts
    }

    fn on_message(&mut self, message: MessageEvent) -> Vec<GenerationPart> {
        let mut parts = Vec::new();
        for item in message.content {
            match (message.role, item) {
                (Role::Assistant, ContentItem::Text(text)) => {
                    self.on_assistant_text(&mut parts, text.text);
                }
                (Role::Assistant, ContentItem::ToolRequest(request)) => {
                    self.on_tool_request(&mut parts, request);
                }
                (Role::User, ContentItem::ToolResponse(response)) => {
                    self.on_tool_response(&mut parts, response);
                }
                (role, item) => {
                    tracing::debug!(?role, "ignoring content item out of place: {:?}", item);
                }
            }
        }
        parts
    }

    fn on_assistant_text(&mut self, parts: &mut Vec<GenerationPart>, text: String) {
        let id = match &self.state {
            State::TextOpen(id) => id.clone(),
            _ => {
                let id = self.fresh_segment_id();
                parts.push(GenerationPart::TextStart { id: id.clone() });
                self.state = State::TextOpen(id.clone());
                id
            }
        };
        parts.push(GenerationPart::TextDelta { id, text });
    }

    fn on_tool_request(&mut self, parts: &mut Vec<GenerationPart>, request: ToolRequestItem) {
        // Close-before-tool invariant.
        self.close_text(parts);

        self.tool_names
            .insert(request.id.clone(), request.tool_name.clone());
        parts.push(GenerationPart::ToolCall {
            id: request.id,
            name: request.tool_name,
            arguments: request.arguments,
        });
        self.state = State::ToolPending;
    }

    fn on_tool_response(&mut self, parts: &mut Vec<GenerationPart>, response: ToolResponseItem) {
        let name = self
            .tool_names
            .get(&response.id)
            .cloned()
            .unwrap_or_else(|| UNRESOLVED_TOOL_NAME.to_string());
        let output = visible_text(&response.result, self.audience);
        parts.push(GenerationPart::ToolResult {
            id: response.id,
            name,
            output,
            is_error: response.is_error,
        });
    }

    /// Close the open text segment, if any.
    fn close_text(&mut self, parts: &mut Vec<GenerationPart>) {
        if let State::TextOpen(id) = std::mem::replace(&mut self.state, State::Idle) {
            parts.push(GenerationPart::TextEnd { id });
        }
    }

    fn fresh_segment_id(&mut self) -> String {
        let id = format!("text-{}", self.next_segment);
        self.next_segment += 1;
        id
    }
}
