//! Test utilities for libgoose integration tests.

use std::collections::VecDeque;
use std::io;

use libgoose::LineSource;
use serde_json::{json, Value};

/// Install a test subscriber so skipped-line warnings show up under
/// `RUST_LOG=libgoose=warn cargo test -- --nocapture`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A mock line source that replays canned agent output.
///
/// Lines are returned in order, then `Ok(None)` signals end of stream.
pub struct MockLines {
    lines: VecDeque<io::Result<String>>,
}

impl MockLines {
    /// Create a mock source over the given raw lines.
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines: lines.into_iter().map(Ok).collect(),
        }
    }

    /// Append an I/O error after the given lines.
    pub fn with_io_error(lines: Vec<String>, error: io::Error) -> Self {
        let mut queue: VecDeque<io::Result<String>> = lines.into_iter().map(Ok).collect();
        queue.push_back(Err(error));
        Self { lines: queue }
    }
}

impl LineSource for MockLines {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        match self.lines.pop_front() {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(err)) => Err(err),
            None => Ok(None),
        }
    }
}

/// Builder for realistic agent output line sequences.
pub struct ScenarioBuilder {
    lines: Vec<String>,
}

impl ScenarioBuilder {
    /// Create a new scenario builder.
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add one assistant message per text chunk, mirroring how the agent
    /// streams partial output.
    pub fn assistant_text(mut self, chunks: &[&str]) -> Self {
        for chunk in chunks {
            self.lines.push(
                json!({
                    "type": "message",
                    "role": "assistant",
                    "content": [{"type": "text", "text": chunk}],
                })
                .to_string(),
            );
        }
        self
    }

    /// Add an assistant message containing text followed by a tool request.
    pub fn assistant_text_then_tool(
        mut self,
        text: &str,
        id: &str,
        tool_name: &str,
        arguments: Value,
    ) -> Self {
        self.lines.push(
            json!({
                "type": "message",
                "role": "assistant",
                "content": [
                    {"type": "text", "text": text},
                    {"type": "toolRequest", "id": id, "toolName": tool_name, "arguments": arguments},
                ],
            })
            .to_string(),
        );
        self
    }

    /// Add an assistant message containing only a tool request.
    pub fn tool_request(mut self, id: &str, tool_name: &str, arguments: Value) -> Self {
        self.lines.push(
            json!({
                "type": "message",
                "role": "assistant",
                "content": [
                    {"type": "toolRequest", "id": id, "toolName": tool_name, "arguments": arguments},
                ],
            })
            .to_string(),
        );
        self
    }

    /// Add a user message carrying a tool response with the given result
    /// items (pre-built JSON values).
    pub fn tool_response(mut self, id: &str, result: Value, is_error: bool) -> Self {
        self.lines.push(
            json!({
                "type": "message",
                "role": "user",
                "content": [
                    {"type": "toolResponse", "id": id, "result": result, "isError": is_error},
                ],
            })
            .to_string(),
        );
        self
    }

    /// Add a completion event with the given total token count.
    pub fn complete(mut self, total_tokens: u64) -> Self {
        self.lines
            .push(json!({"type": "complete", "totalTokens": total_tokens}).to_string());
        self
    }

    /// Add an error event.
    pub fn error(mut self, message: &str) -> Self {
        self.lines
            .push(json!({"type": "error", "message": message}).to_string());
        self
    }

    /// Add a notification event.
    pub fn notification(mut self, message: &str) -> Self {
        self.lines
            .push(json!({"type": "notification", "message": message}).to_string());
        self
    }

    /// Add a line that does not parse as any recognized event.
    pub fn malformed(mut self) -> Self {
        self.lines.push("%%% not json %%%".to_string());
        self
    }

    /// Add a raw line verbatim.
    #[allow(dead_code)]
    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    /// Build the mock line source.
    pub fn build(self) -> MockLines {
        MockLines::new(self.lines)
    }
}
