//! Named sessions and conversation export.
//!
//! Sessions are named, resumable conversation contexts maintained entirely
//! by the agent process. The bridge passes session directives through as
//! arguments and never touches the agent's store directly; the one
//! exception is [`export_messages`], which invokes the agent's own
//! `session export` subcommand (a separate one-shot process, not the
//! streaming bridge) to retrieve stored history for replay.
//!
//! # Example
//!
//! ```ignore
//! use libgoose::GooseClient;
//!
//! let client = GooseClient::new();
//! let session = client.session("support-42");
//!
//! let first = session.generate("My name is Alice").await?;
//! let second = session.generate("What's my name?").await?;
//!
//! for message in session.history().await? {
//!     println!("{:?}", message.role);
//! }
//! ```

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;

use crate::client::{GenerationRequest, GooseClient};
use crate::config::{ClientConfig, SessionName};
use crate::process::STDERR_TAIL_BYTES;
use crate::protocol::{visible_text, ContentItem, Role};
use crate::stream::{GenerationResponse, GenerationStream, UNRESOLVED_TOOL_NAME};
use crate::{Error, Invocation, Result};

/// A handle to one named conversation.
///
/// The first call creates the session on the agent side; subsequent calls
/// resume it. Calls through one handle must not run concurrently; the
/// agent's session store is not safe against interleaved writers.
#[derive(Debug)]
pub struct Session {
    client: GooseClient,
    name: SessionName,
    started: AtomicBool,
}

impl Session {
    /// Create a handle whose first call starts a fresh conversation.
    pub(crate) fn new(client: GooseClient, name: SessionName) -> Self {
        Self {
            client,
            name,
            started: AtomicBool::new(false),
        }
    }

    /// Mark the conversation as already existing, so every call resumes.
    pub fn resume_existing(self) -> Self {
        self.started.store(true, Ordering::Relaxed);
        self
    }

    /// The session name.
    pub fn name(&self) -> &SessionName {
        &self.name
    }

    /// Send a prompt into the session, streaming the response.
    pub async fn send(&self, prompt: &str) -> Result<GenerationStream> {
        self.client.stream(self.request(prompt)).await
    }

    /// Send a prompt into the session and fold the response.
    pub async fn generate(&self, prompt: &str) -> Result<GenerationResponse> {
        self.client.generate(self.request(prompt)).await
    }

    /// Retrieve the stored conversation for replay.
    pub async fn history(&self) -> Result<Vec<ReplayMessage>> {
        export_messages(self.client.config(), &self.name).await
    }

    fn request(&self, prompt: &str) -> GenerationRequest {
        let resume = self.started.swap(true, Ordering::Relaxed);
        GenerationRequest::new(prompt)
            .session_name(self.name.clone())
            .resume(resume)
    }
}

/// One message of a replayed conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayMessage {
    /// Who authored the message.
    pub role: Role,
    /// The message content, converted to caller-facing parts.
    pub parts: Vec<ReplayPart>,
}

/// One part of a replayed message.
///
/// Uses the same content tagging and audience-filter rule as the live
/// stream translation.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayPart {
    /// Plain text.
    Text(String),
    /// A tool invocation the assistant requested.
    ToolCall {
        /// Call-site identifier.
        id: String,
        /// Tool name.
        name: String,
        /// Tool arguments as JSON.
        arguments: Value,
    },
    /// The result of a tool invocation.
    ToolResult {
        /// Call-site identifier of the matching request.
        id: String,
        /// Resolved tool name, or the unresolved-name placeholder.
        name: String,
        /// Audience-filtered, concatenated result text.
        output: String,
        /// Whether the tool execution failed.
        is_error: bool,
    },
}

/// Shape of `session export --format json` output.
#[derive(Debug, Deserialize)]
struct ExportedConversation {
    #[serde(default)]
    messages: Vec<ExportedMessage>,
}

#[derive(Debug, Deserialize)]
struct ExportedMessage {
    role: Role,
    #[serde(default)]
    content: Vec<ContentItem>,
}

/// Retrieve a stored conversation through the agent's export subcommand.
///
/// # Errors
///
/// - [`Error::Spawn`] when the binary cannot be launched
/// - [`Error::Process`] when the export exits non-zero
/// - [`Error::Upstream`] when the exported JSON does not parse
pub async fn export_messages(
    config: &ClientConfig,
    name: &SessionName,
) -> Result<Vec<ReplayMessage>> {
    let args: Vec<String> = [
        "session",
        "export",
        "--name",
        name.as_str(),
        "--format",
        "json",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect();
    let invocation = Invocation::new(config.binary(), args);

    let mut cmd = Command::new(&invocation.binary);
    cmd.args(&invocation.args);
    if let Some(dir) = config.working_directory() {
        cmd.current_dir(dir);
    }
    if !config.inherit_env {
        cmd.env_clear();
    }
    for (key, value) in config.build_env() {
        cmd.env(key, value);
    }
    cmd.stdin(Stdio::null());

    let output = cmd
        .output()
        .await
        .map_err(|err| Error::spawn(invocation.clone(), err))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::process(
            invocation,
            output.status.code().unwrap_or(-1),
            tail_of(stderr.trim_end(), STDERR_TAIL_BYTES).to_string(),
        ));
    }

    let conversation: ExportedConversation =
        serde_json::from_slice(&output.stdout).map_err(|err| {
            Error::upstream(invocation, format!("malformed session export: {}", err))
        })?;

    Ok(convert_messages(conversation.messages, config))
}

/// Convert exported messages into replay parts.
///
/// Tool names are resolved by correlating response ids against the requests
/// seen earlier in the transcript, exactly like the live translator.
fn convert_messages(messages: Vec<ExportedMessage>, config: &ClientConfig) -> Vec<ReplayMessage> {
    let audience = config.audience();
    let mut tool_names: HashMap<String, String> = HashMap::new();
    let mut replay = Vec::with_capacity(messages.len());

    for message in messages {
        let mut parts = Vec::new();
        for item in message.content {
            match item {
                ContentItem::Text(text) => parts.push(ReplayPart::Text(text.text)),
                ContentItem::ToolRequest(request) => {
                    tool_names.insert(request.id.clone(), request.tool_name.clone());
                    parts.push(ReplayPart::ToolCall {
                        id: request.id,
                        name: request.tool_name,
                        arguments: request.arguments,
                    });
                }
                ContentItem::ToolResponse(response) => {
                    let name = tool_names
                        .get(&response.id)
                        .cloned()
                        .unwrap_or_else(|| UNRESOLVED_TOOL_NAME.to_string());
                    let output = visible_text(&response.result, audience);
                    parts.push(ReplayPart::ToolResult {
                        id: response.id,
                        name,
                        output,
                        is_error: response.is_error,
                    });
                }
            }
        }
        replay.push(ReplayMessage {
            role: message.role,
            parts,
        });
    }

    replay
}

/// The last `max` bytes of `s`, snapped to a char boundary.
fn tail_of(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}
