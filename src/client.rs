//! High-level client for bridging requests to the agent CLI.
//!
//! This module provides [`GooseClient`], the main entry point, and
//! [`GenerationRequest`], the immutable per-call description.
//!
//! # Example
//!
//! ```ignore
//! use libgoose::{GenerationRequest, GooseClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = GooseClient::new();
//!     let text = client.generate_text("What is 2+2?").await?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::{ClientConfig, ClientConfigBuilder, SessionName, UpstreamModel};
use crate::process::AgentProcess;
use crate::protocol::Audience;
use crate::session::Session;
use crate::stream::{GenerationResponse, GenerationStream};
use crate::Result;

/// Session directives for one request.
///
/// The session store itself lives inside the agent; the bridge only passes
/// the name and resume flag through as arguments. Callers must not issue two
/// concurrent calls against the same session name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDirectives {
    /// Named conversation context to attach to, if any.
    pub name: Option<SessionName>,
    /// Whether to resume the named conversation's history.
    pub resume: bool,
}

/// An immutable description of one generation call.
///
/// Built with chained setters:
///
/// ```
/// use libgoose::GenerationRequest;
///
/// let request = GenerationRequest::new("summarize the diff")
///     .system_prompt("be terse")
///     .session_name("review")
///     .resume(true);
/// ```
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub(crate) system_prompt: Option<String>,
    pub(crate) prompt: String,
    pub(crate) session: SessionDirectives,
    pub(crate) extra_args: Vec<String>,
    pub(crate) cancellation: CancellationToken,
    pub(crate) timeout: Option<Duration>,
}

impl GenerationRequest {
    /// Create a request for the given user prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            prompt: prompt.into(),
            session: SessionDirectives::default(),
            extra_args: Vec::new(),
            cancellation: CancellationToken::new(),
            timeout: None,
        }
    }

    /// Set the system prompt.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Attach the call to a named session.
    pub fn session_name(mut self, name: impl Into<SessionName>) -> Self {
        self.session.name = Some(name.into());
        self
    }

    /// Resume the session's conversation history.
    pub fn resume(mut self, resume: bool) -> Self {
        self.session.resume = resume;
        self
    }

    /// Append extra arguments, passed through verbatim after everything the
    /// bridge assembles.
    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Thread a cancellation token through the call.
    ///
    /// A token that is already cancelled when the call starts short-circuits
    /// before any process is spawned.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Override the client's default wall-clock budget for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A client for bridging generation calls to the agent CLI.
///
/// `GooseClient` holds the configuration and spawns one agent process per
/// call. It is `Send + Sync` and cheap to clone; concurrent calls are
/// independent as long as they do not target the same session name.
#[derive(Debug, Clone, Default)]
pub struct GooseClient {
    config: Arc<ClientConfig>,
}

impl GooseClient {
    /// Create a client with default configuration (`goose` on `PATH`).
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with the given configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Create a builder for configuring a new client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Run one generation call and stream its parts.
    ///
    /// The returned stream is terminated by exactly one `Finish` or `Error`
    /// part. Dropping it kills the subprocess.
    ///
    /// # Errors
    ///
    /// Fails without spawning when the request's token is already cancelled,
    /// and with [`Error::Spawn`](crate::Error::Spawn) when the binary cannot
    /// be launched. Failures after spawn surface as a terminal `Error` part.
    pub async fn stream(&self, request: GenerationRequest) -> Result<GenerationStream> {
        let process = AgentProcess::spawn(&self.config, &request).await?;
        let timeout = request.timeout.unwrap_or(self.config.default_timeout());
        Ok(GenerationStream::drive_process(
            process,
            self.config.audience(),
            timeout,
            request.cancellation.clone(),
        ))
    }

    /// Run one generation call to completion and fold the result.
    ///
    /// # Errors
    ///
    /// Any terminal `Error` part of the underlying stream rejects the call
    /// with the corresponding typed error; the subprocess is reaped before
    /// the error propagates.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        self.stream(request).await?.collect_all().await
    }

    /// Convenience: generate and return only the concatenated text.
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        Ok(self.generate(GenerationRequest::new(prompt)).await?.text)
    }

    /// Get a handle to a named session.
    pub fn session(&self, name: impl Into<SessionName>) -> Session {
        Session::new(self.clone(), name.into())
    }

    /// Get a reference to the client's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// Builder for [`GooseClient`].
///
/// This wraps [`ClientConfigBuilder`] and builds directly into a client.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    inner: ClientConfigBuilder,
}

impl ClientBuilder {
    /// Path to the agent binary.
    pub fn binary_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.inner = self.inner.binary_path(path);
        self
    }

    /// Select the upstream provider/model pair.
    pub fn upstream(mut self, upstream: UpstreamModel) -> Self {
        self.inner = self.inner.upstream(upstream);
        self
    }

    /// API key for the upstream provider.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.inner = self.inner.api_key(key);
        self
    }

    /// Cap the number of agent turns per call.
    pub fn max_turns(mut self, turns: u32) -> Self {
        self.inner = self.inner.max_turns(turns);
        self
    }

    /// Audience used when filtering tool-result content.
    pub fn audience(mut self, audience: Audience) -> Self {
        self.inner = self.inner.audience(audience);
        self
    }

    /// Default wall-clock budget for one call.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.default_timeout(timeout);
        self
    }

    /// Working directory for the subprocess.
    pub fn working_directory(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.inner = self.inner.working_directory(path);
        self
    }

    /// Add/override an environment variable for the subprocess.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner = self.inner.env(key, value);
        self
    }

    /// Whether the subprocess inherits the parent environment.
    pub fn inherit_env(mut self, inherit: bool) -> Self {
        self.inner = self.inner.inherit_env(inherit);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid (empty binary
    /// path).
    pub fn build(self) -> Result<GooseClient> {
        Ok(GooseClient::with_config(self.inner.build()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;

    #[test]
    fn client_is_send_sync_and_clone() {
        fn assert_send_sync<T: Send + Sync>() {}
        fn assert_clone<T: Clone>() {}
        assert_send_sync::<GooseClient>();
        assert_send_sync::<ClientBuilder>();
        assert_send_sync::<GenerationRequest>();
        assert_clone::<GooseClient>();
    }

    #[test]
    fn request_defaults() {
        let request = GenerationRequest::new("hi");
        assert_eq!(request.prompt, "hi");
        assert!(request.system_prompt.is_none());
        assert!(request.session.name.is_none());
        assert!(!request.session.resume);
        assert!(request.extra_args.is_empty());
        assert!(!request.cancellation.is_cancelled());
    }

    #[test]
    fn request_chains_options() {
        let request = GenerationRequest::new("p")
            .system_prompt("s")
            .session_name("n")
            .resume(true)
            .extra_args(["--a", "--b"])
            .timeout(Duration::from_secs(5));
        assert_eq!(request.system_prompt.as_deref(), Some("s"));
        assert_eq!(request.session.name.as_ref().unwrap().as_str(), "n");
        assert!(request.session.resume);
        assert_eq!(request.extra_args, &["--a", "--b"]);
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn builder_builds_with_full_chain() {
        let client = GooseClient::builder()
            .binary_path("/usr/local/bin/goose")
            .upstream(UpstreamModel::new(Provider::Anthropic, "claude-sonnet-4-5"))
            .api_key("sk-test")
            .max_turns(10)
            .audience(Audience::User)
            .default_timeout(Duration::from_secs(30))
            .env("RUST_LOG", "debug")
            .inherit_env(true)
            .build()
            .unwrap();
        assert_eq!(client.config().default_timeout(), Duration::from_secs(30));
        assert_eq!(
            client.config().upstream().unwrap().provider,
            Provider::Anthropic
        );
    }

    #[test]
    fn clone_shares_config() {
        let client = GooseClient::builder()
            .max_turns(3)
            .build()
            .unwrap();
        let clone = client.clone();
        assert_eq!(
            clone.config().default_timeout(),
            client.config().default_timeout()
        );
    }
}
