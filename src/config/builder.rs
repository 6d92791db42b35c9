//! Client configuration and builder.
//!
//! # Example
//!
//! ```
//! use libgoose::config::{ClientConfig, UpstreamModel};
//!
//! let config = ClientConfig::builder()
//!     .upstream(UpstreamModel::new("anthropic", "claude-sonnet-4-5"))
//!     .api_key("sk-ant-...")
//!     .max_turns(25)
//!     .build()
//!     .unwrap();
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use super::options::UpstreamModel;
use crate::protocol::Audience;
use crate::{Error, Invocation, Result};

/// Default agent binary name, resolved through `PATH`.
pub const DEFAULT_BINARY: &str = "goose";

/// Default wall-clock budget for one generation call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Environment variable that disables the agent's interactive setup prompts.
/// Always set: the subprocess must never block waiting for a terminal.
pub(crate) const ENV_DISABLE_KEYRING: &str = "GOOSE_DISABLE_KEYRING";

/// Environment variable selecting the upstream provider.
pub(crate) const ENV_PROVIDER: &str = "GOOSE_PROVIDER";

/// Environment variable selecting the upstream model.
pub(crate) const ENV_MODEL: &str = "GOOSE_MODEL";

/// Environment variable capping the number of agent turns.
pub(crate) const ENV_MAX_TURNS: &str = "GOOSE_MAX_TURNS";

/// Configuration for the agent CLI client.
///
/// Use [`ClientConfig::builder()`] to create a new configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) binary_path: Option<PathBuf>,
    pub(crate) upstream: Option<UpstreamModel>,
    pub(crate) api_key: Option<String>,
    pub(crate) max_turns: Option<u32>,
    pub(crate) audience: Audience,
    pub(crate) default_timeout: Duration,
    pub(crate) working_directory: Option<PathBuf>,
    pub(crate) env_vars: HashMap<String, String>,
    pub(crate) inherit_env: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            upstream: None,
            api_key: None,
            max_turns: None,
            audience: Audience::User,
            default_timeout: DEFAULT_TIMEOUT,
            working_directory: None,
            env_vars: HashMap::new(),
            inherit_env: true,
        }
    }
}

impl ClientConfig {
    /// Create a new builder for ClientConfig.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// The configured upstream provider/model pair, if any.
    pub fn upstream(&self) -> Option<&UpstreamModel> {
        self.upstream.as_ref()
    }

    /// The audience used when filtering tool-result content.
    pub fn audience(&self) -> Audience {
        self.audience
    }

    /// The default wall-clock budget for one call.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// The working directory for the subprocess, if set.
    pub fn working_directory(&self) -> Option<&PathBuf> {
        self.working_directory.as_ref()
    }

    /// The agent binary path, defaulting to `goose` on `PATH`.
    pub(crate) fn binary(&self) -> PathBuf {
        self.binary_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY))
    }

    /// Assemble the environment variables for the subprocess.
    ///
    /// Caller-supplied variables are applied first; bridge-managed variables
    /// (keyring suppression, provider/model selection, API key, turn budget)
    /// are applied on top so the bridge's contract always holds.
    pub(crate) fn build_env(&self) -> HashMap<String, String> {
        let mut env = self.env_vars.clone();

        env.insert(ENV_DISABLE_KEYRING.to_string(), "1".to_string());

        if let Some(ref upstream) = self.upstream {
            env.insert(ENV_PROVIDER.to_string(), upstream.provider.to_string());
            env.insert(ENV_MODEL.to_string(), upstream.model.clone());

            if let (Some(var), Some(key)) = (upstream.provider.api_key_var(), &self.api_key) {
                env.insert(var.to_string(), key.clone());
            }
        }

        if let Some(turns) = self.max_turns {
            env.insert(ENV_MAX_TURNS.to_string(), turns.to_string());
        }

        env
    }
}

/// Builder for [`ClientConfig`].
///
/// Validation happens in [`build()`](ClientConfigBuilder::build).
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    binary_path: Option<PathBuf>,
    upstream: Option<UpstreamModel>,
    api_key: Option<String>,
    max_turns: Option<u32>,
    audience: Option<Audience>,
    default_timeout: Option<Duration>,
    working_directory: Option<PathBuf>,
    env_vars: HashMap<String, String>,
    inherit_env: Option<bool>,
}

impl ClientConfigBuilder {
    /// Path to the agent binary. Defaults to `goose` on `PATH`.
    pub fn binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = Some(path.into());
        self
    }

    /// Select the upstream provider/model pair.
    ///
    /// When unset, the agent uses whatever it was configured with locally.
    pub fn upstream(mut self, upstream: UpstreamModel) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// API key for the upstream provider.
    ///
    /// Exported under the provider's key variable; ignored for providers
    /// that require no key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Cap the number of agent turns per call.
    pub fn max_turns(mut self, turns: u32) -> Self {
        self.max_turns = Some(turns);
        self
    }

    /// Audience used when filtering tool-result content. Defaults to
    /// [`Audience::User`].
    pub fn audience(mut self, audience: Audience) -> Self {
        self.audience = Some(audience);
        self
    }

    /// Default wall-clock budget for one call. Individual requests can
    /// override it.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Working directory for the subprocess.
    pub fn working_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(path.into());
        self
    }

    /// Add/override an environment variable for the subprocess.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Whether the subprocess inherits the parent environment. Defaults to
    /// `true`.
    pub fn inherit_env(mut self, inherit: bool) -> Self {
        self.inherit_env = Some(inherit);
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the binary path is set but empty. A zero default
    /// timeout is accepted; calls made with it fail immediately with a
    /// timeout error.
    pub fn build(self) -> Result<ClientConfig> {
        if let Some(ref path) = self.binary_path {
            if path.as_os_str().is_empty() {
                return Err(Error::spawn(
                    Invocation::new(path.clone(), Vec::new()),
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "agent binary path is empty",
                    ),
                ));
            }
        }

        Ok(ClientConfig {
            binary_path: self.binary_path,
            upstream: self.upstream,
            api_key: self.api_key,
            max_turns: self.max_turns,
            audience: self.audience.unwrap_or_default(),
            default_timeout: self.default_timeout.unwrap_or(DEFAULT_TIMEOUT),
            working_directory: self.working_directory,
            env_vars: self.env_vars,
            inherit_env: self.inherit_env.unwrap_or(true),
        })
    }
}
