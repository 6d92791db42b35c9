//! Type-safe configuration options for the agent CLI.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upstream inference provider, with an escape hatch for new ones.
///
/// The provider determines which API-key environment variable the bridge
/// sets for the subprocess; see [`Provider::api_key_var`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI.
    OpenAi,
    /// Anthropic.
    Anthropic,
    /// Google.
    Google,
    /// Groq.
    Groq,
    /// OpenRouter.
    OpenRouter,
    /// Local inference via Ollama; needs no API key.
    Ollama,
    /// Custom provider identifier for providers not listed here.
    #[serde(untagged)]
    Custom(String),
}

impl Provider {
    /// The environment variable holding this provider's API key.
    ///
    /// The mapping is a static table; providers without a required key
    /// (local inference) and custom providers return `None`.
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("OPENAI_API_KEY"),
            Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
            Provider::Google => Some("GOOGLE_API_KEY"),
            Provider::Groq => Some("GROQ_API_KEY"),
            Provider::OpenRouter => Some("OPENROUTER_API_KEY"),
            Provider::Ollama | Provider::Custom(_) => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Anthropic => write!(f, "anthropic"),
            Provider::Google => write!(f, "google"),
            Provider::Groq => write!(f, "groq"),
            Provider::OpenRouter => write!(f, "openrouter"),
            Provider::Ollama => write!(f, "ollama"),
            Provider::Custom(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Provider {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "openai" => Provider::OpenAi,
            "anthropic" => Provider::Anthropic,
            "google" => Provider::Google,
            "groq" => Provider::Groq,
            "openrouter" => Provider::OpenRouter,
            "ollama" => Provider::Ollama,
            _ => Provider::Custom(s.to_string()),
        }
    }
}

impl From<String> for Provider {
    fn from(s: String) -> Self {
        Provider::from(s.as_str())
    }
}

/// An upstream provider/model pair.
///
/// When configured, the bridge exports the pair to the subprocess through
/// the model-selection environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamModel {
    /// The inference provider.
    pub provider: Provider,
    /// The provider-specific model identifier.
    pub model: String,
}

impl UpstreamModel {
    /// Create a new provider/model pair.
    pub fn new(provider: impl Into<Provider>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

/// Newtype for session names to prevent string mixups.
///
/// Sessions are named, resumable conversation contexts maintained entirely
/// by the agent process; the bridge only passes the name through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionName(pub String);

impl SessionName {
    /// Create a new SessionName from a string.
    pub fn new(name: impl Into<String>) -> Self {
        SessionName(name.into())
    }

    /// Get the session name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionName {
    fn from(s: String) -> Self {
        SessionName(s)
    }
}

impl From<&str> for SessionName {
    fn from(s: &str) -> Self {
        SessionName(s.to_string())
    }
}

impl AsRef<str> for SessionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_display() {
        assert_eq!(Provider::OpenAi.to_string(), "openai");
        assert_eq!(Provider::Anthropic.to_string(), "anthropic");
        assert_eq!(Provider::Ollama.to_string(), "ollama");
        assert_eq!(Provider::Custom("acme".into()).to_string(), "acme");
    }

    #[test]
    fn provider_from_str() {
        assert_eq!(Provider::from("openai"), Provider::OpenAi);
        assert_eq!(Provider::from("ANTHROPIC"), Provider::Anthropic);
        assert_eq!(Provider::from("acme"), Provider::Custom("acme".into()));
    }

    #[test]
    fn api_key_table() {
        assert_eq!(Provider::OpenAi.api_key_var(), Some("OPENAI_API_KEY"));
        assert_eq!(Provider::Anthropic.api_key_var(), Some("ANTHROPIC_API_KEY"));
        assert_eq!(Provider::Google.api_key_var(), Some("GOOGLE_API_KEY"));
        assert_eq!(Provider::Groq.api_key_var(), Some("GROQ_API_KEY"));
        assert_eq!(
            Provider::OpenRouter.api_key_var(),
            Some("OPENROUTER_API_KEY")
        );
        // Local inference requires no key.
        assert_eq!(Provider::Ollama.api_key_var(), None);
        assert_eq!(Provider::Custom("acme".into()).api_key_var(), None);
    }

    #[test]
    fn provider_serde_roundtrip() {
        for provider in [
            Provider::OpenAi,
            Provider::Ollama,
            Provider::Custom("acme".into()),
        ] {
            let json = serde_json::to_string(&provider).unwrap();
            let parsed: Provider = serde_json::from_str(&json).unwrap();
            assert_eq!(provider, parsed);
        }
    }

    #[test]
    fn upstream_model_new_accepts_str_provider() {
        let upstream = UpstreamModel::new("ollama", "llama3");
        assert_eq!(upstream.provider, Provider::Ollama);
        assert_eq!(upstream.model, "llama3");
    }

    #[test]
    fn session_name_conversions() {
        let name = SessionName::new("review-session");
        assert_eq!(name.as_str(), "review-session");
        assert_eq!(name.to_string(), "review-session");
        assert_eq!(SessionName::from("a"), SessionName::new("a"));
    }
}
