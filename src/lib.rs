//! # libgoose
//!
//! Async Rust bridge for the Goose agent CLI.
//!
//! Each generation call spawns one `goose run` subprocess with structured
//! output enabled, consumes its line-delimited JSON event stream, and
//! re-emits a normalized, ordered sequence of typed [`GenerationPart`]s
//! while honoring cancellation and timeout contracts.
//!
//! ## Quick Start
//!
//! ```ignore
//! use libgoose::{GooseClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = GooseClient::new();
//!     let text = client.generate_text("What is 2+2?").await?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! ```ignore
//! use futures::StreamExt;
//! use libgoose::{GenerationPart, GenerationRequest, GooseClient};
//!
//! let client = GooseClient::new();
//! let mut stream = client.stream(GenerationRequest::new("Write a poem")).await?;
//! while let Some(part) = stream.next().await {
//!     if let GenerationPart::TextDelta { text, .. } = part {
//!         print!("{}", text);
//!     }
//! }
//! ```
//!
//! ## Sessions
//!
//! ```ignore
//! let session = client.session("support-42");
//! session.generate("My name is Alice").await?;
//! let reply = session.generate("What's my name?").await?;
//! // The agent remembers: "Your name is Alice"
//! ```
//!
//! ## Cancellation and timeouts
//!
//! ```ignore
//! use tokio_util::sync::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let request = GenerationRequest::new("long task")
//!     .cancellation(token.clone())
//!     .timeout(std::time::Duration::from_secs(60));
//! // token.cancel() terminates the subprocess and ends the stream
//! // with an `Error` part.
//! ```

mod client;
pub mod config;
mod error;
pub mod process;
pub mod protocol;
pub mod session;
pub mod stream;

pub use error::{Error, ErrorKind, Invocation, Result};

// Re-export the main client types at crate root
pub use client::{ClientBuilder, GenerationRequest, GooseClient, SessionDirectives};

// Re-export commonly used config types at crate root
pub use config::{ClientConfig, ClientConfigBuilder, Provider, SessionName, UpstreamModel};

// Re-export commonly used protocol types at crate root
pub use protocol::{AgentEvent, Audience, ContentItem, Role, Usage};

// Re-export commonly used process types at crate root
pub use process::{AgentProcess, LineSource};

// Re-export commonly used stream types at crate root
pub use stream::{FinishReason, GenerationPart, GenerationResponse, GenerationStream};

// Re-export session types at crate root
pub use session::{ReplayMessage, ReplayPart, Session};
