//! Configuration for the agent CLI client.
//!
//! This module provides:
//!
//! - [`ClientConfig`] and [`ClientConfigBuilder`] for configuring the client
//! - [`Provider`] and [`UpstreamModel`] for upstream model selection
//! - [`SessionName`] for named, resumable conversations
//!
//! # Example
//!
//! ```
//! use libgoose::config::{ClientConfig, UpstreamModel};
//!
//! let config = ClientConfig::builder()
//!     .upstream(UpstreamModel::new("openai", "gpt-4o"))
//!     .api_key("sk-...")
//!     .build()
//!     .unwrap();
//! ```

pub mod builder;
pub mod options;

pub use builder::{ClientConfig, ClientConfigBuilder, DEFAULT_BINARY, DEFAULT_TIMEOUT};
pub use options::{Provider, SessionName, UpstreamModel};
