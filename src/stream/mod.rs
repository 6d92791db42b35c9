//! Stream translation: agent events in, generation parts out.
//!
//! The translation pipeline (line reader, decoder, translator) is
//! sequential within one call, so emitted parts are ordered exactly like
//! the events that produced them.
//!
//! - [`GenerationPart`]: the normalized caller-facing output unit
//! - [`GenerationStream`]: an async stream of parts from one call
//! - [`GenerationResponse`]: the folded form for non-streaming calls
//!
//! A stream is terminated by exactly one `Finish` or `Error` part; the
//! subprocess is always reaped before the terminator is emitted.

pub mod parts;
pub mod response;
pub(crate) mod translator;

pub use parts::{FinishReason, GenerationPart};
pub use response::{GenerationResponse, GenerationStream};
pub use translator::UNRESOLVED_TOOL_NAME;
