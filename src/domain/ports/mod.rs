//! Port trait definitions
//!
//! - `Tool`: a named operation the chat relay can dispatch to
//! - `TokenStreamer`: a model backend that streams reply text
//!
//! Infrastructure adapters implement these so the relay can be driven by
//! scripted streams and in-process tools in tests.

pub mod token_streamer;
pub mod tool;

pub use token_streamer::{TokenStream, TokenStreamer};
pub use tool::Tool;
