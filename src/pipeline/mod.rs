//! Retrieval-augmented query pipeline.
//!
//! - [`window`]: timestamp-filtered retrieval with a client-side fallback
//! - [`extract`]: JSON recovery from model text and the keyword fallbacks
//! - [`prompt`]: prompt templates
//! - [`defaults`]: payloads returned when an operation fails
//! - [`orchestrator`]: [`SentimentService`], composing the above

pub mod defaults;
pub mod extract;
pub mod orchestrator;
pub mod prompt;
pub mod window;

pub use orchestrator::SentimentService;
pub use window::QueryWindow;
