//! Client side of the external research backend.
//!
//! The gateway only needs one capability from it: turn a question into an
//! answer. [`ResearchBackend::fetch_answer`] never fails; backend problems
//! come back as a [`ResearchAnswer`] carrying fallback text.

pub mod backend;
pub mod client;
pub mod error;

pub use backend::{ResearchBackend, ResearchRequest};
pub use client::HttpResearchClient;
pub use error::ResearchError;

pub use relay_core::ResearchAnswer;
