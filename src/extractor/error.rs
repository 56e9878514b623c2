//! Error types for the extractor module

use thiserror::Error;

/// Error type for extraction strategies
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The element a strategy depends on is absent from the page
    #[error("missing container: {0}")]
    MissingContainer(String),

    /// A container was found but held no text
    #[error("empty body")]
    EmptyBody,

    /// CSS selector parsing error
    #[error("selector error: {0}")]
    Selector(String),
}
