//! Domain errors for the deferred action engine.

use thiserror::Error;

/// Format validation messages as a single `; `-separated line.
fn format_messages(messages: &[String]) -> String {
    messages.join("; ")
}

/// Domain-level errors surfaced by the request layer.
///
/// Missing tasks and callback failures are reported through `bool` returns
/// and logs instead.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid deferred action request: {}", format_messages(.0))]
    InvalidInput(Vec<String>),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Validation messages carried by the error.
    pub fn messages(&self) -> &[String] {
        match self {
            Self::InvalidInput(messages) => messages,
        }
    }
}
