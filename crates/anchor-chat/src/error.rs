//! Error types for the answering pipeline.

/// Failures of the external collaborators a turn depends on.
///
/// Every variant's `Display` is safe to show to the user: it never contains
/// a raw response body or a credential. The verbatim generation payload is
/// kept in `GenerationUnavailable::detail` for logging only.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("the knowledge base is unavailable ({0})")]
    RetrievalUnavailable(String),
    #[error("the knowledge base returned an unreadable response ({0})")]
    RetrievalMalformed(String),
    #[error("the answer service is unavailable ({summary})")]
    GenerationUnavailable { summary: String, detail: String },
    #[error("the answer service returned an unreadable response ({0})")]
    GenerationMalformed(String),
    #[error("the answer service returned no content")]
    GenerationEmpty,
}

impl ChatError {
    /// Whether the failure happened before generation was attempted.
    pub fn is_retrieval(&self) -> bool {
        matches!(
            self,
            ChatError::RetrievalUnavailable(_) | ChatError::RetrievalMalformed(_)
        )
    }

    /// Text of the error turn appended to the conversation.
    pub fn user_message(&self) -> String {
        format!("Sorry, something went wrong: {}. Please try again.", self)
    }
}

/// Short description of a transport failure without echoing the URL or body.
pub(crate) fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "could not connect".to_string()
    } else if let Some(status) = err.status() {
        format!("HTTP {}", status.as_u16())
    } else {
        "request failed".to_string()
    }
}
