//! Error types for GitHub client operations.
//!
//! This module defines the error types that can occur when talking to the GitHub
//! REST API through the github_client crate, together with the mapping from HTTP
//! status codes to those errors.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during GitHub client operations.
///
/// Each variant corresponds to a class of upstream failure. Callers decide which
/// of them are fatal: a failed read of the source repository ends a sync run,
/// while a failed write to one target only marks that target as failed.
///
/// ## Examples
///
/// ```rust,ignore
/// use github_client::Error;
///
/// match client.get_branch_protection("my-org", "my-repo", "main").await {
///     Ok(protection) => println!("enforce admins: {:?}", protection.enforce_admins),
///     Err(Error::NotFound) => eprintln!("branch is not protected"),
///     Err(Error::AuthError(msg)) => eprintln!("credential rejected: {}", msg),
///     Err(err) => eprintln!("other error: {}", err),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request could not be sent or the response could not be read.
    ///
    /// The contained string is the transport error reported by the HTTP stack.
    #[error("API request failed: {0}")]
    ApiError(String),

    /// The credential was rejected (HTTP 401) or the client could not be built.
    #[error("Failed to authenticate or initialize GitHub client: {0}")]
    AuthError(String),

    /// Error deserializing the response from GitHub.
    ///
    /// This error occurs when the GitHub API returns a body that cannot be
    /// parsed into the expected data structure.
    #[error("Failed to deserialize GitHub response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The credential is valid but not allowed to perform the request (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// The GitHub API returned a response in an unexpected format.
    #[error("Invalid response format")]
    InvalidResponse,

    /// The requested resource was not found (HTTP 404).
    ///
    /// For branch protection this also means that the branch exists but is
    /// not protected.
    #[error("resource not found")]
    NotFound,

    /// The request was rejected by validation (HTTP 422).
    ///
    /// GitHub uses the same status when an endpoint has been called too often.
    #[error("validation failed, or the endpoint has been spammed")]
    ValidationFailed,

    /// Any other non-success status code.
    #[error("GitHub returned status {status}: {message}")]
    UpstreamError {
        /// The HTTP status code of the response
        status: u16,
        /// The message from the response body, if GitHub provided one
        message: String,
    },
}

impl Error {
    /// Maps a non-success HTTP status code and its body message to an error.
    ///
    /// Success and redirect codes are not errors and must be handled by the
    /// caller before calling this.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Error::AuthError(message),
            403 => Error::Forbidden,
            404 => Error::NotFound,
            422 => Error::ValidationFailed,
            status => Error::UpstreamError { status, message },
        }
    }
}
