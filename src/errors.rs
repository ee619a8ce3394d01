/*!
 * Error types for the subnfo application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a remote service
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur while processing a metadata (NFO/XML) file
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The file contained no lines at all before sanitizing
    #[error("Empty file: {0}")]
    EmptyFile(String),

    /// The sanitized content could not be parsed as markup
    #[error("Malformed markup in {path}: {reason}")]
    MalformedMarkup {
        /// Path of the offending file
        path: String,
        /// Parser error description
        reason: String,
    },
}
