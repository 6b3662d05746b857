/*!
 * Error types for the lingocap library.
 *
 * This module contains custom error types for the different parts of the
 * caption pipeline, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with language-model provider APIs
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

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur while obtaining or decoding caption data
#[derive(Error, Debug)]
pub enum CaptionError {
    /// The caption endpoint could not be reached or answered with an error
    #[error("Failed to fetch captions: {0}")]
    Fetch(String),

    /// The caption payload was not valid caption JSON
    #[error("Failed to parse caption JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The track decoded fine but contains no usable words
    #[error("Caption track for '{0}' contains no words")]
    EmptyTrack(String),

    /// The caption URL template could not be expanded
    #[error("Caption URL template error: {0}")]
    Template(#[from] TemplateError),

    /// Reading a caption file failed
    #[error("Caption file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a punctuation round trip could not be applied
#[derive(Error, Debug)]
pub enum AugmentError {
    /// The language model request failed
    #[error("Punctuation request failed: {0}")]
    Provider(#[from] ProviderError),

    /// The model answered with nothing usable
    #[error("Language model returned an empty response")]
    EmptyResponse,

    /// None of the returned words could be aligned with the sentence
    #[error("Response words do not match the sentence")]
    NoMatchingWords,

    /// The timeline changed while the request was in flight
    #[error("Sentence {0:?} no longer matches the timeline")]
    Stale((usize, usize)),
}

/// Errors reported by a video player implementation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// The video element is not loaded yet or was removed from the page
    #[error("Video element unavailable")]
    VideoUnavailable,
}

/// Errors raised while parsing or evaluating URL templates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// An unexpected character in an expression
    #[error("Unexpected character '{found}' at position {position}")]
    UnexpectedChar {
        /// Offending character
        found: char,
        /// Byte offset inside the template
        position: usize,
    },

    /// The parser expected something else
    #[error("Syntax error at position {position}: {message}")]
    Syntax {
        /// Byte offset inside the template
        position: usize,
        /// Description of what was expected
        message: String,
    },

    /// A `${` placeholder was never closed
    #[error("Unterminated placeholder starting at position {0}")]
    Unterminated(usize),

    /// An identifier has no binding in the evaluation context
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// A call names a function the evaluator does not provide
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// A function or operator received the wrong number or kind of operands
    #[error("Invalid operands: {0}")]
    InvalidOperands(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from caption handling
    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),

    /// Error from the video player
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Error from punctuation augmentation
    #[error("Augment error: {0}")]
    Augment(#[from] AugmentError),

    /// Error from a URL template
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
