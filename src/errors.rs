/*!
 * Error types for the coursewarden application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when asking a generator backend for question candidates
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Error when making an API request fails
    #[error("Generator request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing a generator response fails
    #[error("Failed to parse generator response: {0}")]
    ParseError(String),

    /// Error returned by the backend API itself
    #[error("Generator API responded with error: {status_code} - {message}")]
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

/// Errors that can occur while gating a single lesson's quiz
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The lesson referenced by a run filter does not exist
    #[error("Lesson not found: {0}")]
    LessonNotFound(String),

    /// The question index referenced by a run filter does not exist
    #[error("Question index {index} out of range for lesson {lesson_id}")]
    QuestionIndexOutOfRange {
        /// Lesson whose quiz was indexed
        lesson_id: String,
        /// Requested zero-based index
        index: usize,
    },

    /// A stored question disappeared or changed identity between read and write
    #[error("Question identity drift for id {0}: stored row no longer matches")]
    IdentityDrift(String),

    /// The rewritten batch failed final validation and was not committed
    #[error("Rewritten quiz batch failed validation for lesson {lesson_id}: {reason}")]
    BatchValidationFailed {
        /// Lesson whose batch was rejected
        lesson_id: String,
        /// First failed check, for the run report
        reason: String,
    },

    /// Error from the generator backend
    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    /// Error from the persistence layer
    #[error("Store error: {0}")]
    Store(String),

    /// Error writing or reading a backup snapshot
    #[error("Backup error: {0}")]
    Backup(String),

    /// Error writing a run report or refinement list
    #[error("Report error: {0}")]
    Report(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a generator backend
    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    /// Error from the quiz gating pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error in configuration
    #[error("Config error: {0}")]
    Config(String),

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
