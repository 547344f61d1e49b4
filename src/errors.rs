/*!
 * Error types for the pagewise application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions. Page-level errors
 * (`DocumentError::Extraction`, `TranslationError`) are recorded against the page
 * and never abort a document; `PersistenceError` halts the current run.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when working with translation backends
#[derive(Error, Debug, Clone)]
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

impl ProviderError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }

    /// Map a reqwest transport error onto the taxonomy
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }

    /// Map a non-success HTTP status onto the taxonomy
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

/// Errors that can occur during translation
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// Non-retryable error from the backend
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Every attempt allowed by the retry policy failed
    #[error("Translation failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        /// Number of calls made
        attempts: u32,
        /// Error from the final attempt
        last: ProviderError,
    },

    /// The backend answered but produced no text
    #[error("Backend returned an empty translation")]
    EmptyResponse,
}

/// Errors raised by the document read/write collaborators
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document could not be opened or parsed
    #[error("Failed to open document {path:?}: {message}")]
    Open {
        /// Path that was opened
        path: PathBuf,
        /// Underlying reason
        message: String,
    },

    /// A single page could not be read
    #[error("Failed to extract text from page {page}: {message}")]
    Extraction {
        /// 0-based page index
        page: usize,
        /// Underlying reason
        message: String,
    },

    /// The renderer cannot draw a character
    #[error("Unsupported glyph U+{0:04X}")]
    UnsupportedGlyph(u32),

    /// Generic renderer fault
    #[error("Render error: {0}")]
    Render(String),

    /// Writing the rendered document failed
    #[error("Failed to save document {path:?}: {message}")]
    Save {
        /// Destination path
        path: PathBuf,
        /// Underlying reason
        message: String,
    },
}

/// Errors from progress and partial-output persistence
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Filesystem failure
    #[error("I/O error on {path:?}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The progress record could not be serialized or parsed
    #[error("Invalid progress record {path:?}: {message}")]
    Serialize {
        /// File involved
        path: PathBuf,
        /// Underlying reason
        message: String,
    },

    /// The stored record violates its invariants
    #[error("Corrupt progress record for '{document_id}': {message}")]
    Corrupt {
        /// Document the record belongs to
        document_id: String,
        /// Violated invariant
        message: String,
    },

    /// The stored record was made for a document with another page count
    #[error("Progress for '{document_id}' expects {stored} pages but the document has {actual}")]
    PageCountMismatch {
        /// Document the record belongs to
        document_id: String,
        /// Page count in the stored record
        stored: usize,
        /// Page count of the opened document
        actual: usize,
    },

    /// A page index outside the document was marked
    #[error("Page index {index} is out of range for '{document_id}' ({total_pages} pages)")]
    PageOutOfRange {
        /// Document the record belongs to
        document_id: String,
        /// Offending index
        index: usize,
        /// Page count of the record
        total_pages: usize,
    },

    /// The input file changed since the record was created
    #[error("Source file for '{document_id}' changed since progress was recorded")]
    SourceChanged {
        /// Document the record belongs to
        document_id: String,
    },

    /// Another pipeline instance owns this document
    #[error("Document '{document_id}' is locked by another process ({path:?})")]
    Locked {
        /// Document the lock belongs to
        document_id: String,
        /// Lock file path
        path: PathBuf,
    },
}

/// Errors from composite document assembly
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// Structured assembly and the reflow fallback both failed
    #[error("Assembly failed for '{document_id}': structured: {structured}; fallback: {fallback}")]
    Failed {
        /// Document being assembled
        document_id: String,
        /// Reason the structured strategy failed
        structured: String,
        /// Reason the reflow strategy failed
        fallback: String,
    },

    /// The plain-text composite could not be written
    #[error("Failed to write text composite {path:?}: {source}")]
    Io {
        /// Destination path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that end a document run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input document could not be opened
    #[error(transparent)]
    Open(DocumentError),

    /// The input document has no pages
    #[error("Document {0:?} contains no pages")]
    EmptyDocument(PathBuf),

    /// Progress or partial output could not be persisted
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// The composite output could not be produced
    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),
}
