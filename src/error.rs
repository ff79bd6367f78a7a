//! Error types for the tagging library.
//!
//! All failures inside the structure synthesizer are recoverable at page
//! granularity; the only errors surfaced from the public API are document
//! store faults, tagged with the page they occurred on.

/// Result type alias for tagging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building the accessibility graph.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Referenced object not found in the document store
    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Page index outside the document's page range
    #[error("Page index out of range: {0}")]
    PageOutOfRange(usize),

    /// Pages must be applied strictly in document order
    #[error("Pages must be applied in order: expected page {expected}, got {found}")]
    PageOrder {
        /// Next page index the tagger expects
        expected: usize,
        /// Page index the caller passed
        found: usize,
    },

    /// A store failure while processing a specific page
    #[error("Page {page}: {source}")]
    Page {
        /// Index of the page being processed
        page: usize,
        /// Underlying store failure
        source: Box<Error>,
    },

    /// IO error (content stream assembly)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Tag this error with the page it occurred on.
    ///
    /// Already-tagged errors are passed through unchanged so nested helpers
    /// can wrap unconditionally.
    pub fn on_page(self, page: usize) -> Self {
        match self {
            Error::Page { .. } => self,
            other => Error::Page {
                page,
                source: Box::new(other),
            },
        }
    }
}
