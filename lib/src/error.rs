/// Error type for the marksync library
///
/// Errors are scoped to the current user's view; none of them is fatal to the process.
/// Using `thiserror` crate for automatic `Error` trait implementation and `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Bad title or url, detected locally before any request is made
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The store rejected an insert or delete request
    #[error("Request failed: {0}")]
    Request(#[source] StoreError),

    /// The bulk fetch failed
    #[error("Failed to load bookmarks: {0}")]
    Fetch(#[source] StoreError),

    /// The live channel failed to establish or dropped
    #[error("Live updates unavailable: {0}")]
    Subscription(String),

    /// An empty user identifier was supplied
    #[error("No user given")]
    NoUser,

    /// An operation needs a signed-in session
    #[error("Not signed in")]
    NoSession,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (config and session files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing/serialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with a message
    #[error("{0}")]
    Other(String),
}

/// Result type alias using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

impl From<String> for SyncError {
    fn from(s: String) -> Self {
        SyncError::Other(s)
    }
}

impl From<&str> for SyncError {
    fn from(s: &str) -> Self {
        SyncError::Other(s.to_string())
    }
}

impl SyncError {
    /// The validation failure, if this error was raised locally
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            SyncError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

/// Input field a validation failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a title")]
    EmptyTitle,

    #[error("Please enter a URL")]
    EmptyUrl,

    #[error("Please enter a valid URL (e.g., https://example.com): {0}")]
    InvalidUrl(String),
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::EmptyTitle => Field::Title,
            ValidationError::EmptyUrl | ValidationError::InvalidUrl(_) => Field::Url,
        }
    }
}

/// Failures reported by a bookmark store or its transport
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transport-level failure (connection refused, timeout, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// The session was rejected or has expired
    #[error("Not authorized")]
    Unauthorized,

    /// No record matched both the id and the owner
    #[error("Bookmark not found")]
    NotFound,

    /// The store refused the request
    #[error("Rejected by store: {0}")]
    Rejected(String),

    /// Database-related errors (SQLite)
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
