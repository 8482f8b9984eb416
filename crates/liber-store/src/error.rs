//! Error types for the store.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in the catalog store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No book with the given id.
    #[error("book {0} not found")]
    BookNotFound(i64),

    /// The book already has an unreturned loan.
    ///
    /// This is a business conflict, not a fault: the caller should tell the
    /// user the book is taken and must not retry automatically.
    #[error("book {0} already has an active loan")]
    AlreadyReserved(i64),

    /// Underlying SQLite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(String),
}
