//! SQLite persistence for the Liber catalog.
//!
//! Owns the Book/Loan/User tables and the loan reservation engine. The
//! critical invariant (at most one unreturned loan per book) is enforced
//! twice: reserve runs its check-then-create inside a write-locking
//! transaction, and a partial unique index on unreturned loans backs it up
//! at the schema level.

pub mod error;
pub mod models;
pub mod store;

pub use error::{Result, StoreError};
pub use models::{Book, BookListing, Loan, User};
pub use store::LibraryStore;
