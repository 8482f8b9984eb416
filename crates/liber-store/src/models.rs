//! Rows of the catalog schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A physical book in the catalog.
///
/// The QR artifact is stored alongside the row but deliberately kept out of
/// this struct; it is a one-time derived blob fetched separately when served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Free-text label for whoever lent the book to the organization.
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One lending of a book. `returned_at` is set exactly once; a loan with
/// `returned_at = NULL` is the book's active loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub book_id: i64,
    pub user_email: String,
    pub taken_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    pub fn is_returned(&self) -> bool {
        self.returned_at.is_some()
    }
}

/// A local user record, provisioned lazily on first successful sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Provider-issued stable identifier, typically an email/UPN.
    pub username: String,
    pub given_name: String,
    pub family_name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A catalog row joined with its active loan, for listing pages.
#[derive(Debug, Clone, Serialize)]
pub struct BookListing {
    pub book: Book,
    pub active_loan: Option<Loan>,
}

impl BookListing {
    pub fn is_available(&self) -> bool {
        self.active_loan.is_none()
    }
}
