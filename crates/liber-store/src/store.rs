use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use tracing::debug;

use crate::models::{Book, BookListing, Loan, User};
use crate::{Result, StoreError};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Repository over SQLite for the book catalog and its lending history.
///
/// Thread-safe via internal `Mutex<Connection>`. Reserve/return run inside
/// write-locking transactions so the check-then-create is serialized per
/// database, not just per process.
pub struct LibraryStore {
    conn: Mutex<Connection>,
}

impl LibraryStore {
    /// Open (or create) the database at `path` and run pending migrations.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let mut store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let mut store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&mut self) -> Result<()> {
        let conn = self.conn.get_mut().unwrap();
        embedded::migrations::runner()
            .run(conn)
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Lock the connection for use. Panics if poisoned.
    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ── Books ───────────────────────────────────────────────────────

    pub fn create_book(&self, title: &str, author: &str, owner: Option<&str>) -> Result<Book> {
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        let conn = self.conn();
        conn.execute(
            "INSERT INTO books (title, author, owner, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![title, author, owner, now_str],
        )?;
        let id = conn.last_insert_rowid();

        debug!(book_id = id, title, "book created");

        Ok(Book {
            id,
            title: title.to_string(),
            author: author.to_string(),
            owner: owner.map(String::from),
            created_at: now,
        })
    }

    pub fn get_book(&self, id: i64) -> Result<Book> {
        self.conn()
            .query_row(
                "SELECT id, title, author, owner, created_at FROM books WHERE id = ?1",
                params![id],
                row_to_book,
            )
            .optional()?
            .ok_or(StoreError::BookNotFound(id))
    }

    /// List books with their active loans, newest first. A non-empty `query`
    /// filters by case-insensitive substring match on title, author, or owner.
    pub fn list_books(&self, query: Option<&str>) -> Result<Vec<BookListing>> {
        const BASE: &str = "SELECT b.id, b.title, b.author, b.owner, b.created_at,
                    l.id, l.book_id, l.user_email, l.taken_at, l.returned_at
             FROM books b
             LEFT JOIN loans l ON l.book_id = b.id AND l.returned_at IS NULL";

        let mut listings = Vec::new();

        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                let conn = self.conn();
                let mut stmt = conn.prepare(&format!(
                    "{BASE} WHERE b.title LIKE ?1 OR b.author LIKE ?1 OR b.owner LIKE ?1
                     ORDER BY b.id DESC"
                ))?;
                let pattern = format!("%{q}%");
                let iter = stmt.query_map(params![pattern], row_to_listing)?;
                for r in iter {
                    listings.push(r?);
                }
            }
            None => {
                let conn = self.conn();
                let mut stmt = conn.prepare(&format!("{BASE} ORDER BY b.id DESC"))?;
                let iter = stmt.query_map([], row_to_listing)?;
                for r in iter {
                    listings.push(r?);
                }
            }
        }

        Ok(listings)
    }

    /// Delete a book; its lending history goes with it (administrative path,
    /// never reachable from the reservation engine).
    pub fn delete_book(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn()
            .execute("DELETE FROM books WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::BookNotFound(id));
        }
        Ok(())
    }

    // ── QR artifact ─────────────────────────────────────────────────

    /// Attach the QR artifact to a book. The blob is written once at
    /// creation; a later call against a book that already has one is a no-op.
    pub fn store_qr_png(&self, book_id: i64, png: &[u8]) -> Result<()> {
        let conn = self.conn();
        let wrote = conn.execute(
            "UPDATE books SET qr_png = ?1 WHERE id = ?2 AND qr_png IS NULL",
            params![png, book_id],
        )?;
        if wrote == 0 {
            // Either the book is gone or the artifact already exists.
            let exists: bool = conn.query_row(
                "SELECT COUNT(*) > 0 FROM books WHERE id = ?1",
                params![book_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(StoreError::BookNotFound(book_id));
            }
            debug!(book_id, "qr artifact already present, left unchanged");
        }
        Ok(())
    }

    /// Fetch the stored QR artifact, if one was generated.
    pub fn qr_png(&self, book_id: i64) -> Result<Option<Vec<u8>>> {
        self.conn()
            .query_row(
                "SELECT qr_png FROM books WHERE id = ?1",
                params![book_id],
                |row| row.get::<_, Option<Vec<u8>>>(0),
            )
            .optional()?
            .ok_or(StoreError::BookNotFound(book_id))
    }

    // ── Loan reservation engine ─────────────────────────────────────

    /// The book's unreturned loan, if any.
    pub fn active_loan(&self, book_id: i64) -> Result<Option<Loan>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT id, book_id, user_email, taken_at, returned_at
                 FROM loans WHERE book_id = ?1 AND returned_at IS NULL",
                params![book_id],
                row_to_loan,
            )
            .optional()?)
    }

    /// Reserve a book for `user_email`.
    ///
    /// The existence check and the insert run in one immediate (write-locked)
    /// transaction, so concurrent attempts on the same book serialize and at
    /// most one succeeds; the partial unique index on unreturned loans is the
    /// backstop for writers outside this process. Losers get
    /// [`StoreError::AlreadyReserved`] and must not retry automatically.
    pub fn reserve(&self, book_id: i64, user_email: &str) -> Result<Loan> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: bool = tx.query_row(
            "SELECT COUNT(*) > 0 FROM books WHERE id = ?1",
            params![book_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(StoreError::BookNotFound(book_id));
        }

        let taken: bool = tx.query_row(
            "SELECT COUNT(*) > 0 FROM loans WHERE book_id = ?1 AND returned_at IS NULL",
            params![book_id],
            |row| row.get(0),
        )?;
        if taken {
            return Err(StoreError::AlreadyReserved(book_id));
        }

        let now = Utc::now();
        let insert = tx.execute(
            "INSERT INTO loans (book_id, user_email, taken_at) VALUES (?1, ?2, ?3)",
            params![book_id, user_email, now.to_rfc3339()],
        );
        if let Err(e) = insert {
            return Err(map_constraint(e, book_id));
        }
        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!(book_id, user_email, loan_id = id, "book reserved");

        Ok(Loan {
            id,
            book_id,
            user_email: user_email.to_string(),
            taken_at: now,
            returned_at: None,
        })
    }

    /// Mark the book's active loan as returned.
    ///
    /// Returns the closed loan, or `None` if the book had no active loan;
    /// returning an unreserved book is a harmless no-op. Concurrent calls
    /// resolve to exactly one transition; the loser sees `None`.
    pub fn return_book(&self, book_id: i64) -> Result<Option<Loan>> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let active = tx
            .query_row(
                "SELECT id, book_id, user_email, taken_at, returned_at
                 FROM loans WHERE book_id = ?1 AND returned_at IS NULL",
                params![book_id],
                row_to_loan,
            )
            .optional()?;

        let Some(mut loan) = active else {
            return Ok(None);
        };

        let now = Utc::now();
        tx.execute(
            "UPDATE loans SET returned_at = ?1 WHERE id = ?2 AND returned_at IS NULL",
            params![now.to_rfc3339(), loan.id],
        )?;
        tx.commit()?;

        debug!(book_id, loan_id = loan.id, "book returned");

        loan.returned_at = Some(now);
        Ok(Some(loan))
    }

    // ── Users ───────────────────────────────────────────────────────

    /// Resolve or provision a user by provider username. Name fields are
    /// create-defaults only: repeat sign-ins never overwrite an existing row.
    pub fn upsert_user(&self, username: &str, given_name: &str, family_name: &str) -> Result<User> {
        let now_str = Utc::now().to_rfc3339();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (username, given_name, family_name, email, is_active, created_at)
             VALUES (?1, ?2, ?3, ?1, 1, ?4)
             ON CONFLICT(username) DO NOTHING",
            params![username, given_name, family_name, now_str],
        )?;

        Ok(conn.query_row(
            "SELECT id, username, given_name, family_name, email, is_active, created_at
             FROM users WHERE username = ?1",
            params![username],
            row_to_user,
        )?)
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT id, username, given_name, family_name, email, is_active, created_at
                 FROM users WHERE username = ?1",
                params![username],
                row_to_user,
            )
            .optional()?)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn map_constraint(e: rusqlite::Error, book_id: i64) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::AlreadyReserved(book_id)
        }
        _ => StoreError::Database(e),
    }
}

/// Parse a stored RFC 3339 timestamp from column `idx`. A corrupt value is a
/// data integrity fault and surfaces as a conversion error, never a
/// fabricated time.
fn parse_dt(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        owner: row.get(3)?,
        created_at: parse_dt(4, &row.get::<_, String>(4)?)?,
    })
}

fn row_to_loan(row: &rusqlite::Row<'_>) -> rusqlite::Result<Loan> {
    Ok(Loan {
        id: row.get(0)?,
        book_id: row.get(1)?,
        user_email: row.get(2)?,
        taken_at: parse_dt(3, &row.get::<_, String>(3)?)?,
        returned_at: row
            .get::<_, Option<String>>(4)?
            .map(|s| parse_dt(4, &s))
            .transpose()?,
    })
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        given_name: row.get(2)?,
        family_name: row.get(3)?,
        email: row.get(4)?,
        is_active: row.get::<_, i64>(5)? != 0,
        created_at: parse_dt(6, &row.get::<_, String>(6)?)?,
    })
}

fn row_to_listing(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookListing> {
    let book = Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        owner: row.get(3)?,
        created_at: parse_dt(4, &row.get::<_, String>(4)?)?,
    };
    let active_loan = match row.get::<_, Option<i64>>(5)? {
        Some(id) => Some(Loan {
            id,
            book_id: row.get(6)?,
            user_email: row.get(7)?,
            taken_at: parse_dt(8, &row.get::<_, String>(8)?)?,
            returned_at: row
                .get::<_, Option<String>>(9)?
                .map(|s| parse_dt(9, &s))
                .transpose()?,
        }),
        None => None,
    };
    Ok(BookListing { book, active_loan })
}
