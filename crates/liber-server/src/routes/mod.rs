//! Route handlers.

pub mod auth;
pub mod catalog;
pub mod health;
pub mod loans;

pub use auth::{callback_handler, login_handler, logout_handler};
pub use catalog::{
    book_list_handler, create_book_handler, print_qr_handler, qr_png_handler, take_page_handler,
};
pub use health::health_routes;
pub use loans::{reserve_handler, return_handler};

use axum::response::Redirect;

/// Redirect an unauthenticated browser to sign-in, resuming at `next`.
pub(crate) fn redirect_to_login(next: &str) -> Redirect {
    Redirect::to(&format!("/login/?next={}", urlencoding::encode(next)))
}
