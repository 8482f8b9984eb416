//! Loan reservation handlers.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;
use tracing::info;

use liber_store::StoreError;

use crate::error::Result;
use crate::pages;
use crate::routes::redirect_to_login;
use crate::state::AppState;

/// POST /take/{id}/reserve/
///
/// A conflict is a legitimate outcome, not a fault: it renders the
/// "already taken" page through the normal flow and is never retried.
pub async fn reserve_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<i64>,
) -> Result<Response> {
    let Some(user) = state.sessions.user(&cookies).await else {
        return Ok(redirect_to_login(&format!("/take/{id}/")).into_response());
    };

    match state.store.reserve(id, &user.email) {
        Ok(loan) => {
            info!(book_id = id, loan_id = loan.id, "reservation made");
            Ok(pages::message_page("Your book has been reserved!").into_response())
        }
        Err(StoreError::AlreadyReserved(_)) => {
            Ok(pages::message_page("Sorry, this book is already taken!").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /return/{id}/
pub async fn return_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<i64>,
) -> Result<Response> {
    if state.sessions.user(&cookies).await.is_none() {
        return Ok(redirect_to_login("/").into_response());
    }

    if let Some(loan) = state.store.return_book(id)? {
        info!(book_id = id, loan_id = loan.id, "book returned");
    }
    Ok(Redirect::to("/").into_response())
}
