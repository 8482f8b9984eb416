//! Catalog handlers: listing, creation, take pages, and QR artifacts.

use axum::{
    Form,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_cookies::Cookies;
use tracing::info;

use crate::error::{Result, ServerError};
use crate::pages;
use crate::qr;
use crate::routes::redirect_to_login;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub owner: String,
}

/// GET /
pub async fn book_list_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<SearchQuery>,
) -> Result<Response> {
    let Some(user) = state.sessions.user(&cookies).await else {
        return Ok(redirect_to_login("/").into_response());
    };

    let q = query.q.as_deref().unwrap_or("");
    let listings = state.store.list_books(query.q.as_deref())?;
    Ok(pages::book_list_page(&listings, q, &user).into_response())
}

/// POST /
pub async fn create_book_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<CreateBookForm>,
) -> Result<Response> {
    if state.sessions.user(&cookies).await.is_none() {
        return Ok(redirect_to_login("/").into_response());
    }

    let title = form.title.trim();
    let author = form.author.trim();
    if title.is_empty() || author.is_empty() {
        return Ok(Redirect::to("/").into_response());
    }

    let owner = Some(form.owner.trim()).filter(|o| !o.is_empty());
    let book = state.store.create_book(title, author, owner)?;

    // One-time QR artifact: encodes the public take-page deep link.
    let png = qr::render_png(&state.take_url(book.id))?;
    state.store.store_qr_png(book.id, &png)?;

    info!(book_id = book.id, title, "book added to catalog");
    Ok(Redirect::to("/").into_response())
}

/// GET /take/{id}/, the QR landing target, viewable without signing in.
pub async fn take_page_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let book = state.store.get_book(id)?;
    let active = state.store.active_loan(id)?;
    Ok(pages::take_page(&book, active.as_ref()).into_response())
}

/// GET /qr/{id}, the stored artifact bytes.
pub async fn qr_png_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let png = state
        .store
        .qr_png(id)?
        .ok_or_else(|| ServerError::NotFound(format!("qr artifact for book {id}")))?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// GET /print_qr/{id}/
pub async fn print_qr_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<i64>,
) -> Result<Response> {
    if state.sessions.user(&cookies).await.is_none() {
        return Ok(redirect_to_login(&format!("/print_qr/{id}/")).into_response());
    }

    let book = state.store.get_book(id)?;
    Ok(pages::print_qr_page(&book).into_response())
}
