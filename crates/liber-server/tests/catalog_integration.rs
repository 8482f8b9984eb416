//! Integration tests for the catalog and reservation endpoints.

mod common;

use std::sync::Arc;

use axum::http::{StatusCode, header};
use serde_json::json;

use common::{MockExchanger, app, body_string, get, location, post_form, sign_in, test_state};

fn state_for(username: &str) -> liber_server::AppState {
    test_state(Arc::new(MockExchanger::new(json!({
        "preferred_username": username,
    }))))
}

#[tokio::test]
async fn test_unauthenticated_list_redirects_to_login() {
    let state = state_for("u@org.com");
    let app = app(&state);

    let resp = get(&app, "/", None).await;
    assert!(resp.status().is_redirection());
    assert_eq!(location(&resp), "/login/?next=%2F");
}

#[tokio::test]
async fn test_create_book_and_list() {
    let state = state_for("u@org.com");
    let app = app(&state);
    let cookie = sign_in(&app).await;

    let create = post_form(
        &app,
        "/",
        "title=Dune&author=Frank+Herbert&owner=Moss",
        Some(&cookie),
    )
    .await;
    assert!(create.status().is_redirection());

    let page = get(&app, "/", Some(&cookie)).await;
    assert_eq!(page.status(), StatusCode::OK);
    let body = body_string(page).await;
    assert!(body.contains("Dune"));
    assert!(body.contains("Available"));
}

#[tokio::test]
async fn test_blank_fields_create_nothing() {
    let state = state_for("u@org.com");
    let app = app(&state);
    let cookie = sign_in(&app).await;

    let resp = post_form(&app, "/", "title=+&author=X", Some(&cookie)).await;
    assert!(resp.status().is_redirection());
    assert!(state.store.list_books(None).unwrap().is_empty());
}

#[tokio::test]
async fn test_take_page_is_public_and_qr_served() {
    let state = state_for("u@org.com");
    let app = app(&state);
    let cookie = sign_in(&app).await;
    post_form(&app, "/", "title=Dune&author=Frank+Herbert", Some(&cookie)).await;

    // QR landing page needs no session
    let page = get(&app, "/take/1/", None).await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(body_string(page).await.contains("Dune"));

    let qr = get(&app, "/qr/1", None).await;
    assert_eq!(qr.status(), StatusCode::OK);
    assert_eq!(
        qr.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    let bytes = axum::body::to_bytes(qr.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn test_reserve_conflict_and_return_cycle() {
    let state = state_for("a@org.com");
    let app = app(&state);
    let cookie_a = sign_in(&app).await;
    post_form(&app, "/", "title=Dune&author=Frank+Herbert", Some(&cookie_a)).await;

    let reserved = post_form(&app, "/take/1/reserve/", "", Some(&cookie_a)).await;
    assert_eq!(reserved.status(), StatusCode::OK);
    assert!(body_string(reserved).await.contains("has been reserved"));

    // A second attempt hits the conflict page, not an error
    let conflict = post_form(&app, "/take/1/reserve/", "", Some(&cookie_a)).await;
    assert_eq!(conflict.status(), StatusCode::OK);
    assert!(body_string(conflict).await.contains("already taken"));

    // Listing shows the holder
    let page = body_string(get(&app, "/", Some(&cookie_a)).await).await;
    assert!(page.contains("Taken by a@org.com"));

    let returned = post_form(&app, "/return/1/", "", Some(&cookie_a)).await;
    assert!(returned.status().is_redirection());

    // Returning again is a harmless no-op
    let again = post_form(&app, "/return/1/", "", Some(&cookie_a)).await;
    assert!(again.status().is_redirection());

    // The book is takeable once more
    let retaken = post_form(&app, "/take/1/reserve/", "", Some(&cookie_a)).await;
    assert!(body_string(retaken).await.contains("has been reserved"));
}

#[tokio::test]
async fn test_reserve_requires_session() {
    let state = state_for("u@org.com");
    let app = app(&state);
    let cookie = sign_in(&app).await;
    post_form(&app, "/", "title=Dune&author=Frank+Herbert", Some(&cookie)).await;

    let resp = post_form(&app, "/take/1/reserve/", "", None).await;
    assert!(resp.status().is_redirection());
    assert_eq!(location(&resp), "/login/?next=%2Ftake%2F1%2F");
}

#[tokio::test]
async fn test_unknown_book_is_not_found() {
    let state = state_for("u@org.com");
    let app = app(&state);

    assert_eq!(get(&app, "/take/99/", None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/qr/99", None).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_filters_listing() {
    let state = state_for("u@org.com");
    let app = app(&state);
    let cookie = sign_in(&app).await;
    post_form(&app, "/", "title=Dune&author=Frank+Herbert", Some(&cookie)).await;
    post_form(&app, "/", "title=Neuromancer&author=William+Gibson", Some(&cookie)).await;

    let body = body_string(get(&app, "/?q=dune", Some(&cookie)).await).await;
    assert!(body.contains("Dune"));
    assert!(!body.contains("Neuromancer"));
}

#[tokio::test]
async fn test_print_qr_requires_session() {
    let state = state_for("u@org.com");
    let app = app(&state);
    let cookie = sign_in(&app).await;
    post_form(&app, "/", "title=Dune&author=Frank+Herbert", Some(&cookie)).await;

    let anon = get(&app, "/print_qr/1/", None).await;
    assert!(anon.status().is_redirection());

    let page = get(&app, "/print_qr/1/", Some(&cookie)).await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(body_string(page).await.contains("/qr/1"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let state = state_for("u@org.com");
    let app = app(&state);
    let cookie = sign_in(&app).await;

    let logout = post_form(&app, "/logout/", "", Some(&cookie)).await;
    assert!(logout.status().is_redirection());

    let page = get(&app, "/", Some(&cookie)).await;
    assert!(page.status().is_redirection());
}
