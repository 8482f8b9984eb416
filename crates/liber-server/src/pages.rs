//! HTML pages, rendered with maud.

use axum::http::StatusCode;
use maud::{DOCTYPE, Markup, html};

use liber_store::{Book, BookListing, Loan};

use crate::session::SessionUser;

fn layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) " | Liber" }
            }
            body {
                (content)
            }
        }
    }
}

pub fn book_list_page(listings: &[BookListing], query: &str, user: &SessionUser) -> Markup {
    layout(
        "Books",
        html! {
            p {
                "Signed in as " (user.username) " "
                form method="post" action="/logout/" style="display:inline" {
                    button { "Sign out" }
                }
            }

            form method="get" action="/" {
                input name="q" type="text" placeholder="title, author or owner" value=(query);
                button { "Search" }
            }

            table {
                thead { tr {
                    th { "Title" }
                    th { "Author" }
                    th { "Owner" }
                    th { "Status" }
                    th { "QR" }
                } }
                tbody {
                    @for listing in listings {
                        tr {
                            td { (listing.book.title) }
                            td { (listing.book.author) }
                            td { (listing.book.owner.as_deref().unwrap_or("")) }
                            td {
                                @match &listing.active_loan {
                                    Some(loan) => {
                                        "Taken by " (loan.user_email)
                                        form method="post" action={ "/return/" (listing.book.id) "/" } {
                                            button { "Return" }
                                        }
                                    }
                                    None => { "Available" }
                                }
                            }
                            td {
                                a href={ "/print_qr/" (listing.book.id) "/" } { "Print QR" }
                            }
                        }
                    }
                }
            }

            h2 { "Add a book" }
            form method="post" action="/" {
                input name="title" type="text" placeholder="title" required;
                input name="author" type="text" placeholder="author" required;
                input name="owner" type="text" placeholder="owner (optional)";
                button { "Add" }
            }
        },
    )
}

pub fn take_page(book: &Book, active_loan: Option<&Loan>) -> Markup {
    layout(
        &book.title,
        html! {
            h1 { (book.title) }
            p { "by " (book.author) }
            @if let Some(owner) = &book.owner {
                p { "Owned by " (owner) }
            }
            @match active_loan {
                Some(loan) => {
                    p { "Currently taken by " (loan.user_email) "." }
                }
                None => {
                    form method="post" action={ "/take/" (book.id) "/reserve/" } {
                        button { "Take this book" }
                    }
                }
            }
        },
    )
}

pub fn message_page(message: &str) -> Markup {
    layout(
        "Reservation",
        html! {
            p { (message) }
            p { a href="/" { "Back to the catalog" } }
        },
    )
}

pub fn print_qr_page(book: &Book) -> Markup {
    layout(
        &book.title,
        html! {
            h1 { (book.title) }
            img src={ "/qr/" (book.id) } alt="QR code" width="240" height="240";
            p { "Scan to take this book." }
        },
    )
}

pub fn error_page(status: StatusCode, message: &str) -> Markup {
    layout(
        status.canonical_reason().unwrap_or("Error"),
        html! {
            h1 { (status.as_u16()) " " (status.canonical_reason().unwrap_or("Error")) }
            p { (message) }
            p { a href="/login/" { "Sign in again" } }
        },
    )
}
