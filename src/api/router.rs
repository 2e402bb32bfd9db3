use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, add_book, add_patron, borrow_book, get_account, get_book, list_books, list_patrons,
    login, pay_fine, remove_book, remove_patron, reserve_book, return_book,
};

/// Creates the API router with all lending endpoints
///
/// Session & catalog:
/// - POST /login - Resolve a patron id
/// - GET /books - List or search books (`?q=`)
/// - GET /books/:isbn - Book details
///
/// Lending (students & faculty):
/// - POST /patrons/:patron_id/loans - Borrow a book
/// - DELETE /patrons/:patron_id/loans/:isbn - Return a book
/// - POST /patrons/:patron_id/reservations - Reserve a borrowed book
/// - GET /patrons/:patron_id/account - Loans, unpaid fine, reservations
/// - POST /patrons/:patron_id/fines/payments - Pay fines
///
/// Registry (librarians):
/// - POST /librarians/:librarian_id/books - Add a book
/// - DELETE /librarians/:librarian_id/books/:isbn - Remove a book
/// - GET /librarians/:librarian_id/patrons - List patrons
/// - POST /librarians/:librarian_id/patrons - Add a patron
/// - DELETE /librarians/:librarian_id/patrons/:patron_id - Remove a patron
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .route("/login", post(login))
        .route("/books", get(list_books))
        .route("/books/:isbn", get(get_book))
        .route("/patrons/:patron_id/loans", post(borrow_book))
        .route("/patrons/:patron_id/loans/:isbn", delete(return_book))
        .route("/patrons/:patron_id/reservations", post(reserve_book))
        .route("/patrons/:patron_id/account", get(get_account))
        .route("/patrons/:patron_id/fines/payments", post(pay_fine))
        .route("/librarians/:librarian_id/books", post(add_book))
        .route("/librarians/:librarian_id/books/:isbn", delete(remove_book))
        .route(
            "/librarians/:librarian_id/patrons",
            get(list_patrons).post(add_patron),
        )
        .route(
            "/librarians/:librarian_id/patrons/:patron_id",
            delete(remove_patron),
        )
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
