use crate::application::lending::{self, ServiceDependencies};
use crate::domain::{Fine, Isbn, PatronId, commands::*};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::{
    error::{ApiError, AppJson},
    types::{
        AccountResponse, AddBookRequest, AddPatronRequest, BookResponse, BorrowResponse,
        FinePaymentResponse, IsbnRequest, LoginRequest, LoginResponse, MessageResponse,
        PatronResponse, PayFineRequest, ReturnResponse, SearchBooksQuery,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

/// 空の識別子を拒否する
fn required(field: &str, value: String) -> Result<String, ApiError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(value)
}

// ============================================================================
// Session & catalog queries
// ============================================================================

/// POST /login - 利用者IDでログイン
///
/// 名前・役割と、学生・教員の場合は貸出数・予約数を返す。
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let patron_id = PatronId::new(required("patron_id", req.patron_id)?);
    let summary = lending::login(&state.service_deps, &patron_id).await?;
    Ok(Json(LoginResponse::from(summary)))
}

/// GET /books - 蔵書一覧または検索
///
/// クエリパラメータ:
/// - q: タイトル・著者の部分一致（大文字小文字を区別）。省略時は全件
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchBooksQuery>,
) -> Json<Vec<BookResponse>> {
    let books = lending::search_books(&state.service_deps, query.q.as_deref()).await;
    Json(books.into_iter().map(BookResponse::from).collect())
}

/// GET /books/:isbn - 蔵書詳細
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = lending::find_book(&state.service_deps, &Isbn::new(isbn)).await?;
    Ok(Json(BookResponse::from(book)))
}

// ============================================================================
// Lending (students & faculty)
// ============================================================================

/// POST /patrons/:patron_id/loans - 書籍を借りる
///
/// 強制されるビジネスルール:
/// - 貸出中の本は借りられない
/// - 予約済みの本は予約者本人のみ
/// - 役割ごとの冊数上限・未払い料金・長期貸出の制限
pub async fn borrow_book(
    State(state): State<Arc<AppState>>,
    Path(patron_id): Path<String>,
    AppJson(req): AppJson<IsbnRequest>,
) -> Result<(StatusCode, Json<BorrowResponse>), ApiError> {
    let cmd = BorrowBook {
        patron_id: PatronId::new(patron_id),
        isbn: Isbn::new(required("isbn", req.isbn)?),
    };

    let receipt = lending::borrow_book(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(BorrowResponse::from(receipt))))
}

/// DELETE /patrons/:patron_id/loans/:isbn - 書籍を返却
///
/// 延滞していても返却は受け付け、延滞料金を計上する。
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    Path((patron_id, isbn)): Path<(String, String)>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let cmd = ReturnBook {
        patron_id: PatronId::new(patron_id),
        isbn: Isbn::new(isbn),
    };

    let receipt = lending::return_book(&state.service_deps, cmd).await?;

    Ok(Json(ReturnResponse::from(receipt)))
}

/// POST /patrons/:patron_id/reservations - 貸出中の書籍を予約
pub async fn reserve_book(
    State(state): State<Arc<AppState>>,
    Path(patron_id): Path<String>,
    AppJson(req): AppJson<IsbnRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let cmd = ReserveBook {
        patron_id: PatronId::new(patron_id),
        isbn: Isbn::new(required("isbn", req.isbn)?),
    };

    lending::reserve_book(&state.service_deps, cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Book reserved successfully.")),
    ))
}

/// GET /patrons/:patron_id/account - 貸出中の本と未払い料金
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(patron_id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let view = lending::view_account(&state.service_deps, &PatronId::new(patron_id)).await?;
    Ok(Json(AccountResponse::from(view)))
}

/// POST /patrons/:patron_id/fines/payments - 延滞料金を支払う
///
/// amount を省略すると全額を支払う。
pub async fn pay_fine(
    State(state): State<Arc<AppState>>,
    Path(patron_id): Path<String>,
    AppJson(req): AppJson<PayFineRequest>,
) -> Result<Json<FinePaymentResponse>, ApiError> {
    let cmd = PayFine {
        patron_id: PatronId::new(patron_id),
        amount: req.amount.map(Fine::new),
    };

    let payment = lending::pay_fine(&state.service_deps, cmd).await?;

    Ok(Json(FinePaymentResponse::from(payment)))
}

// ============================================================================
// Registry (librarians)
// ============================================================================

/// POST /librarians/:librarian_id/books - 蔵書を登録
pub async fn add_book(
    State(state): State<Arc<AppState>>,
    Path(librarian_id): Path<String>,
    AppJson(req): AppJson<AddBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let cmd = AddBook {
        librarian_id: PatronId::new(librarian_id),
        isbn: Isbn::new(required("isbn", req.isbn)?),
        title: req.title,
        author: req.author,
        publisher: req.publisher,
        year: req.year,
    };

    let book = lending::add_book(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// DELETE /librarians/:librarian_id/books/:isbn - 蔵書を削除
///
/// 存在しないISBNは何もせず成功を返す。
pub async fn remove_book(
    State(state): State<Arc<AppState>>,
    Path((librarian_id, isbn)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let cmd = RemoveBook {
        librarian_id: PatronId::new(librarian_id),
        isbn: Isbn::new(isbn),
    };

    let removed = lending::remove_book(&state.service_deps, cmd).await?;

    let message = if removed {
        "Book removed."
    } else {
        "No such book; nothing removed."
    };
    Ok(Json(MessageResponse::new(message)))
}

/// GET /librarians/:librarian_id/patrons - 利用者一覧
pub async fn list_patrons(
    State(state): State<Arc<AppState>>,
    Path(librarian_id): Path<String>,
) -> Result<Json<Vec<PatronResponse>>, ApiError> {
    let patrons =
        lending::list_patrons(&state.service_deps, &PatronId::new(librarian_id)).await?;
    Ok(Json(patrons.into_iter().map(PatronResponse::from).collect()))
}

/// POST /librarians/:librarian_id/patrons - 利用者を登録
pub async fn add_patron(
    State(state): State<Arc<AppState>>,
    Path(librarian_id): Path<String>,
    AppJson(req): AppJson<AddPatronRequest>,
) -> Result<(StatusCode, Json<PatronResponse>), ApiError> {
    let cmd = AddPatron {
        librarian_id: PatronId::new(librarian_id),
        patron_id: PatronId::new(required("patron_id", req.patron_id)?),
        name: req.name,
        role: req.role,
    };

    let listing = lending::add_patron(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(PatronResponse::from(listing))))
}

/// DELETE /librarians/:librarian_id/patrons/:patron_id - 利用者を削除
///
/// 存在しないIDは何もせず成功を返す。
pub async fn remove_patron(
    State(state): State<Arc<AppState>>,
    Path((librarian_id, patron_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let cmd = RemovePatron {
        librarian_id: PatronId::new(librarian_id),
        patron_id: PatronId::new(patron_id),
    };

    let removed = lending::remove_patron(&state.service_deps, cmd).await?;

    let message = if removed {
        "Patron removed."
    } else {
        "No such patron; nothing removed."
    };
    Ok(Json(MessageResponse::new(message)))
}
