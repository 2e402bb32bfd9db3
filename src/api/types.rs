use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::lending::{AccountView, FinePayment, PatronListing, PatronSummary};
use crate::domain::{Book, BookStatus, BorrowReceipt, Role, ReturnReceipt};

/// POST /login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub patron_id: String,
}

/// GET /books のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct SearchBooksQuery {
    /// タイトル・著者の部分一致（大文字小文字を区別）
    pub q: Option<String>,
}

/// 貸出・予約リクエスト
#[derive(Debug, Deserialize)]
pub struct IsbnRequest {
    pub isbn: String,
}

/// POST /patrons/:id/fines/payments
#[derive(Debug, Default, Deserialize)]
pub struct PayFineRequest {
    /// 省略時は全額
    pub amount: Option<u64>,
}

/// POST /librarians/:id/books
#[derive(Debug, Deserialize)]
pub struct AddBookRequest {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub year: i32,
}

/// POST /librarians/:id/patrons
#[derive(Debug, Deserialize)]
pub struct AddPatronRequest {
    pub patron_id: String,
    pub name: String,
    pub role: Role,
}

/// 蔵書レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub year: i32,
    pub status: BookStatus,
    pub reserved_by: Option<String>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            status: book.status(),
            reserved_by: book.reserved_by().map(|p| p.to_string()),
            isbn: book.isbn.to_string(),
            title: book.title,
            author: book.author,
            publisher: book.publisher,
            year: book.year,
        }
    }
}

/// ログインレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub patron_id: String,
    pub name: String,
    pub role: Role,
    pub borrowed_count: Option<usize>,
    pub reserved_count: Option<usize>,
    pub message: String,
}

impl From<PatronSummary> for LoginResponse {
    fn from(summary: PatronSummary) -> Self {
        let message = format!("Logged in as {} ({})", summary.name, summary.role);
        Self {
            patron_id: summary.patron_id.to_string(),
            name: summary.name,
            role: summary.role,
            borrowed_count: summary.borrowed_count,
            reserved_count: summary.reserved_count,
            message,
        }
    }
}

/// 貸出レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowResponse {
    pub isbn: String,
    pub borrowed_at: DateTime<Utc>,
    pub remaining_reservations: Option<usize>,
    pub message: String,
}

impl From<BorrowReceipt> for BorrowResponse {
    fn from(receipt: BorrowReceipt) -> Self {
        let message = match receipt.remaining_reservations {
            Some(remaining) => format!(
                "Book borrowed successfully. Reservation fulfilled. Remaining reserved books: {}",
                remaining
            ),
            None => "Book borrowed successfully.".to_string(),
        };
        Self {
            isbn: receipt.isbn.to_string(),
            borrowed_at: receipt.borrowed_at,
            remaining_reservations: receipt.remaining_reservations,
            message,
        }
    }
}

/// 返却レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ReturnResponse {
    pub isbn: String,
    pub days_overdue: i64,
    pub fine: u64,
    pub status: BookStatus,
    pub message: String,
}

impl From<ReturnReceipt> for ReturnResponse {
    fn from(receipt: ReturnReceipt) -> Self {
        let message = if receipt.fine.is_zero() {
            "Book returned successfully.".to_string()
        } else {
            format!(
                "Book returned successfully. Fined {} rupees for overdue.",
                receipt.fine
            )
        };
        Self {
            isbn: receipt.isbn.to_string(),
            days_overdue: receipt.days_overdue,
            fine: receipt.fine.value(),
            status: receipt.status,
            message,
        }
    }
}

/// 貸出中の1冊
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanResponse {
    pub isbn: String,
    pub borrowed_at: DateTime<Utc>,
}

/// アカウントレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub patron_id: String,
    pub loans: Vec<LoanResponse>,
    pub unpaid_fine: u64,
    pub reserved_count: usize,
}

impl From<AccountView> for AccountResponse {
    fn from(view: AccountView) -> Self {
        Self {
            patron_id: view.patron_id.to_string(),
            loans: view
                .loans
                .into_iter()
                .map(|r| LoanResponse {
                    isbn: r.isbn.to_string(),
                    borrowed_at: r.borrowed_at,
                })
                .collect(),
            unpaid_fine: view.unpaid_fine.value(),
            reserved_count: view.reserved_count,
        }
    }
}

/// 支払いレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct FinePaymentResponse {
    pub paid: u64,
    pub remaining: u64,
    pub message: String,
}

impl From<FinePayment> for FinePaymentResponse {
    fn from(payment: FinePayment) -> Self {
        let message = if payment.remaining.is_zero() {
            format!("Paid {} rupees. Fines cleared.", payment.paid)
        } else {
            format!(
                "Paid {} rupees. Remaining unpaid fines: {} rupees.",
                payment.paid, payment.remaining
            )
        };
        Self {
            paid: payment.paid.value(),
            remaining: payment.remaining.value(),
            message,
        }
    }
}

/// 利用者レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct PatronResponse {
    pub patron_id: String,
    pub name: String,
    pub role: Role,
}

impl From<PatronListing> for PatronResponse {
    fn from(listing: PatronListing) -> Self {
        Self {
            patron_id: listing.patron_id.to_string(),
            name: listing.name,
            role: listing.role,
        }
    }
}

/// メッセージのみのレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
