use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::domain::{
    Book, BorrowReceipt, BorrowRecord, Fine, Isbn, Library, PatronId, ReturnReceipt, Role,
    commands::*,
};
use crate::ports::{Clock, LibraryStore};

use super::errors::{LendingApplicationError, Result};

/// サービスの依存関係
///
/// 図書館の状態は1つのロックの内側にあり、変更操作は
/// 検証から変更までロックを保持したまま実行される（操作の直列化）。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub library: Arc<Mutex<Library>>,
    pub store: Arc<dyn LibraryStore>,
    pub clock: Arc<dyn Clock>,
}

/// ログイン結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatronSummary {
    pub patron_id: PatronId,
    pub name: String,
    pub role: Role,
    /// 借りる役割のみ
    pub borrowed_count: Option<usize>,
    /// 借りる役割のみ
    pub reserved_count: Option<usize>,
}

/// アカウント照会結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub patron_id: PatronId,
    pub loans: Vec<BorrowRecord>,
    pub unpaid_fine: Fine,
    pub reserved_count: usize,
}

/// 支払い結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FinePayment {
    pub paid: Fine,
    pub remaining: Fine,
}

/// 借りる役割（学生・教員）であることを確認する
fn require_borrower(library: &Library, patron_id: &PatronId) -> Result<()> {
    let patron = library
        .find_patron(patron_id)
        .ok_or(LendingApplicationError::PatronNotFound)?;
    if !patron.role().is_borrower() {
        return Err(LendingApplicationError::NotPermitted(patron.role()));
    }
    Ok(())
}

/// 利用者IDでログインする
///
/// 識別子の照合のみ（認証は行わない）。
pub async fn login(deps: &ServiceDependencies, patron_id: &PatronId) -> Result<PatronSummary> {
    let library = deps.library.lock().await;
    let patron = library
        .find_patron(patron_id)
        .ok_or(LendingApplicationError::PatronNotFound)?;

    let (borrowed_count, reserved_count) = if patron.role().is_borrower() {
        (
            Some(patron.account().loan_count()),
            Some(library.reserved_count(patron_id)),
        )
    } else {
        (None, None)
    };

    tracing::info!(patron_id = %patron_id, role = %patron.role(), "patron logged in");

    Ok(PatronSummary {
        patron_id: patron.id.clone(),
        name: patron.name.clone(),
        role: patron.role(),
        borrowed_count,
        reserved_count,
    })
}

/// 書籍を借りる
///
/// ビジネスルール：
/// - 貸出中の本は借りられない
/// - 予約済みの本は予約者本人のみ借りられる
/// - 役割ポリシー（冊数上限・未払い料金・長期貸出）を満たすこと
pub async fn borrow_book(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<BorrowReceipt> {
    let now = deps.clock.now();
    let mut library = deps.library.lock().await;

    let receipt = library.borrow_book(&cmd.patron_id, &cmd.isbn, now)?;

    tracing::info!(
        patron_id = %cmd.patron_id,
        isbn = %cmd.isbn,
        fulfilled_reservation = receipt.remaining_reservations.is_some(),
        "book borrowed"
    );
    Ok(receipt)
}

/// 書籍を返却する
///
/// 延滞していても返却は受け付け、役割に応じた延滞料金を加算する。
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<ReturnReceipt> {
    let now = deps.clock.now();
    let mut library = deps.library.lock().await;

    let receipt = library.return_book(&cmd.patron_id, &cmd.isbn, now)?;

    tracing::info!(
        patron_id = %cmd.patron_id,
        isbn = %cmd.isbn,
        days_overdue = receipt.days_overdue,
        fine = receipt.fine.value(),
        "book returned"
    );
    Ok(receipt)
}

/// 書籍を予約する（学生・教員のみ）
pub async fn reserve_book(deps: &ServiceDependencies, cmd: ReserveBook) -> Result<()> {
    let mut library = deps.library.lock().await;
    require_borrower(&library, &cmd.patron_id)?;

    library.reserve_book(&cmd.patron_id, &cmd.isbn)?;

    tracing::info!(patron_id = %cmd.patron_id, isbn = %cmd.isbn, "book reserved");
    Ok(())
}

/// 延滞料金を支払う（学生・教員のみ）
///
/// 金額未指定なら全額。過払い分は残らない。
pub async fn pay_fine(deps: &ServiceDependencies, cmd: PayFine) -> Result<FinePayment> {
    let mut library = deps.library.lock().await;
    require_borrower(&library, &cmd.patron_id)?;

    let outstanding = library
        .find_patron(&cmd.patron_id)
        .map(|p| p.account().unpaid_fine())
        .unwrap_or_default();
    let paid = cmd.amount.unwrap_or(outstanding).min(outstanding);
    let remaining = library.pay_fine(&cmd.patron_id, paid)?;

    tracing::info!(
        patron_id = %cmd.patron_id,
        paid = paid.value(),
        remaining = remaining.value(),
        "fine paid"
    );
    Ok(FinePayment { paid, remaining })
}

/// 貸出中の本・未払い料金・予約数を照会する（学生・教員のみ）
pub async fn view_account(deps: &ServiceDependencies, patron_id: &PatronId) -> Result<AccountView> {
    let library = deps.library.lock().await;
    require_borrower(&library, patron_id)?;

    let account = library
        .find_patron(patron_id)
        .map(|p| p.account().clone())
        .ok_or(LendingApplicationError::PatronNotFound)?;

    Ok(AccountView {
        patron_id: patron_id.clone(),
        loans: account.borrowed_books().to_vec(),
        unpaid_fine: account.unpaid_fine(),
        reserved_count: library.reserved_count(patron_id),
    })
}

/// 蔵書を検索する
///
/// クエリがなければ全件。タイトルまたは著者の部分一致（大文字小文字を区別）。
pub async fn search_books(deps: &ServiceDependencies, query: Option<&str>) -> Vec<Book> {
    let library = deps.library.lock().await;
    match query {
        Some(q) => library.search(q).into_iter().cloned().collect(),
        None => library.books().cloned().collect(),
    }
}

/// ISBNで蔵書を取得する
pub async fn find_book(deps: &ServiceDependencies, isbn: &Isbn) -> Result<Book> {
    let library = deps.library.lock().await;
    library
        .find_book(isbn)
        .cloned()
        .ok_or(LendingApplicationError::BookNotFound)
}
