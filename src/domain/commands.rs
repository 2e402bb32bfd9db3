use serde::{Deserialize, Serialize};

use super::{Fine, Isbn, PatronId, Role};

/// コマンド：書籍を借りる
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowBook {
    pub patron_id: PatronId,
    pub isbn: Isbn,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub patron_id: PatronId,
    pub isbn: Isbn,
}

/// コマンド：書籍を予約する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveBook {
    pub patron_id: PatronId,
    pub isbn: Isbn,
}

/// コマンド：延滞料金を支払う
///
/// `amount` が `None` の場合は未払い全額を支払う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayFine {
    pub patron_id: PatronId,
    pub amount: Option<Fine>,
}

/// コマンド：蔵書を登録する（司書のみ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddBook {
    pub librarian_id: PatronId,
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub year: i32,
}

/// コマンド：蔵書を削除する（司書のみ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveBook {
    pub librarian_id: PatronId,
    pub isbn: Isbn,
}

/// コマンド：利用者を登録する（司書のみ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPatron {
    pub librarian_id: PatronId,
    pub patron_id: PatronId,
    pub name: String,
    pub role: Role,
}

/// コマンド：利用者を削除する（司書のみ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovePatron {
    pub librarian_id: PatronId,
    pub patron_id: PatronId,
}
