use serde::{Deserialize, Serialize};

use super::{BookStatus, Isbn, PatronId};

/// 蔵書 - ISBNで識別される1冊の本
///
/// 状態の保持のみを担い、遷移の妥当性は検証しない。
/// 不変条件（予約者あり ⇒ Borrowed または Reserved）の維持は
/// `Library` の責務。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub year: i32,
    status: BookStatus,
    reserved_by: Option<PatronId>,
}

impl Book {
    /// 新規登録（貸出可能・予約なし）
    pub fn new(
        isbn: Isbn,
        title: impl Into<String>,
        author: impl Into<String>,
        publisher: impl Into<String>,
        year: i32,
    ) -> Self {
        Self {
            isbn,
            title: title.into(),
            author: author.into(),
            publisher: publisher.into(),
            year,
            status: BookStatus::Available,
            reserved_by: None,
        }
    }

    pub fn status(&self) -> BookStatus {
        self.status
    }

    pub fn reserved_by(&self) -> Option<&PatronId> {
        self.reserved_by.as_ref()
    }

    pub fn is_reserved_by(&self, patron_id: &PatronId) -> bool {
        self.reserved_by.as_ref() == Some(patron_id)
    }

    pub(crate) fn set_status(&mut self, status: BookStatus) {
        self.status = status;
    }

    pub(crate) fn set_reserved_by(&mut self, patron_id: Option<PatronId>) {
        self.reserved_by = patron_id;
    }

    /// タイトルまたは著者に部分一致するか（大文字小文字を区別する）
    pub fn matches(&self, query: &str) -> bool {
        self.title.contains(query) || self.author.contains(query)
    }
}
