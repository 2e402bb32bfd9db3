use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Book, Fine, Isbn, PatronId, Role};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 利用者レコード（`id,name,role`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatronRecord {
    pub id: PatronId,
    pub name: String,
    pub role: Role,
}

/// 貸出レコード（`patronId,isbn,epochSeconds`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanRecord {
    pub patron_id: PatronId,
    pub isbn: Isbn,
    pub borrowed_at: DateTime<Utc>,
}

/// 延滞料金レコード（`patronId,amount`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FineRecord {
    pub patron_id: PatronId,
    pub amount: Fine,
}

/// 保存する図書館の全状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryRecords {
    pub books: Vec<Book>,
    pub patrons: Vec<PatronRecord>,
    pub loans: Vec<LoanRecord>,
    /// 料金が0より大きい利用者のみ
    pub fines: Vec<FineRecord>,
}

/// 読み込んだ状態
///
/// 各レコード種別は独立しており、保存先が存在しなければ `None`。
/// 初期データで補うかどうかは呼び出し側が決める。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredRecords {
    pub books: Option<Vec<Book>>,
    pub patrons: Option<Vec<PatronRecord>>,
    pub loans: Option<Vec<LoanRecord>>,
    pub fines: Option<Vec<FineRecord>>,
}

/// 図書館ストアポート
///
/// 起動時に読み込み、終了時に全件を書き直す永続化境界。
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// 全レコードを読み込む
    ///
    /// 不正なレコードが1件でもあれば読み込み全体を失敗させる
    /// （フィールドを黙って切り詰めない）。
    async fn load(&self) -> Result<StoredRecords>;

    /// 全レコードを書き直す（追記ではない）
    async fn save(&self, records: &LibraryRecords) -> Result<()>;
}
