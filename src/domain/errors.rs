/// 貸出のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorrowBookError {
    /// 蔵書が存在しない
    BookNotFound,
    /// 利用者が存在しない
    PatronNotFound,
    /// 既に貸出中
    AlreadyBorrowed,
    /// 他の利用者が予約済み
    ReservedByOther,
    /// 役割・アカウント状態により貸出不可
    NotEligible,
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnBookError {
    BookNotFound,
    PatronNotFound,
    /// 貸出中ではない
    NotBorrowed,
    /// この利用者はこの本を借りていない
    NoSuchLoan,
}

/// 予約のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveBookError {
    BookNotFound,
    PatronNotFound,
    /// 貸出中の本のみ予約できる
    NotBorrowed,
    /// 既に予約済み
    AlreadyReserved,
}

/// 蔵書・利用者登録簿の変更エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// 同じISBNの蔵書が既にある
    DuplicateIsbn,
    /// 同じIDの利用者が既にいる
    DuplicatePatron,
    /// 貸出中・予約中の蔵書は削除できない
    BookInUse,
    /// 貸出中・予約中の利用者は削除できない
    PatronHasActivity,
}

/// 利用者が存在しない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatronNotFound;
