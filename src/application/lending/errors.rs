use thiserror::Error;

use crate::domain::{
    BorrowBookError, PatronNotFound, RegistryError, ReserveBookError, ReturnBookError, Role,
};

/// 貸出管理アプリケーション層のエラー
///
/// 呼び出し側に分類済みの結果として返す。いずれも回復可能で、
/// 失敗時に共有状態は変更されていない。
#[derive(Debug, Error)]
pub enum LendingApplicationError {
    /// 蔵書が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 利用者が存在しない
    #[error("Patron not found")]
    PatronNotFound,

    /// 現在の状態では実行できない操作
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 役割・アカウント状態により貸出不可
    #[error("Patron is not eligible to borrow at this time")]
    NotEligible,

    /// この利用者はこの本を借りていない
    #[error("Patron has not borrowed this book")]
    NoSuchLoan,

    /// この役割には許可されていない操作
    #[error("Operation not permitted for role {0}")]
    NotPermitted(Role),

    /// ストアのエラー
    #[error("Library store error")]
    StoreError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<BorrowBookError> for LendingApplicationError {
    fn from(err: BorrowBookError) -> Self {
        match err {
            BorrowBookError::BookNotFound => Self::BookNotFound,
            BorrowBookError::PatronNotFound => Self::PatronNotFound,
            BorrowBookError::AlreadyBorrowed => {
                Self::InvalidState("Book is already borrowed".to_string())
            }
            BorrowBookError::ReservedByOther => {
                Self::InvalidState("Book is reserved by another patron".to_string())
            }
            BorrowBookError::NotEligible => Self::NotEligible,
        }
    }
}

impl From<ReturnBookError> for LendingApplicationError {
    fn from(err: ReturnBookError) -> Self {
        match err {
            ReturnBookError::BookNotFound => Self::BookNotFound,
            ReturnBookError::PatronNotFound => Self::PatronNotFound,
            ReturnBookError::NotBorrowed => Self::InvalidState("Book is not borrowed".to_string()),
            ReturnBookError::NoSuchLoan => Self::NoSuchLoan,
        }
    }
}

impl From<ReserveBookError> for LendingApplicationError {
    fn from(err: ReserveBookError) -> Self {
        match err {
            ReserveBookError::BookNotFound => Self::BookNotFound,
            ReserveBookError::PatronNotFound => Self::PatronNotFound,
            ReserveBookError::NotBorrowed => {
                Self::InvalidState("Book is not available for reservation".to_string())
            }
            ReserveBookError::AlreadyReserved => {
                Self::InvalidState("Book is already reserved".to_string())
            }
        }
    }
}

impl From<RegistryError> for LendingApplicationError {
    fn from(err: RegistryError) -> Self {
        let msg = match err {
            RegistryError::DuplicateIsbn => "A book with this ISBN already exists",
            RegistryError::DuplicatePatron => "A patron with this id already exists",
            RegistryError::BookInUse => "Book is borrowed or reserved and cannot be removed",
            RegistryError::PatronHasActivity => {
                "Patron has active loans or reservations and cannot be removed"
            }
        };
        Self::InvalidState(msg.to_string())
    }
}

impl From<PatronNotFound> for LendingApplicationError {
    fn from(_: PatronNotFound) -> Self {
        Self::PatronNotFound
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LendingApplicationError>;
