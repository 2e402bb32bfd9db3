use std::collections::BTreeMap;
use std::str::FromStr;

use crate::domain::{Book, BookStatus, BorrowRecord, Isbn, Library, Patron, PatronId, Role};
use crate::ports::{FineRecord, LibraryRecords, LibraryStore, LoanRecord, PatronRecord, StoredRecords};

use super::errors::{LendingApplicationError, Result};
use super::lending_service::ServiceDependencies;

/// 保存データが存在しない場合の初期データ方針
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SeedPolicy {
    /// 既定の蔵書5冊・利用者9名で補う
    #[default]
    Defaults,
    /// 空のまま始める
    Empty,
}

impl FromStr for SeedPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "defaults" => Ok(SeedPolicy::Defaults),
            "empty" => Ok(SeedPolicy::Empty),
            _ => Err(format!("Invalid seed policy: {}", s)),
        }
    }
}

impl SeedPolicy {
    /// 既定の蔵書
    pub fn books(&self) -> Vec<Book> {
        match self {
            SeedPolicy::Empty => Vec::new(),
            SeedPolicy::Defaults => [2020, 2021, 2019, 2022, 2018]
                .into_iter()
                .enumerate()
                .map(|(i, year)| {
                    let n = i + 1;
                    Book::new(
                        Isbn::new(format!("ISBN{}", n)),
                        format!("Book{}", n),
                        format!("Author{}", n),
                        format!("Pub{}", n),
                        year,
                    )
                })
                .collect(),
        }
    }

    /// 既定の利用者（学生5名・教員3名・司書1名）
    pub fn patrons(&self) -> Vec<PatronRecord> {
        if *self == SeedPolicy::Empty {
            return Vec::new();
        }
        let students = (1..=5).map(|n| (format!("S{}", n), format!("Student{}", n), Role::Student));
        let faculty = (1..=3).map(|n| (format!("F{}", n), format!("Faculty{}", n), Role::Faculty));
        let librarians = std::iter::once(("L1".to_string(), "Librarian1".to_string(), Role::Librarian));

        students
            .chain(faculty)
            .chain(librarians)
            .map(|(id, name, role)| PatronRecord {
                id: PatronId::new(id),
                name,
                role,
            })
            .collect()
    }
}

/// 保存されたレコードから図書館を組み立てる
///
/// レコード種別ごとに独立して扱う：
/// - 蔵書・利用者が存在しなければ初期データ方針で補う
/// - 貸出・料金が存在しなければ「なし」
/// - 未登録の利用者を指す貸出・料金は警告を出して読み飛ばす
/// - 蔵書と矛盾する貸出（未登録・貸出中でない・借り手の重複）は読み込みを失敗させる
pub fn build_library(records: StoredRecords, seed: SeedPolicy) -> Result<Library> {
    let mut library = Library::new();

    let books = records.books.unwrap_or_else(|| {
        tracing::info!(?seed, "no stored catalog, seeding");
        seed.books()
    });
    for book in books {
        let isbn = book.isbn.clone();
        library.add_book(book).map_err(|_| {
            LendingApplicationError::StoreError(format!("duplicate ISBN in catalog: {}", isbn).into())
        })?;
    }

    let patrons = records.patrons.unwrap_or_else(|| {
        tracing::info!(?seed, "no stored roster, seeding");
        seed.patrons()
    });
    for record in patrons {
        let id = record.id.clone();
        library
            .add_patron(Patron::new(record.id, record.name, record.role))
            .map_err(|_| {
                LendingApplicationError::StoreError(format!("duplicate patron id in roster: {}", id).into())
            })?;
    }

    // 1冊につき借り手は1人、貸出記録の本は Borrowed でなければならない
    let mut holders: BTreeMap<Isbn, PatronId> = BTreeMap::new();
    for loan in records.loans.unwrap_or_default() {
        if library.find_patron(&loan.patron_id).is_none() {
            tracing::warn!(patron_id = %loan.patron_id, isbn = %loan.isbn, "skipping loan for unknown patron");
            continue;
        }

        let status = library
            .find_book(&loan.isbn)
            .map(|book| book.status())
            .ok_or_else(|| {
                inconsistent(format!(
                    "loan of {} by {} names a book not in the catalog",
                    loan.isbn, loan.patron_id
                ))
            })?;
        if status != BookStatus::Borrowed {
            return Err(inconsistent(format!(
                "loan of {} by {} but the book is {}",
                loan.isbn, loan.patron_id, status
            )));
        }
        if let Some(holder) = holders.insert(loan.isbn.clone(), loan.patron_id.clone()) {
            return Err(inconsistent(format!(
                "{} is on loan to both {} and {}",
                loan.isbn, holder, loan.patron_id
            )));
        }

        let record = BorrowRecord {
            isbn: loan.isbn.clone(),
            borrowed_at: loan.borrowed_at,
        };
        library.restore_loan(&loan.patron_id, record)?;
    }

    for fine in records.fines.unwrap_or_default() {
        if library.restore_fine(&fine.patron_id, fine.amount).is_err() {
            tracing::warn!(patron_id = %fine.patron_id, "skipping fine for unknown patron");
        }
    }

    Ok(library)
}

fn inconsistent(msg: String) -> LendingApplicationError {
    LendingApplicationError::StoreError(msg.into())
}

/// 図書館の全状態を保存用レコードに変換する
///
/// 料金が0の利用者は料金レコードに含めない。
pub fn library_records(library: &Library) -> LibraryRecords {
    let mut records = LibraryRecords {
        books: library.books().cloned().collect(),
        ..LibraryRecords::default()
    };

    for patron in library.patrons() {
        records.patrons.push(PatronRecord {
            id: patron.id.clone(),
            name: patron.name.clone(),
            role: patron.role(),
        });
        records
            .loans
            .extend(patron.account().borrowed_books().iter().map(|r| LoanRecord {
                patron_id: patron.id.clone(),
                isbn: r.isbn.clone(),
                borrowed_at: r.borrowed_at,
            }));
        let fine = patron.account().unpaid_fine();
        if !fine.is_zero() {
            records.fines.push(FineRecord {
                patron_id: patron.id.clone(),
                amount: fine,
            });
        }
    }

    records
}

/// ストアから図書館を読み込む
pub async fn load_library(store: &dyn LibraryStore, seed: SeedPolicy) -> Result<Library> {
    let records = store
        .load()
        .await
        .map_err(LendingApplicationError::StoreError)?;
    let library = build_library(records, seed)?;

    tracing::info!(
        books = library.books().count(),
        patrons = library.patrons().count(),
        "library loaded"
    );
    Ok(library)
}

/// 現在の全状態をストアに書き出す
pub async fn save_library(deps: &ServiceDependencies) -> Result<()> {
    let records = {
        let library = deps.library.lock().await;
        library_records(&library)
    };

    deps.store
        .save(&records)
        .await
        .map_err(LendingApplicationError::StoreError)?;

    tracing::info!(
        books = records.books.len(),
        patrons = records.patrons.len(),
        loans = records.loans.len(),
        fines = records.fines.len(),
        "library saved"
    );
    Ok(())
}
