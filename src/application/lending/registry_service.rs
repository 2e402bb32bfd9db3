use crate::domain::{Book, Library, Patron, PatronId, Role, commands::*};

use super::errors::{LendingApplicationError, Result};
use super::lending_service::ServiceDependencies;

/// 利用者一覧の1行
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PatronListing {
    pub patron_id: PatronId,
    pub name: String,
    pub role: Role,
}

/// 司書であることを確認する
fn require_librarian(library: &Library, patron_id: &PatronId) -> Result<()> {
    let patron = library
        .find_patron(patron_id)
        .ok_or(LendingApplicationError::PatronNotFound)?;
    match patron.role() {
        Role::Librarian => Ok(()),
        role => Err(LendingApplicationError::NotPermitted(role)),
    }
}

/// 蔵書を登録する
pub async fn add_book(deps: &ServiceDependencies, cmd: AddBook) -> Result<Book> {
    let mut library = deps.library.lock().await;
    require_librarian(&library, &cmd.librarian_id)?;

    let book = Book::new(cmd.isbn, cmd.title, cmd.author, cmd.publisher, cmd.year);
    library.add_book(book.clone())?;

    tracing::info!(librarian_id = %cmd.librarian_id, isbn = %book.isbn, "book added");
    Ok(book)
}

/// 蔵書を削除する
///
/// 存在しなければ何もしない（`Ok(false)`）。貸出中・予約中は削除不可。
pub async fn remove_book(deps: &ServiceDependencies, cmd: RemoveBook) -> Result<bool> {
    let mut library = deps.library.lock().await;
    require_librarian(&library, &cmd.librarian_id)?;

    let removed = library.remove_book(&cmd.isbn)?.is_some();

    tracing::info!(librarian_id = %cmd.librarian_id, isbn = %cmd.isbn, removed, "remove book");
    Ok(removed)
}

/// 利用者を登録する
pub async fn add_patron(deps: &ServiceDependencies, cmd: AddPatron) -> Result<PatronListing> {
    let mut library = deps.library.lock().await;
    require_librarian(&library, &cmd.librarian_id)?;

    library.add_patron(Patron::new(cmd.patron_id.clone(), cmd.name.clone(), cmd.role))?;

    tracing::info!(
        librarian_id = %cmd.librarian_id,
        patron_id = %cmd.patron_id,
        role = %cmd.role,
        "patron added"
    );
    Ok(PatronListing {
        patron_id: cmd.patron_id,
        name: cmd.name,
        role: cmd.role,
    })
}

/// 利用者を削除する
///
/// 存在しなければ何もしない（`Ok(false)`）。貸出・予約がある利用者は削除不可。
pub async fn remove_patron(deps: &ServiceDependencies, cmd: RemovePatron) -> Result<bool> {
    let mut library = deps.library.lock().await;
    require_librarian(&library, &cmd.librarian_id)?;

    let removed = library.remove_patron(&cmd.patron_id)?.is_some();

    tracing::info!(
        librarian_id = %cmd.librarian_id,
        patron_id = %cmd.patron_id,
        removed,
        "remove patron"
    );
    Ok(removed)
}

/// 利用者一覧（司書のみ）
pub async fn list_patrons(
    deps: &ServiceDependencies,
    librarian_id: &PatronId,
) -> Result<Vec<PatronListing>> {
    let library = deps.library.lock().await;
    require_librarian(&library, librarian_id)?;

    Ok(library
        .patrons()
        .map(|p| PatronListing {
            patron_id: p.id.clone(),
            name: p.name.clone(),
            role: p.role(),
        })
        .collect())
}
