use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Book, BookStatus, BorrowBookError, BorrowRecord, Fine, Isbn, Patron, PatronId,
    PatronNotFound, RegistryError, ReserveBookError, ReturnBookError,
};

/// 貸出の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowReceipt {
    pub isbn: Isbn,
    pub borrowed_at: DateTime<Utc>,
    /// 自分の予約を受け取った場合、受け取り後の残り予約数
    pub remaining_reservations: Option<usize>,
}

/// 返却の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnReceipt {
    pub isbn: Isbn,
    pub days_overdue: i64,
    pub fine: Fine,
    /// 返却後の蔵書の状態（予約があれば Reserved）
    pub status: BookStatus,
}

/// 図書館 - 蔵書と利用者登録簿を所有し、貸出・返却・予約の状態遷移を管理する
///
/// 状態遷移：
/// - Available --貸出--> Borrowed
/// - Borrowed  --返却--> Available（予約なし）/ Reserved（予約あり）
/// - Borrowed  --予約--> Borrowed（予約者を記録）
/// - Reserved  --予約者本人の貸出--> Borrowed（予約をクリア）
///
/// すべての操作は検証を先に行い、失敗時は状態を一切変更しない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Library {
    books: BTreeMap<Isbn, Book>,
    patrons: BTreeMap<PatronId, Patron>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // 蔵書・登録簿の管理
    // ========================================================================

    pub fn add_book(&mut self, book: Book) -> Result<(), RegistryError> {
        if self.books.contains_key(&book.isbn) {
            return Err(RegistryError::DuplicateIsbn);
        }
        self.books.insert(book.isbn.clone(), book);
        Ok(())
    }

    /// 蔵書を削除する
    ///
    /// 存在しない場合は何もせず `Ok(None)`。
    /// 貸出中・予約中の蔵書は削除できない（参照が宙に浮くため）。
    pub fn remove_book(&mut self, isbn: &Isbn) -> Result<Option<Book>, RegistryError> {
        match self.books.get(isbn) {
            None => Ok(None),
            Some(book) if book.status() != BookStatus::Available || book.reserved_by().is_some() => {
                Err(RegistryError::BookInUse)
            }
            Some(_) => Ok(self.books.remove(isbn)),
        }
    }

    pub fn add_patron(&mut self, patron: Patron) -> Result<(), RegistryError> {
        if self.patrons.contains_key(&patron.id) {
            return Err(RegistryError::DuplicatePatron);
        }
        self.patrons.insert(patron.id.clone(), patron);
        Ok(())
    }

    /// 利用者を削除する
    ///
    /// 存在しない場合は何もせず `Ok(None)`。
    /// 貸出中の本または予約を持つ利用者は削除できない。
    pub fn remove_patron(&mut self, id: &PatronId) -> Result<Option<Patron>, RegistryError> {
        match self.patrons.get(id) {
            None => Ok(None),
            Some(patron) if patron.account().loan_count() > 0 || self.reserved_count(id) > 0 => {
                Err(RegistryError::PatronHasActivity)
            }
            Some(_) => Ok(self.patrons.remove(id)),
        }
    }

    // ========================================================================
    // 照会
    // ========================================================================

    pub fn find_book(&self, isbn: &Isbn) -> Option<&Book> {
        self.books.get(isbn)
    }

    pub fn find_patron(&self, id: &PatronId) -> Option<&Patron> {
        self.patrons.get(id)
    }

    /// 利用者が予約中の蔵書数
    pub fn reserved_count(&self, id: &PatronId) -> usize {
        self.books.values().filter(|b| b.is_reserved_by(id)).count()
    }

    /// タイトルまたは著者の部分一致検索（大文字小文字を区別）
    pub fn search(&self, query: &str) -> Vec<&Book> {
        self.books.values().filter(|b| b.matches(query)).collect()
    }

    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    pub fn patrons(&self) -> impl Iterator<Item = &Patron> {
        self.patrons.values()
    }

    // ========================================================================
    // 貸出・返却・予約
    // ========================================================================

    /// 書籍を貸し出す
    ///
    /// 検証順序：
    /// 1. 蔵書が存在すること
    /// 2. 貸出中でないこと
    /// 3. 予約済みなら予約者本人であること
    /// 4. 利用者の役割ポリシーで貸出可能であること
    pub fn borrow_book(
        &mut self,
        patron_id: &PatronId,
        isbn: &Isbn,
        now: DateTime<Utc>,
    ) -> Result<BorrowReceipt, BorrowBookError> {
        let book = self.books.get(isbn).ok_or(BorrowBookError::BookNotFound)?;
        let patron = self
            .patrons
            .get(patron_id)
            .ok_or(BorrowBookError::PatronNotFound)?;

        let fulfills_reservation = match book.status() {
            BookStatus::Borrowed => return Err(BorrowBookError::AlreadyBorrowed),
            BookStatus::Reserved if !book.is_reserved_by(patron_id) => {
                return Err(BorrowBookError::ReservedByOther);
            }
            BookStatus::Reserved => true,
            BookStatus::Available => false,
        };

        if !patron.can_borrow(now) {
            return Err(BorrowBookError::NotEligible);
        }

        if let Some(patron) = self.patrons.get_mut(patron_id) {
            patron.account_mut().borrow(isbn.clone(), now);
        }
        if let Some(book) = self.books.get_mut(isbn) {
            book.set_status(BookStatus::Borrowed);
            book.set_reserved_by(None);
        }

        Ok(BorrowReceipt {
            isbn: isbn.clone(),
            borrowed_at: now,
            remaining_reservations: fulfills_reservation.then(|| self.reserved_count(patron_id)),
        })
    }

    /// 書籍を返却する
    ///
    /// 延滞日数 = max(0, 経過日数 - 役割の貸出期間)。
    /// 延滞料金は役割ポリシーで計算し、アカウントに加算する。
    pub fn return_book(
        &mut self,
        patron_id: &PatronId,
        isbn: &Isbn,
        now: DateTime<Utc>,
    ) -> Result<ReturnReceipt, ReturnBookError> {
        let book = self.books.get_mut(isbn).ok_or(ReturnBookError::BookNotFound)?;
        let patron = self
            .patrons
            .get_mut(patron_id)
            .ok_or(ReturnBookError::PatronNotFound)?;

        if book.status() != BookStatus::Borrowed {
            return Err(ReturnBookError::NotBorrowed);
        }
        let record = patron
            .account()
            .loan(isbn)
            .ok_or(ReturnBookError::NoSuchLoan)?;

        let days_overdue = (record.elapsed_days(now) - patron.role().max_loan_days()).max(0);
        let fine = patron.calculate_fine(days_overdue);
        patron.account_mut().return_book(isbn, fine);

        let status = if book.reserved_by().is_some() {
            BookStatus::Reserved
        } else {
            BookStatus::Available
        };
        book.set_status(status);

        Ok(ReturnReceipt {
            isbn: isbn.clone(),
            days_overdue,
            fine,
            status,
        })
    }

    /// 書籍を予約する
    ///
    /// 貸出中かつ未予約の本のみ予約できる。貸出可能な本は直接借りればよい。
    pub fn reserve_book(
        &mut self,
        patron_id: &PatronId,
        isbn: &Isbn,
    ) -> Result<(), ReserveBookError> {
        let book = self.books.get_mut(isbn).ok_or(ReserveBookError::BookNotFound)?;
        if !self.patrons.contains_key(patron_id) {
            return Err(ReserveBookError::PatronNotFound);
        }
        if book.status() != BookStatus::Borrowed {
            return Err(ReserveBookError::NotBorrowed);
        }
        if book.reserved_by().is_some() {
            return Err(ReserveBookError::AlreadyReserved);
        }

        book.set_reserved_by(Some(patron_id.clone()));
        Ok(())
    }

    /// 延滞料金を支払い、支払い後の残高を返す
    pub fn pay_fine(&mut self, patron_id: &PatronId, amount: Fine) -> Result<Fine, PatronNotFound> {
        let patron = self.patrons.get_mut(patron_id).ok_or(PatronNotFound)?;
        patron.account_mut().pay_fine(amount);
        Ok(patron.account().unpaid_fine())
    }

    // ========================================================================
    // 永続化からの復元
    // ========================================================================

    pub fn restore_loan(
        &mut self,
        patron_id: &PatronId,
        record: BorrowRecord,
    ) -> Result<(), PatronNotFound> {
        let patron = self.patrons.get_mut(patron_id).ok_or(PatronNotFound)?;
        patron.account_mut().add_borrow_record(record);
        Ok(())
    }

    pub fn restore_fine(&mut self, patron_id: &PatronId, fine: Fine) -> Result<(), PatronNotFound> {
        let patron = self.patrons.get_mut(patron_id).ok_or(PatronNotFound)?;
        patron.account_mut().set_unpaid_fine(fine);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn isbn(n: u32) -> Isbn {
        Isbn::new(format!("ISBN{}", n))
    }

    fn id(s: &str) -> PatronId {
        PatronId::new(s)
    }

    fn library() -> Library {
        let mut library = Library::new();
        for n in 1..=5 {
            library
                .add_book(Book::new(
                    isbn(n),
                    format!("Book{}", n),
                    format!("Author{}", n),
                    format!("Pub{}", n),
                    2020,
                ))
                .unwrap();
        }
        library
            .add_patron(Patron::new(id("S1"), "Student1", Role::Student))
            .unwrap();
        library
            .add_patron(Patron::new(id("S2"), "Student2", Role::Student))
            .unwrap();
        library
            .add_patron(Patron::new(id("F1"), "Faculty1", Role::Faculty))
            .unwrap();
        library
            .add_patron(Patron::new(id("L1"), "Librarian1", Role::Librarian))
            .unwrap();
        library
    }

    fn assert_reservation_invariant(library: &Library) {
        for book in library.books() {
            if book.reserved_by().is_some() {
                assert!(matches!(
                    book.status(),
                    BookStatus::Borrowed | BookStatus::Reserved
                ));
            }
        }
    }

    // TDD: borrow_book() のテスト
    #[test]
    fn test_borrow_available_book() {
        let mut library = library();

        let receipt = library.borrow_book(&id("S1"), &isbn(1), t0()).unwrap();

        assert_eq!(receipt.borrowed_at, t0());
        assert_eq!(receipt.remaining_reservations, None);
        assert_eq!(library.find_book(&isbn(1)).unwrap().status(), BookStatus::Borrowed);
        assert_eq!(library.find_patron(&id("S1")).unwrap().account().loan_count(), 1);
    }

    #[test]
    fn test_borrow_unknown_book() {
        let mut library = library();
        let result = library.borrow_book(&id("S1"), &isbn(99), t0());
        assert_eq!(result.unwrap_err(), BorrowBookError::BookNotFound);
    }

    #[test]
    fn test_borrow_unknown_patron() {
        let mut library = library();
        let result = library.borrow_book(&id("X9"), &isbn(1), t0());
        assert_eq!(result.unwrap_err(), BorrowBookError::PatronNotFound);
    }

    #[test]
    fn test_borrow_already_borrowed() {
        let mut library = library();
        library.borrow_book(&id("S1"), &isbn(1), t0()).unwrap();

        let result = library.borrow_book(&id("S2"), &isbn(1), t0());
        assert_eq!(result.unwrap_err(), BorrowBookError::AlreadyBorrowed);
    }

    #[test]
    fn test_student_fourth_borrow_fails_without_changing_account() {
        let mut library = library();
        for n in 1..=3 {
            library.borrow_book(&id("S1"), &isbn(n), t0()).unwrap();
        }
        let before = library.find_patron(&id("S1")).unwrap().account().clone();

        let result = library.borrow_book(&id("S1"), &isbn(4), t0());

        assert_eq!(result.unwrap_err(), BorrowBookError::NotEligible);
        assert_eq!(library.find_patron(&id("S1")).unwrap().account(), &before);
        assert_eq!(library.find_book(&isbn(4)).unwrap().status(), BookStatus::Available);
    }

    #[test]
    fn test_librarian_cannot_borrow() {
        let mut library = library();
        let result = library.borrow_book(&id("L1"), &isbn(1), t0());
        assert_eq!(result.unwrap_err(), BorrowBookError::NotEligible);
    }

    #[test]
    fn test_faculty_with_stale_loan_cannot_borrow() {
        let mut library = library();
        library.borrow_book(&id("F1"), &isbn(1), t0()).unwrap();

        let later = t0() + Duration::days(91);
        let result = library.borrow_book(&id("F1"), &isbn(2), later);
        assert_eq!(result.unwrap_err(), BorrowBookError::NotEligible);

        let earlier = t0() + Duration::days(90);
        assert!(library.borrow_book(&id("F1"), &isbn(2), earlier).is_ok());
    }

    // TDD: return_book() のテスト
    #[test]
    fn test_return_on_time_has_no_fine() {
        let mut library = library();
        library.borrow_book(&id("S1"), &isbn(1), t0()).unwrap();

        let receipt = library
            .return_book(&id("S1"), &isbn(1), t0() + Duration::days(15))
            .unwrap();

        assert_eq!(receipt.days_overdue, 0);
        assert_eq!(receipt.fine, Fine::ZERO);
        assert_eq!(receipt.status, BookStatus::Available);
        assert_eq!(library.find_book(&isbn(1)).unwrap().status(), BookStatus::Available);
    }

    #[test]
    fn test_student_return_after_twenty_days_fined_fifty() {
        let mut library = library();
        library.borrow_book(&id("S1"), &isbn(1), t0()).unwrap();

        let receipt = library
            .return_book(&id("S1"), &isbn(1), t0() + Duration::days(20))
            .unwrap();

        assert_eq!(receipt.days_overdue, 5);
        assert_eq!(receipt.fine, Fine::new(50));
        let account = library.find_patron(&id("S1")).unwrap().account();
        assert_eq!(account.unpaid_fine(), Fine::new(50));
        assert_eq!(account.loan_count(), 0);
    }

    #[test]
    fn test_faculty_overdue_return_not_fined() {
        let mut library = library();
        library.borrow_book(&id("F1"), &isbn(1), t0()).unwrap();

        let receipt = library
            .return_book(&id("F1"), &isbn(1), t0() + Duration::days(45))
            .unwrap();

        assert_eq!(receipt.days_overdue, 15);
        assert_eq!(receipt.fine, Fine::ZERO);
    }

    #[test]
    fn test_return_not_borrowed() {
        let mut library = library();
        let result = library.return_book(&id("S1"), &isbn(1), t0());
        assert_eq!(result.unwrap_err(), ReturnBookError::NotBorrowed);
    }

    #[test]
    fn test_return_by_other_patron_is_no_such_loan() {
        let mut library = library();
        library.borrow_book(&id("S1"), &isbn(1), t0()).unwrap();

        let result = library.return_book(&id("S2"), &isbn(1), t0());

        assert_eq!(result.unwrap_err(), ReturnBookError::NoSuchLoan);
        assert_eq!(library.find_book(&isbn(1)).unwrap().status(), BookStatus::Borrowed);
    }

    #[test]
    fn test_return_then_borrow_round_trip() {
        let mut library = library();
        let original = library.clone();

        library.borrow_book(&id("S1"), &isbn(1), t0()).unwrap();
        library.return_book(&id("S1"), &isbn(1), t0()).unwrap();
        assert_eq!(library, original);

        library.borrow_book(&id("S1"), &isbn(1), t0()).unwrap();
        assert_eq!(library.find_book(&isbn(1)).unwrap().status(), BookStatus::Borrowed);
    }

    // TDD: reserve_book() のテスト
    #[test]
    fn test_reserve_available_book_fails() {
        let mut library = library();
        let result = library.reserve_book(&id("S2"), &isbn(1));
        assert_eq!(result.unwrap_err(), ReserveBookError::NotBorrowed);
    }

    #[test]
    fn test_reserve_twice_fails() {
        let mut library = library();
        library.borrow_book(&id("S1"), &isbn(1), t0()).unwrap();
        library.reserve_book(&id("S2"), &isbn(1)).unwrap();

        let result = library.reserve_book(&id("F1"), &isbn(1));

        assert_eq!(result.unwrap_err(), ReserveBookError::AlreadyReserved);
        assert!(library.find_book(&isbn(1)).unwrap().is_reserved_by(&id("S2")));
    }

    #[test]
    fn test_reservation_flow() {
        let mut library = library();

        // S1が借りる → S2が予約 → S1が返却 → Reserved
        library.borrow_book(&id("S1"), &isbn(1), t0()).unwrap();
        library.reserve_book(&id("S2"), &isbn(1)).unwrap();
        assert_eq!(library.reserved_count(&id("S2")), 1);
        assert_reservation_invariant(&library);

        let receipt = library.return_book(&id("S1"), &isbn(1), t0()).unwrap();
        assert_eq!(receipt.status, BookStatus::Reserved);
        assert_reservation_invariant(&library);

        // 予約者以外は借りられない
        let result = library.borrow_book(&id("S1"), &isbn(1), t0());
        assert_eq!(result.unwrap_err(), BorrowBookError::ReservedByOther);
        let result = library.borrow_book(&id("F1"), &isbn(1), t0());
        assert_eq!(result.unwrap_err(), BorrowBookError::ReservedByOther);

        // 予約者本人は借りられ、予約はクリアされる
        let receipt = library.borrow_book(&id("S2"), &isbn(1), t0()).unwrap();
        assert_eq!(receipt.remaining_reservations, Some(0));
        let book = library.find_book(&isbn(1)).unwrap();
        assert_eq!(book.status(), BookStatus::Borrowed);
        assert!(book.reserved_by().is_none());
        assert_reservation_invariant(&library);
    }

    #[test]
    fn test_ineligible_reserver_keeps_reservation() {
        let mut library = library();
        library.borrow_book(&id("S1"), &isbn(1), t0()).unwrap();
        library.reserve_book(&id("S2"), &isbn(1)).unwrap();
        library.return_book(&id("S1"), &isbn(1), t0()).unwrap();
        library.restore_fine(&id("S2"), Fine::new(10)).unwrap();

        let result = library.borrow_book(&id("S2"), &isbn(1), t0());

        assert_eq!(result.unwrap_err(), BorrowBookError::NotEligible);
        let book = library.find_book(&isbn(1)).unwrap();
        assert_eq!(book.status(), BookStatus::Reserved);
        assert!(book.is_reserved_by(&id("S2")));
    }

    // TDD: pay_fine() のテスト
    #[test]
    fn test_pay_fine_restores_eligibility() {
        let mut library = library();
        library.restore_fine(&id("S1"), Fine::new(30)).unwrap();
        assert_eq!(
            library.borrow_book(&id("S1"), &isbn(1), t0()).unwrap_err(),
            BorrowBookError::NotEligible
        );

        let remaining = library.pay_fine(&id("S1"), Fine::new(30)).unwrap();

        assert_eq!(remaining, Fine::ZERO);
        assert!(library.borrow_book(&id("S1"), &isbn(1), t0()).is_ok());
    }

    #[test]
    fn test_pay_fine_unknown_patron() {
        let mut library = library();
        assert_eq!(library.pay_fine(&id("X1"), Fine::new(1)), Err(PatronNotFound));
    }

    // 照会
    #[test]
    fn test_search_is_case_sensitive_substring() {
        let library = library();
        assert_eq!(library.search("Book").len(), 5);
        assert_eq!(library.search("Author3").len(), 1);
        assert!(library.search("book").is_empty());
    }

    // 登録簿の管理
    #[test]
    fn test_add_duplicate_book_rejected() {
        let mut library = library();
        let result = library.add_book(Book::new(isbn(1), "Other", "Other", "Other", 2000));
        assert_eq!(result.unwrap_err(), RegistryError::DuplicateIsbn);
        assert_eq!(library.find_book(&isbn(1)).unwrap().title, "Book1");
    }

    #[test]
    fn test_add_duplicate_patron_rejected() {
        let mut library = library();
        let result = library.add_patron(Patron::new(id("S1"), "Other", Role::Faculty));
        assert_eq!(result.unwrap_err(), RegistryError::DuplicatePatron);
    }

    #[test]
    fn test_remove_absent_keys_is_noop() {
        let mut library = library();
        assert_eq!(library.remove_book(&isbn(42)), Ok(None));
        assert_eq!(library.remove_patron(&id("nobody")), Ok(None));
    }

    #[test]
    fn test_remove_borrowed_book_rejected() {
        let mut library = library();
        library.borrow_book(&id("S1"), &isbn(1), t0()).unwrap();

        assert_eq!(library.remove_book(&isbn(1)), Err(RegistryError::BookInUse));
        assert!(library.remove_book(&isbn(2)).unwrap().is_some());
        assert!(library.find_book(&isbn(2)).is_none());
    }

    #[test]
    fn test_remove_patron_with_loans_or_reservations_rejected() {
        let mut library = library();
        library.borrow_book(&id("S1"), &isbn(1), t0()).unwrap();
        library.reserve_book(&id("S2"), &isbn(1)).unwrap();

        assert_eq!(library.remove_patron(&id("S1")), Err(RegistryError::PatronHasActivity));
        assert_eq!(library.remove_patron(&id("S2")), Err(RegistryError::PatronHasActivity));
        assert!(library.remove_patron(&id("F1")).unwrap().is_some());
    }
}
