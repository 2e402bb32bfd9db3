use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Fine, Isbn};

/// 貸出記録 - 1冊の現在の貸出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRecord {
    pub isbn: Isbn,
    pub borrowed_at: DateTime<Utc>,
}

impl BorrowRecord {
    /// 貸出からの経過日数（24時間単位で切り捨て、負にはならない）
    pub fn elapsed_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.borrowed_at).num_days().max(0)
    }
}

/// 利用者アカウント - 貸出中の記録と未払い料金
///
/// 重複貸出のチェックは行わない（`Library` 側の状態チェックで保証する）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    unpaid_fine: Fine,
    borrowed_books: Vec<BorrowRecord>,
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unpaid_fine(&self) -> Fine {
        self.unpaid_fine
    }

    pub fn borrowed_books(&self) -> &[BorrowRecord] {
        &self.borrowed_books
    }

    pub fn loan_count(&self) -> usize {
        self.borrowed_books.len()
    }

    /// ISBNで貸出記録を探す
    pub fn loan(&self, isbn: &Isbn) -> Option<&BorrowRecord> {
        self.borrowed_books.iter().find(|r| &r.isbn == isbn)
    }

    /// 貸出記録を追加する
    pub fn borrow(&mut self, isbn: Isbn, borrowed_at: DateTime<Utc>) {
        self.borrowed_books.push(BorrowRecord { isbn, borrowed_at });
    }

    /// 最初に一致した貸出記録を削除し、料金を加算する
    ///
    /// 該当する記録がなければ何もしない（料金も加算しない）。
    pub fn return_book(&mut self, isbn: &Isbn, fine: Fine) {
        if let Some(pos) = self.borrowed_books.iter().position(|r| &r.isbn == isbn) {
            self.borrowed_books.remove(pos);
            self.unpaid_fine = self.unpaid_fine.add(fine);
        }
    }

    /// 料金を支払う。残高は0未満にならない
    pub fn pay_fine(&mut self, amount: Fine) {
        self.unpaid_fine = self.unpaid_fine.pay(amount);
    }

    // 以下は永続化からの復元専用

    pub fn set_unpaid_fine(&mut self, fine: Fine) {
        self.unpaid_fine = fine;
    }

    pub fn add_borrow_record(&mut self, record: BorrowRecord) {
        self.borrowed_books.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + Duration::days(day)
    }

    #[test]
    fn test_borrow_appends_record() {
        let mut account = Account::new();
        account.borrow(Isbn::new("ISBN1"), at(0));
        account.borrow(Isbn::new("ISBN2"), at(1));

        assert_eq!(account.loan_count(), 2);
        assert_eq!(account.loan(&Isbn::new("ISBN2")).unwrap().borrowed_at, at(1));
    }

    #[test]
    fn test_return_removes_record_and_adds_fine() {
        let mut account = Account::new();
        account.borrow(Isbn::new("ISBN1"), at(0));

        account.return_book(&Isbn::new("ISBN1"), Fine::new(50));

        assert_eq!(account.loan_count(), 0);
        assert_eq!(account.unpaid_fine(), Fine::new(50));
    }

    #[test]
    fn test_return_unknown_isbn_is_noop() {
        let mut account = Account::new();
        account.borrow(Isbn::new("ISBN1"), at(0));

        account.return_book(&Isbn::new("ISBN9"), Fine::new(50));

        assert_eq!(account.loan_count(), 1);
        assert_eq!(account.unpaid_fine(), Fine::ZERO);
    }

    #[test]
    fn test_return_removes_only_first_match() {
        let mut account = Account::new();
        account.add_borrow_record(BorrowRecord {
            isbn: Isbn::new("ISBN1"),
            borrowed_at: at(0),
        });
        account.add_borrow_record(BorrowRecord {
            isbn: Isbn::new("ISBN1"),
            borrowed_at: at(3),
        });

        account.return_book(&Isbn::new("ISBN1"), Fine::ZERO);

        assert_eq!(account.loan_count(), 1);
        assert_eq!(account.borrowed_books()[0].borrowed_at, at(3));
    }

    #[test]
    fn test_pay_fine_never_negative() {
        for (balance, payment, expected) in [(0, 0, 0), (0, 10, 0), (50, 20, 30), (50, 50, 0), (50, 80, 0)] {
            let mut account = Account::new();
            account.set_unpaid_fine(Fine::new(balance));
            account.pay_fine(Fine::new(payment));
            assert_eq!(account.unpaid_fine(), Fine::new(expected));
        }
    }

    #[test]
    fn test_elapsed_days_truncates_partial_days() {
        let record = BorrowRecord {
            isbn: Isbn::new("ISBN1"),
            borrowed_at: at(0),
        };
        assert_eq!(record.elapsed_days(at(20) - Duration::hours(1)), 19);
        assert_eq!(record.elapsed_days(at(20)), 20);
        // 時計が巻き戻っても負にならない
        assert_eq!(record.elapsed_days(at(-2)), 0);
    }
}
