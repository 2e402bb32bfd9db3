use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Account, Fine, PatronId};

/// 学生の最大貸出冊数
pub const STUDENT_MAX_LOANS: usize = 3;
/// 教員の最大貸出冊数
pub const FACULTY_MAX_LOANS: usize = 5;
/// 教員がこれを超える日数の貸出を持っていると新規貸出不可
/// （貸出期間30日 + 延滞60日）
pub const FACULTY_MAX_HELD_DAYS: i64 = 90;
/// 学生の延滞料金（1日あたり）
pub const STUDENT_FINE_PER_DAY: u64 = 10;

/// 利用者の役割
///
/// 役割ごとの貸出可否と延滞料金のポリシーを持つ。作成後は変更不可。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Librarian,
}

impl Role {
    /// 文字列表現を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Librarian => "librarian",
        }
    }

    /// 本を借りる役割か（司書は借りない）
    pub fn is_borrower(&self) -> bool {
        !matches!(self, Role::Librarian)
    }

    /// 貸出期間（日数）
    ///
    /// 司書は借りないため実際には使われない。
    pub fn max_loan_days(&self) -> i64 {
        match self {
            Role::Student => 15,
            Role::Faculty | Role::Librarian => 30,
        }
    }

    /// 延滞日数から延滞料金を計算する純粋関数
    pub fn calculate_fine(&self, days_overdue: i64) -> Fine {
        match self {
            Role::Student if days_overdue > 0 => {
                Fine::new((days_overdue as u64).saturating_mul(STUDENT_FINE_PER_DAY))
            }
            Role::Student | Role::Faculty | Role::Librarian => Fine::ZERO,
        }
    }

    /// 現在のアカウント状態から貸出可否を判定する
    ///
    /// キャッシュせず、貸出のたびに評価する。
    pub fn can_borrow(&self, account: &Account, now: DateTime<Utc>) -> bool {
        match self {
            Role::Student => {
                account.loan_count() < STUDENT_MAX_LOANS && account.unpaid_fine().is_zero()
            }
            Role::Faculty => {
                account.loan_count() < FACULTY_MAX_LOANS
                    && account
                        .borrowed_books()
                        .iter()
                        .all(|r| r.elapsed_days(now) <= FACULTY_MAX_HELD_DAYS)
            }
            Role::Librarian => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "faculty" => Ok(Role::Faculty),
            "librarian" => Ok(Role::Librarian),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// 利用者 - 役割とアカウントを持つ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patron {
    pub id: PatronId,
    pub name: String,
    role: Role,
    account: Account,
}

impl Patron {
    pub fn new(id: PatronId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            account: Account::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn account_mut(&mut self) -> &mut Account {
        &mut self.account
    }

    pub fn can_borrow(&self, now: DateTime<Utc>) -> bool {
        self.role.can_borrow(&self.account, now)
    }

    pub fn calculate_fine(&self, days_overdue: i64) -> Fine {
        self.role.calculate_fine(days_overdue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BorrowRecord, Isbn};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn patron_with_loans(role: Role, ages_in_days: &[i64]) -> Patron {
        let mut patron = Patron::new(PatronId::new("P1"), "Patron", role);
        for (i, days) in ages_in_days.iter().enumerate() {
            patron.account_mut().add_borrow_record(BorrowRecord {
                isbn: Isbn::new(format!("ISBN{}", i)),
                borrowed_at: now() - Duration::days(*days),
            });
        }
        patron
    }

    // 学生ポリシー
    #[test]
    fn test_student_can_borrow_under_limit() {
        let patron = patron_with_loans(Role::Student, &[1, 2]);
        assert!(patron.can_borrow(now()));
    }

    #[test]
    fn test_student_cannot_borrow_at_limit() {
        let patron = patron_with_loans(Role::Student, &[1, 2, 3]);
        assert!(!patron.can_borrow(now()));
    }

    #[test]
    fn test_student_cannot_borrow_with_unpaid_fine() {
        let mut patron = patron_with_loans(Role::Student, &[]);
        patron.account_mut().set_unpaid_fine(Fine::new(10));
        assert!(!patron.can_borrow(now()));
    }

    #[test]
    fn test_student_fine_is_ten_per_day() {
        assert_eq!(Role::Student.calculate_fine(5), Fine::new(50));
        assert_eq!(Role::Student.calculate_fine(0), Fine::ZERO);
        assert_eq!(Role::Student.calculate_fine(-3), Fine::ZERO);
    }

    #[test]
    fn test_student_fine_is_monotonic() {
        let fines: Vec<Fine> = (-5..100).map(|d| Role::Student.calculate_fine(d)).collect();
        assert!(fines.windows(2).all(|w| w[0] <= w[1]));
    }

    // 教員ポリシー
    #[test]
    fn test_faculty_can_borrow_up_to_five() {
        assert!(patron_with_loans(Role::Faculty, &[1, 2, 3, 4]).can_borrow(now()));
        assert!(!patron_with_loans(Role::Faculty, &[1, 2, 3, 4, 5]).can_borrow(now()));
    }

    #[test]
    fn test_faculty_blocked_by_loan_older_than_ninety_days() {
        assert!(patron_with_loans(Role::Faculty, &[90]).can_borrow(now()));
        assert!(!patron_with_loans(Role::Faculty, &[91]).can_borrow(now()));
    }

    #[test]
    fn test_faculty_fine_ignores_unpaid_balance() {
        let mut patron = patron_with_loans(Role::Faculty, &[]);
        patron.account_mut().set_unpaid_fine(Fine::new(100));
        assert!(patron.can_borrow(now()));
    }

    #[test]
    fn test_faculty_and_librarian_fine_always_zero() {
        for days in [0, 1, 30, 365] {
            assert_eq!(Role::Faculty.calculate_fine(days), Fine::ZERO);
            assert_eq!(Role::Librarian.calculate_fine(days), Fine::ZERO);
        }
    }

    // 司書ポリシー
    #[test]
    fn test_librarian_never_borrows() {
        let patron = patron_with_loans(Role::Librarian, &[]);
        assert!(!patron.can_borrow(now()));
        assert!(!Role::Librarian.is_borrower());
    }

    #[test]
    fn test_max_loan_days() {
        assert_eq!(Role::Student.max_loan_days(), 15);
        assert_eq!(Role::Faculty.max_loan_days(), 30);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("faculty".parse::<Role>(), Ok(Role::Faculty));
        assert!("admin".parse::<Role>().is_err());
    }
}
