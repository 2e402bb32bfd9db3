use chrono::DateTime;
use csv::StringRecord;
use thiserror::Error;

use crate::domain::{Book, BookStatus, Fine, Isbn, PatronId, Role};
use crate::ports::{FineRecord, LoanRecord, PatronRecord};

/// Error raised when a persisted record cannot be read back.
///
/// Carries the file name and line so a broken data directory can be fixed by hand.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{file}:{line}: expected {expected} fields, found {found}")]
    FieldCount {
        file: &'static str,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("{file}:{line}: invalid {field} `{value}`")]
    InvalidField {
        file: &'static str,
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("{file}:{line}: book {isbn} has status `{status}` {problem}")]
    InconsistentReservation {
        file: &'static str,
        line: u64,
        isbn: String,
        status: BookStatus,
        problem: &'static str,
    },

    #[error("{file}: malformed CSV")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },
}

/// A parsed row together with its 1-based line number.
pub(super) struct Row {
    file: &'static str,
    line: u64,
    record: StringRecord,
}

impl Row {
    fn expect_len(&self, expected: usize) -> Result<(), RecordError> {
        if self.record.len() != expected {
            return Err(RecordError::FieldCount {
                file: self.file,
                line: self.line,
                expected,
                found: self.record.len(),
            });
        }
        Ok(())
    }

    fn field(&self, index: usize) -> &str {
        self.record.get(index).unwrap_or("")
    }

    fn parse<T: std::str::FromStr>(&self, index: usize, name: &'static str) -> Result<T, RecordError> {
        let value = self.field(index);
        value.parse().map_err(|_| self.invalid(name, value))
    }

    fn invalid(&self, field: &'static str, value: &str) -> RecordError {
        RecordError::InvalidField {
            file: self.file,
            line: self.line,
            field,
            value: value.to_string(),
        }
    }
}

/// Splits headerless comma-delimited data into rows.
pub(super) fn read_rows(file: &'static str, data: &[u8]) -> Result<Vec<Row>, RecordError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| RecordError::Csv { file, source })?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        rows.push(Row { file, line, record });
    }
    Ok(rows)
}

/// Writes rows as headerless comma-delimited data.
pub(super) fn write_rows<I>(rows: I) -> std::io::Result<Vec<u8>>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.into_inner().map_err(|e| e.into_error())
}

// ============================================================================
// books: isbn,title,author,publisher,year,status,reservedBy
// ============================================================================

pub(super) fn parse_book(row: &Row) -> Result<Book, RecordError> {
    // Older files may omit the trailing empty reservedBy field entirely.
    if row.record.len() != 6 {
        row.expect_len(7)?;
    }

    let year: i32 = row.parse(4, "year")?;
    let status: BookStatus = row.parse(5, "status")?;
    let reserved_by = Some(row.field(6))
        .filter(|s| !s.is_empty())
        .map(PatronId::new);

    // Available は予約者を持たず、Reserved は必ず予約者を持つ
    let problem = match (status, &reserved_by) {
        (BookStatus::Available, Some(_)) => Some("but names a reserver"),
        (BookStatus::Reserved, None) => Some("but names no reserver"),
        _ => None,
    };
    if let Some(problem) = problem {
        return Err(RecordError::InconsistentReservation {
            file: row.file,
            line: row.line,
            isbn: row.field(0).to_string(),
            status,
            problem,
        });
    }

    let mut book = Book::new(
        Isbn::new(row.field(0)),
        row.field(1),
        row.field(2),
        row.field(3),
        year,
    );
    book.set_status(status);
    book.set_reserved_by(reserved_by);
    Ok(book)
}

pub(super) fn format_book(book: &Book) -> Vec<String> {
    vec![
        book.isbn.to_string(),
        book.title.clone(),
        book.author.clone(),
        book.publisher.clone(),
        book.year.to_string(),
        book.status().as_str().to_string(),
        book.reserved_by().map(|p| p.to_string()).unwrap_or_default(),
    ]
}

// ============================================================================
// users: id,name,role
// ============================================================================

pub(super) fn parse_patron(row: &Row) -> Result<PatronRecord, RecordError> {
    row.expect_len(3)?;
    let role: Role = row.parse(2, "role")?;
    Ok(PatronRecord {
        id: PatronId::new(row.field(0)),
        name: row.field(1).to_string(),
        role,
    })
}

pub(super) fn format_patron(patron: &PatronRecord) -> Vec<String> {
    vec![
        patron.id.to_string(),
        patron.name.clone(),
        patron.role.as_str().to_string(),
    ]
}

// ============================================================================
// borrowings: patronId,isbn,epochSeconds
// ============================================================================

pub(super) fn parse_loan(row: &Row) -> Result<LoanRecord, RecordError> {
    row.expect_len(3)?;
    let seconds: i64 = row.parse(2, "timestamp")?;
    let borrowed_at =
        DateTime::from_timestamp(seconds, 0).ok_or_else(|| row.invalid("timestamp", row.field(2)))?;
    Ok(LoanRecord {
        patron_id: PatronId::new(row.field(0)),
        isbn: Isbn::new(row.field(1)),
        borrowed_at,
    })
}

pub(super) fn format_loan(loan: &LoanRecord) -> Vec<String> {
    vec![
        loan.patron_id.to_string(),
        loan.isbn.to_string(),
        loan.borrowed_at.timestamp().to_string(),
    ]
}

// ============================================================================
// fines: patronId,amount
// ============================================================================

pub(super) fn parse_fine(row: &Row) -> Result<FineRecord, RecordError> {
    row.expect_len(2)?;
    let amount: u64 = row.parse(1, "fine amount")?;
    Ok(FineRecord {
        patron_id: PatronId::new(row.field(0)),
        amount: Fine::new(amount),
    })
}

pub(super) fn format_fine(fine: &FineRecord) -> Vec<String> {
    vec![fine.patron_id.to_string(), fine.amount.to_string()]
}
