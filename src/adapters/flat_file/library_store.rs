use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::ports::library_store::{LibraryRecords, LibraryStore as LibraryStoreTrait, Result, StoredRecords};

use super::records::{self, RecordError, Row};

pub const BOOKS_FILE: &str = "books.csv";
pub const PATRONS_FILE: &str = "users.csv";
pub const LOANS_FILE: &str = "borrowings.csv";
pub const FINES_FILE: &str = "fines.csv";

/// Flat-file implementation of LibraryStore
///
/// Keeps four headerless comma-delimited files in one data directory.
/// Each file is loaded independently; a missing file is reported as `None`.
/// Saving rewrites every file in full.
pub struct LibraryStore {
    dir: PathBuf,
}

impl LibraryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read and parse one file, or `None` if it does not exist
    async fn load_file<T>(
        &self,
        file: &'static str,
        parse: fn(&Row) -> std::result::Result<T, RecordError>,
    ) -> Result<Option<Vec<T>>> {
        let data = match tokio::fs::read(self.dir.join(file)).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(file, "record file not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let parsed = records::read_rows(file, &data)?
            .iter()
            .map(parse)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Some(parsed))
    }

    /// Replace one file via a temporary sibling so a failed write keeps the old data
    async fn write_file(&self, file: &'static str, rows: Vec<Vec<String>>) -> Result<()> {
        let data = records::write_rows(rows)?;
        let path = self.dir.join(file);
        let tmp = self.dir.join(format!("{}.tmp", file));
        let written = match tokio::fs::write(&tmp, data).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                tracing::warn!(file, error = %cleanup, "failed to remove temporary file");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl LibraryStoreTrait for LibraryStore {
    async fn load(&self) -> Result<StoredRecords> {
        Ok(StoredRecords {
            books: self.load_file(BOOKS_FILE, records::parse_book).await?,
            patrons: self.load_file(PATRONS_FILE, records::parse_patron).await?,
            loans: self.load_file(LOANS_FILE, records::parse_loan).await?,
            fines: self.load_file(FINES_FILE, records::parse_fine).await?,
        })
    }

    async fn save(&self, library: &LibraryRecords) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        self.write_file(BOOKS_FILE, library.books.iter().map(records::format_book).collect())
            .await?;
        self.write_file(
            PATRONS_FILE,
            library.patrons.iter().map(records::format_patron).collect(),
        )
        .await?;
        self.write_file(LOANS_FILE, library.loans.iter().map(records::format_loan).collect())
            .await?;
        self.write_file(FINES_FILE, library.fines.iter().map(records::format_fine).collect())
            .await?;
        Ok(())
    }
}
