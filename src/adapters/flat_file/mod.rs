pub mod library_store;
pub mod records;

pub use library_store::LibraryStore as FlatFileLibraryStore;
pub use records::RecordError;
