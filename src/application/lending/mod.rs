mod errors;
mod lending_service;
mod registry_service;
mod startup;

pub use errors::{LendingApplicationError, Result};
pub use lending_service::{
    AccountView, FinePayment, PatronSummary, ServiceDependencies, borrow_book, find_book, login,
    pay_fine, reserve_book, return_book, search_books, view_account,
};
pub use registry_service::{
    PatronListing, add_book, add_patron, list_patrons, remove_book, remove_patron,
};
pub use startup::{SeedPolicy, build_library, library_records, load_library, save_library};
