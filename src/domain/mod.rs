pub mod account;
pub mod book;
pub mod commands;
pub mod errors;
pub mod library;
pub mod patron;
pub mod value_objects;

pub use account::*;
pub use book::*;
pub use errors::*;
pub use library::*;
pub use patron::*;
pub use value_objects::*;
