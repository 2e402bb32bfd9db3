pub mod flat_file;
pub mod mock;
pub mod system;
