//! Product catalog adapters.

mod memory;
mod seed_file;

pub use memory::InMemoryCatalog;
pub use seed_file::load_seed_file;
