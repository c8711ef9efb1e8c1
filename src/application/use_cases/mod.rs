//! Use case implementations.

mod seed_catalog_use_case;

pub use seed_catalog_use_case::{SeedCatalogUseCase, SeedReport};
