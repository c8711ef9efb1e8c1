//! Catalog seeding port definition.

use async_trait::async_trait;

use crate::domain::entities::Product;
use crate::domain::errors::SeedError;

/// Port for the product store that receives seed data.
#[async_trait]
pub trait CatalogSeedPort: Send + Sync {
    /// Inserts products whose ids are not present yet.
    /// Returns the number of inserted products.
    async fn insert_missing(&self, products: &[Product]) -> Result<usize, SeedError>;

    /// Number of products in the store.
    async fn count(&self) -> usize;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Store that rejects every write.
    pub struct FailingCatalog;

    #[async_trait]
    impl CatalogSeedPort for FailingCatalog {
        async fn insert_missing(&self, _products: &[Product]) -> Result<usize, SeedError> {
            Err(SeedError::store("permission denied"))
        }

        async fn count(&self) -> usize {
            0
        }
    }
}
