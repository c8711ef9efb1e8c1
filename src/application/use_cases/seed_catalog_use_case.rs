//! Catalog seeding use case implementation.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::entities::Product;
use crate::domain::errors::SeedError;
use crate::domain::ports::CatalogSeedPort;
use crate::infrastructure::catalog::load_seed_file;

/// Outcome of a seeding run. A failed run carries the error text instead of
/// returning it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Products read from the seed source.
    pub loaded: usize,
    /// Products that were not present yet and got inserted.
    pub inserted: usize,
    /// Products in the store after the run.
    pub total: usize,
    /// Failure that stopped seeding, if any.
    pub error: Option<String>,
}

impl SeedReport {
    #[must_use]
    /// Returns true when seeding ran to completion.
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    #[must_use]
    /// Products that were already present.
    pub const fn skipped(&self) -> usize {
        self.loaded.saturating_sub(self.inserted)
    }
}

/// Loads seed products into the catalog without ever failing startup.
#[derive(Clone)]
pub struct SeedCatalogUseCase {
    catalog: Arc<dyn CatalogSeedPort>,
}

impl SeedCatalogUseCase {
    #[must_use]
    /// Creates the use case over a catalog store.
    pub fn new(catalog: Arc<dyn CatalogSeedPort>) -> Self {
        Self { catalog }
    }

    /// Seeds from a JSON file. Read and parse failures end up in the report.
    pub async fn execute_file(&self, path: &Path) -> SeedReport {
        debug!(path = %path.display(), "Seeding catalog from file");
        match load_seed_file(path).await {
            Ok(products) => self.execute(&products).await,
            Err(e) => self.failed(0, &e).await,
        }
    }

    /// Seeds the given products, skipping ids already in the store.
    pub async fn execute(&self, products: &[Product]) -> SeedReport {
        match self.catalog.insert_missing(products).await {
            Ok(inserted) => {
                let report = SeedReport {
                    loaded: products.len(),
                    inserted,
                    total: self.catalog.count().await,
                    error: None,
                };
                info!(
                    inserted = report.inserted,
                    skipped = report.skipped(),
                    total = report.total,
                    "Catalog seeded"
                );
                report
            }
            Err(e) => self.failed(products.len(), &e).await,
        }
    }

    async fn failed(&self, loaded: usize, error: &SeedError) -> SeedReport {
        warn!(error = %error, "Catalog seeding failed, continuing without seed data");
        SeedReport {
            loaded,
            inserted: 0,
            total: self.catalog.count().await,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::FailingCatalog;
    use crate::infrastructure::catalog::InMemoryCatalog;

    fn plants() -> Vec<Product> {
        vec![
            Product::new(1, "Rose", "roses/1.jpg"),
            Product::new(2, "Fern", "ferns/2.jpg"),
        ]
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let use_case = SeedCatalogUseCase::new(Arc::new(InMemoryCatalog::new()));

        let first = use_case.execute(&plants()).await;
        assert!(first.is_ok());
        assert_eq!(first.inserted, 2);

        let second = use_case.execute(&plants()).await;
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped(), 2);
        assert_eq!(second.total, 2);
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let use_case = SeedCatalogUseCase::new(Arc::new(FailingCatalog));

        let report = use_case.execute(&plants()).await;
        assert!(!report.is_ok());
        assert_eq!(report.loaded, 2);
        assert_eq!(report.inserted, 0);
        assert!(report.error.unwrap().contains("permission denied"));
    }

    #[tokio::test]
    async fn test_missing_seed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let use_case = SeedCatalogUseCase::new(Arc::new(InMemoryCatalog::new()));

        let report = use_case.execute_file(&dir.path().join("seed.json")).await;
        assert!(!report.is_ok());
        assert_eq!(report.total, 0);
    }

    #[tokio::test]
    async fn test_seed_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, serde_json::to_string(&plants()).unwrap()).unwrap();
        let use_case = SeedCatalogUseCase::new(Arc::new(InMemoryCatalog::new()));

        let report = use_case.execute_file(&path).await;
        assert_eq!(report.inserted, 2);
        assert_eq!(report.total, 2);
    }
}
