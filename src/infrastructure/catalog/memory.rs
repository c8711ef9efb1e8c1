//! In-memory product store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use crate::domain::entities::{Product, ProductId};
use crate::domain::errors::SeedError;
use crate::domain::ports::CatalogSeedPort;

/// Product store backed by a map keyed on product id.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryCatalog {
    #[must_use]
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up one product.
    pub async fn get(&self, id: ProductId) -> Option<Product> {
        self.products.read().await.get(&id).cloned()
    }

    /// All products ordered by id.
    pub async fn products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by_key(|p| p.id);
        products
    }
}

#[async_trait]
impl CatalogSeedPort for InMemoryCatalog {
    async fn insert_missing(&self, products: &[Product]) -> Result<usize, SeedError> {
        let mut store = self.products.write().await;
        let mut inserted = 0;
        for product in products {
            if store.contains_key(&product.id) {
                trace!(id = %product.id, "Product already present, skipping");
                continue;
            }
            store.insert(product.id, product.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn count(&self) -> usize {
        self.products.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_missing_skips_existing_ids() {
        let catalog = InMemoryCatalog::new();
        let first = vec![
            Product::new(1, "Rose", "roses/1.jpg"),
            Product::new(2, "Fern", "ferns/2.jpg"),
        ];
        assert_eq!(catalog.insert_missing(&first).await.unwrap(), 2);

        let second = vec![
            Product::new(2, "Renamed fern", "ferns/other.jpg"),
            Product::new(3, "Cactus", "cacti/3.jpg"),
        ];
        assert_eq!(catalog.insert_missing(&second).await.unwrap(), 1);
        assert_eq!(catalog.count().await, 3);
        assert_eq!(catalog.get(ProductId(2)).await.unwrap().name, "Fern");
    }

    #[tokio::test]
    async fn test_products_are_sorted_by_id() {
        let catalog = InMemoryCatalog::new();
        catalog
            .insert_missing(&[
                Product::new(9, "Palm", "palms/9.jpg"),
                Product::new(4, "Ivy", "ivy/4.jpg"),
            ])
            .await
            .unwrap();

        let ids: Vec<u64> = catalog.products().await.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![4, 9]);
    }
}
