//! Catalog product entity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// Catalog identifier of a product.
pub struct ProductId(pub u64);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProductId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A plant listed in the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog id.
    pub id: ProductId,
    /// Display name, also the default alt text of its image.
    pub name: String,
    /// Logical image path handed to the image pipeline.
    pub image: String,
    #[serde(default)]
    /// Price in cents.
    pub price_cents: u64,
    #[serde(default)]
    /// Category slug.
    pub category: Option<String>,
}

impl Product {
    #[must_use]
    /// Creates an uncategorized product priced at zero.
    pub fn new(id: u64, name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: ProductId(id),
            name: name.into(),
            image: image.into(),
            price_cents: 0,
            category: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"id": 7, "name": "Monstera", "image": "tropical/monstera.jpg"}"#;
        let product: Product = serde_json::from_str(json).unwrap();

        assert_eq!(product.id, ProductId(7));
        assert_eq!(product.price_cents, 0);
        assert!(product.category.is_none());
    }
}
