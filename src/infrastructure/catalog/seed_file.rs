//! JSON seed file loading.

use std::path::Path;

use tracing::debug;

use crate::domain::entities::Product;
use crate::domain::errors::SeedError;

/// Reads an array of products from a JSON file.
///
/// # Errors
///
/// Returns `SeedError::Io` when the file cannot be read and
/// `SeedError::Parse` when it is not a product array.
pub async fn load_seed_file(path: &Path) -> Result<Vec<Product>, SeedError> {
    let content = tokio::fs::read_to_string(path).await?;
    let products: Vec<Product> = serde_json::from_str(&content)?;
    debug!(path = %path.display(), count = products.len(), "Loaded seed file");
    Ok(products)
}
