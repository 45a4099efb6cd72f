//! Seed the catalog from a YAML file.
//!
//! ```bash
//! cc-cli seed crates/cli/catalog.sample.yaml
//! ```
//!
//! The file is parsed and validated before any database connection is made.
//! Products whose `friendly_link` already exists are skipped, so re-running
//! the same file is harmless.

use std::path::Path;

use tracing::{error, info};

use crypto_cart_storefront::db::{
    self,
    seed::{CatalogFile, seed_catalog, validate_catalog},
};

/// Seed wallets and products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file is missing, unparsable or invalid, or if
/// any database statement fails (in which case nothing is committed).
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(path).await?;
    let file: CatalogFile = serde_yaml::from_str(&content)?;
    info!(
        wallets = file.wallets.len(),
        products = file.products.len(),
        "Parsed catalog"
    );

    let errors = validate_catalog(&file);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let report = seed_catalog(&pool, &file).await?;

    info!("Seeding complete!");
    info!("  Wallets upserted: {}", report.wallets);
    info!("  Products inserted: {}", report.inserted);
    info!("  Products skipped (already exist): {}", report.skipped);

    Ok(())
}
