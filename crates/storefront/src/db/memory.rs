//! In-memory catalog for tests and local demos.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crypto_cart_core::{Product, ProductId, Wallet};

use super::{CatalogStore, RepositoryError};

/// A fixed catalog held in memory.
///
/// Can be switched offline to simulate a database outage.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: Vec<Product>,
    wallets: Vec<Wallet>,
    offline: AtomicBool,
}

impl MemoryCatalog {
    #[must_use]
    pub const fn new(products: Vec<Product>, wallets: Vec<Wallet>) -> Self {
        Self {
            products,
            wallets,
            offline: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail with [`RepositoryError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "memory catalog is offline".to_owned(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        self.check()?;
        Ok(self.products.clone())
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.check()?;
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    async fn product_by_link(
        &self,
        friendly_link: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        self.check()?;
        Ok(self
            .products
            .iter()
            .find(|p| p.friendly_link == friendly_link)
            .cloned())
    }

    async fn wallets(&self) -> Result<Vec<Wallet>, RepositoryError> {
        self.check()?;
        Ok(self.wallets.clone())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check()
    }
}
