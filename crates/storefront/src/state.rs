//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::CatalogStore;
use crate::services::{CheckoutNotifier, Mailer};

/// Application state shared across all handlers.
///
/// Cheaply cloneable; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Arc<dyn CatalogStore>,
    notifier: CheckoutNotifier,
}

impl AppState {
    /// Wire the catalog and mailer into a new state.
    ///
    /// The checkout notifier takes its shop name, fallback wallet address
    /// and BCC address from `config`.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        catalog: Arc<dyn CatalogStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let notifier = CheckoutNotifier::new(
            mailer,
            config.store_name.clone(),
            config.legacy_wallet_address.clone(),
            config.order_bcc.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                notifier,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Products and wallets.
    #[must_use]
    pub fn catalog(&self) -> &dyn CatalogStore {
        self.inner.catalog.as_ref()
    }

    #[must_use]
    pub fn notifier(&self) -> &CheckoutNotifier {
        &self.inner.notifier
    }
}
