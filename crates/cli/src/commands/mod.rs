//! Command implementations.
//!
//! Every command opens the same [`Context`]: configuration, the file-backed
//! store, the restored session and cart, and a gateway wired to the session's
//! credential.

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod orders;

use std::sync::Arc;

use phoneplace_client::storage::{FileStore, SharedStore, StorageError};
use phoneplace_client::{ApiClient, CartStore, ClientConfig, SessionStore};
use phoneplace_core::Product;

/// State shared by all commands for one invocation.
pub struct Context {
    pub config: ClientConfig,
    pub api: ApiClient,
    pub storage: SharedStore,
    pub session: SessionStore,
    pub cart: CartStore,
}

impl Context {
    /// Load configuration and restore persisted state.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the state
    /// directory cannot be opened.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = ClientConfig::from_env()?;
        let storage: SharedStore = Arc::new(FileStore::open(&config.state_dir)?);

        let mut session = SessionStore::new(Arc::clone(&storage));
        session.restore();

        let mut cart = CartStore::new();
        cart.restore(storage.as_ref());

        let api = ApiClient::new(&config, session.credential_slot())?;
        tracing::debug!(api_url = %config.api_url, "Context ready");

        Ok(Self {
            config,
            api,
            storage,
            session,
            cart,
        })
    }

    /// Write the cart back to the state file.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub fn save_cart(&self) -> Result<(), StorageError> {
        self.cart.persist(self.storage.as_ref())
    }
}

/// One-line product summary used by listings.
pub fn product_line(product: &Product) -> String {
    let stock = if product.in_stock { "" } else { "  (out of stock)" };
    format!(
        "{:<26} {:<36} {:<12} {:>16}{stock}",
        product.id.as_str(),
        product.name,
        product.brand,
        product.price.display(),
    )
}
