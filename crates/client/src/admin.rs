//! Admin catalog management.
//!
//! Every operation checks the session role first and refuses non-admins
//! without touching the network. The catalog service enforces the same rule
//! on its side.

use thiserror::Error;
use tracing::info;

use phoneplace_core::{Product, ProductId};

use crate::api::{ApiClient, ApiError, ProductDraft};
use crate::session::SessionStore;
use crate::validation::{self, ValidationError};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("admin access required")]
    Forbidden,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("catalog service error: {0}")]
    Api(#[from] ApiError),
}

impl ProductDraft {
    /// Normalized copy of the draft: text trimmed, blank image entries
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field: name, brand and description are
    /// required, at least one image is required and the price must be
    /// positive.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        let name = validation::required("Name", &self.name)?;
        let brand = validation::required("Brand", &self.brand)?;
        if self.price.is_zero() {
            return Err(ValidationError::InvalidPrice);
        }
        let description = validation::required("Description", &self.description)?;

        let images: Vec<String> = self
            .images
            .iter()
            .map(|image| image.trim())
            .filter(|image| !image.is_empty())
            .map(str::to_string)
            .collect();
        if images.is_empty() {
            return Err(ValidationError::NoImages);
        }

        Ok(Self {
            name,
            brand,
            category: self.category,
            price: self.price,
            description,
            images,
            specs: self.specs.clone(),
            in_stock: self.in_stock,
        })
    }
}

/// Create, update and delete catalog products.
#[derive(Debug, Clone)]
pub struct AdminCatalog {
    api: ApiClient,
}

impl AdminCatalog {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` or `AdminError::Validation` before any
    /// request, or the catalog service failure.
    pub async fn create(
        &self,
        session: &SessionStore,
        draft: &ProductDraft,
    ) -> Result<Product, AdminError> {
        require_admin(session)?;
        let draft = draft.validate()?;
        let product = self.api.create_product(&draft).await?;
        info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` or `AdminError::Validation` before any
    /// request, or the catalog service failure.
    pub async fn update(
        &self,
        session: &SessionStore,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, AdminError> {
        require_admin(session)?;
        let draft = draft.validate()?;
        let product = self.api.update_product(id, &draft).await?;
        info!(product_id = %id, "Product updated");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` before any request, or the catalog
    /// service failure.
    pub async fn delete(&self, session: &SessionStore, id: &ProductId) -> Result<(), AdminError> {
        require_admin(session)?;
        self.api.delete_product(id).await?;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

fn require_admin(session: &SessionStore) -> Result<(), AdminError> {
    if session.is_admin() {
        Ok(())
    } else {
        Err(AdminError::Forbidden)
    }
}
