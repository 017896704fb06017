//! Request and response bodies of the catalog service.
//!
//! Domain types (products, orders, filter options) live in `phoneplace-core`;
//! this module only holds the envelopes and payloads specific to endpoints.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use phoneplace_core::{
    Category, Email, Identity, Order, OrderLine, Price, Product, ProductSpecs, ShippingDetails,
};

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: Email,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of `POST /auth/signup`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .finish_non_exhaustive()
    }
}

/// Successful login or signup response.
#[derive(Deserialize)]
pub(crate) struct AuthResponse {
    pub token: String,
    pub user: Identity,
}

/// A credential and the identity it was issued for.
pub struct AuthGrant {
    pub credential: SecretString,
    pub identity: Identity,
}

impl std::fmt::Debug for AuthGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGrant")
            .field("credential", &"[REDACTED]")
            .field("identity", &self.identity)
            .finish()
    }
}

impl From<AuthResponse> for AuthGrant {
    fn from(response: AuthResponse) -> Self {
        Self {
            credential: response.token.into(),
            identity: response.user,
        }
    }
}

/// Product payload for admin create/update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDraft {
    pub name: String,
    pub brand: String,
    pub category: Category,
    /// Unit price in minor units.
    pub price: Price,
    pub description: String,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specs: Option<ProductSpecs>,
    pub in_stock: bool,
}

impl ProductDraft {
    /// Pre-fill a draft from an existing product (edit form).
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            brand: product.brand.clone(),
            category: product.category,
            price: product.price,
            description: product.description.clone(),
            images: product.images.clone(),
            specs: product.specs.clone(),
            in_stock: product.in_stock,
        }
    }
}

/// `{ message, product }` envelope returned by create and update.
#[derive(Deserialize)]
pub(crate) struct ProductEnvelope {
    pub product: Product,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub items: Vec<OrderLine>,
    pub shipping_details: ShippingDetails,
    pub user_email: Email,
    pub total: Price,
}

/// `POST /orders` answers either with the order or with `{ message, order }`.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum OrderResponse {
    Envelope { order: Order },
    Bare(Order),
}

impl From<OrderResponse> for Order {
    fn from(response: OrderResponse) -> Self {
        match response {
            OrderResponse::Envelope { order } | OrderResponse::Bare(order) => order,
        }
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl HealthStatus {
    /// Whether the service reports itself healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
