//! HTTP gateway to the catalog, auth and order endpoints.
//!
//! # Architecture
//!
//! - One [`ApiClient`] per process, cheap to clone (`Arc` inside)
//! - Reads the bearer credential from the session's [`CredentialSlot`] on
//!   every request; anonymous requests go out without `Authorization`
//! - Response bodies are decoded into core types and otherwise passed through
//! - Non-2xx responses become typed [`ApiError`]s; nothing is retried
//! - Single-resource reads (product detail, filter options) are cached via
//!   `moka`; product lists are never cached
//!
//! # Example
//!
//! ```rust,ignore
//! use phoneplace_client::api::ApiClient;
//!
//! let api = ApiClient::new(&config, session.credential_slot())?;
//! let phones = api
//!     .list_products(&ProductFilter::new().with(FilterKey::Category, "Phone"))
//!     .await?;
//! ```

mod cache;
pub mod types;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use phoneplace_core::{
    Email, FilterError, FilterOptions, Order, Product, ProductFilter, ProductId,
};

use crate::config::ClientConfig;
use crate::session::CredentialSlot;

use cache::{CacheKey, CacheValue};
pub use types::{AuthGrant, HealthStatus, LoginRequest, NewOrder, ProductDraft, SignupRequest};
use types::{AuthResponse, OrderResponse, ProductEnvelope};

/// How much of an error body is kept in messages and logs.
const MAX_ERROR_BODY: usize = 200;

/// Errors that can occur when talking to the catalog service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or rejected credential (401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The requested resource does not exist (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server rejected the request as invalid (other 4xx).
    #[error("Request rejected ({status}): {message}")]
    Client { status: u16, message: String },

    /// The server failed or is unavailable (5xx).
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The request never completed (unreachable, timeout, connection reset).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Filters failed validation; nothing was sent.
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    /// The configured base URL cannot carry a path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Classify a non-success status and its body.
    fn from_status(status: StatusCode, body: &str) -> Self {
        let message = error_message(status, body);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            s if s.is_client_error() => Self::Client {
                status: s.as_u16(),
                message,
            },
            s => Self::Server {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// Validation-class failures: the request itself was wrong.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Client { .. }
                | Self::NotFound(_)
                | Self::Unauthorized(_)
                | Self::InvalidFilter(_)
                | Self::InvalidUrl(_)
        )
    }

    /// Server-class failures: the service is down, broken or unreachable.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Server { .. } | Self::Transport(_))
    }

    /// Whether the credential was missing or rejected.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// HTTP status, when the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED.as_u16()),
            Self::NotFound(_) => Some(StatusCode::NOT_FOUND.as_u16()),
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::InvalidFilter(_) | Self::InvalidUrl(_) => None,
        }
    }
}

/// Pull `message` / `error` / `detail` out of a JSON error body, falling back
/// to a truncated raw body or the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(serde_json::Value::String(text)) = map.get(key)
                && !text.is_empty()
            {
                return text.clone();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no details")
            .to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_BODY).collect()
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the catalog service REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    credential: CredentialSlot,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("credential", &self.inner.credential)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `config.api_url` that authorizes requests with
    /// whatever credential `credential` holds at send time.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry paths or the HTTP client
    /// fails to build.
    pub fn new(config: &ClientConfig, credential: CredentialSlot) -> Result<Self, ApiError> {
        if config.api_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.api_url.to_string()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http: builder.build()?,
                base_url: config.api_url.clone(),
                credential,
                cache,
            }),
        })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // -------------------------------------------------------------------------
    // Plumbing
    // -------------------------------------------------------------------------

    /// Append path segments (percent-encoded) to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request, attaching the bearer credential when one is present.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.http.request(method, url);
        match self.inner.credential.current() {
            Some(credential) => builder.bearer_auth(credential.expose_secret()),
            None => builder,
        }
    }

    /// Send and return the raw body of a successful response.
    async fn send_text(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = ApiError::from_status(status, &body);
            if err.is_server_error() {
                warn!(
                    status = %status,
                    body = %body.chars().take(MAX_ERROR_BODY).collect::<String>(),
                    "Catalog service returned server error"
                );
            } else {
                debug!(status = %status, error = %err, "Catalog service rejected request");
            }
            return Err(err);
        }

        Ok(body)
    }

    /// Send and decode a JSON response.
    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send_text(builder).await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(
                error = %e,
                body = %body.chars().take(MAX_ERROR_BODY).collect::<String>(),
                "Failed to decode catalog service response"
            );
            ApiError::Decode(e)
        })
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    /// `GET /products` with validated filters.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidFilter`] without sending anything if the
    /// filters are malformed, otherwise any transport or status error.
    #[instrument(skip(self), fields(filters = filter.active_count()))]
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        filter.validate()?;
        let url = self.endpoint(&["products"])?;
        let products: Vec<Product> = self
            .send_json(self.request(Method::GET, url).query(&filter.to_query_pairs()))
            .await?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    /// `GET /products/{id}`, cached.
    ///
    /// A cached product may be up to one cache TTL old, stock flag included.
    /// Use [`Self::fetch_product`] before adding to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        if let Some(CacheValue::Product(product)) =
            self.inner.cache.get(&CacheKey::Product(id.clone())).await
        {
            debug!("Cache hit");
            return Ok(*product);
        }
        self.fetch_product(id).await
    }

    /// `GET /products/{id}`, bypassing the cache and refreshing it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist; the
    /// stale cache entry is dropped in that case.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn fetch_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.clone());
        let url = self.endpoint(&["products", id.as_str()])?;
        let product: Product = match self.send_json(self.request(Method::GET, url)).await {
            Ok(product) => product,
            Err(e) => {
                if matches!(e, ApiError::NotFound(_)) {
                    self.inner.cache.invalidate(&key).await;
                }
                return Err(e);
            }
        };
        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// `GET /filter-options`, cached.
    ///
    /// # Errors
    ///
    /// Returns any transport or status error.
    #[instrument(skip(self))]
    pub async fn filter_options(&self) -> Result<FilterOptions, ApiError> {
        if let Some(CacheValue::FilterOptions(options)) =
            self.inner.cache.get(&CacheKey::FilterOptions).await
        {
            return Ok(*options);
        }

        let url = self.endpoint(&["filter-options"])?;
        let options: FilterOptions = self.send_json(self.request(Method::GET, url)).await?;
        self.inner
            .cache
            .insert(
                CacheKey::FilterOptions,
                CacheValue::FilterOptions(Box::new(options.clone())),
            )
            .await;
        Ok(options)
    }

    /// `POST /products`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the credential lacks admin rights.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        let url = self.endpoint(&["products"])?;
        let envelope: ProductEnvelope = self
            .send_json(self.request(Method::POST, url).json(draft))
            .await?;
        self.inner.cache.invalidate(&CacheKey::FilterOptions).await;
        Ok(envelope.product)
    }

    /// `PUT /products/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist.
    #[instrument(skip(self, draft), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        let result: Result<ProductEnvelope, ApiError> = self
            .send_json(self.request(Method::PUT, url).json(draft))
            .await;
        self.forget_product(id).await;
        Ok(result?.product)
    }

    /// `DELETE /products/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        let result = self.send_text(self.request(Method::DELETE, url)).await;
        self.forget_product(id).await;
        result.map(|_| ())
    }

    async fn forget_product(&self, id: &ProductId) {
        self.inner
            .cache
            .invalidate(&CacheKey::Product(id.clone()))
            .await;
        self.inner.cache.invalidate(&CacheKey::FilterOptions).await;
    }

    // -------------------------------------------------------------------------
    // Auth
    // -------------------------------------------------------------------------

    /// `POST /auth/login`; returns the credential and identity.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for rejected credentials.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthGrant, ApiError> {
        let url = self.endpoint(&["auth", "login"])?;
        let response: AuthResponse = self
            .send_json(self.request(Method::POST, url).json(request))
            .await?;
        Ok(response.into())
    }

    /// `POST /auth/signup`; returns the credential and identity.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] (usually 400 or 409) if the account
    /// cannot be created.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthGrant, ApiError> {
        let url = self.endpoint(&["auth", "signup"])?;
        let response: AuthResponse = self
            .send_json(self.request(Method::POST, url).json(request))
            .await?;
        Ok(response.into())
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    /// `POST /orders`.
    ///
    /// # Errors
    ///
    /// Returns any transport or status error.
    #[instrument(skip(self, order), fields(lines = order.items.len(), total = %order.total))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders"])?;
        let response: OrderResponse = self
            .send_json(self.request(Method::POST, url).json(order))
            .await?;
        Ok(response.into())
    }

    /// `GET /orders/user?email=`.
    ///
    /// # Errors
    ///
    /// Returns any transport or status error.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn orders_for(&self, email: &Email) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint(&["orders", "user"])?;
        self.send_json(
            self.request(Method::GET, url)
                .query(&[("email", email.as_str())]),
        )
        .await
    }

    // -------------------------------------------------------------------------
    // Health
    // -------------------------------------------------------------------------

    /// `GET /health`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Server`] when the service reports itself unhealthy.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = self.endpoint(&["health"])?;
        self.send_json(self.request(Method::GET, url)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(api_url: &str) -> ClientConfig {
        ClientConfig {
            api_url: Url::parse(api_url).unwrap(),
            state_dir: std::env::temp_dir(),
            demo_accounts: false,
            request_timeout: Some(Duration::from_secs(5)),
            cache_ttl: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, ""),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, r#"{"error":"Product not found"}"#),
            ApiError::NotFound(msg) if msg == "Product not found"
        ));

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"message":"bad image"}"#);
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "Request rejected (400): bad image");

        let err = ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(err.is_server_error());
        assert_eq!(err.to_string(), "Server error (503): Service Unavailable");
    }

    #[test]
    fn test_error_message_truncates_raw_body() {
        let body = "x".repeat(1000);
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, &body).len(),
            MAX_ERROR_BODY
        );
    }

    #[test]
    fn test_endpoint_joins_and_encodes() {
        let api = ApiClient::new(&config("http://localhost:8000/api/"), CredentialSlot::new())
            .unwrap();
        assert_eq!(
            api.endpoint(&["products", "a b/c"]).unwrap().as_str(),
            "http://localhost:8000/api/products/a%20b%2Fc"
        );

        let api =
            ApiClient::new(&config("http://localhost:8000/api"), CredentialSlot::new()).unwrap();
        assert_eq!(
            api.endpoint(&["orders", "user"]).unwrap().as_str(),
            "http://localhost:8000/api/orders/user"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(matches!(
            ApiClient::new(&config("mailto:shop@example.com"), CredentialSlot::new()),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_filter_is_not_sent() {
        // Nothing listens on this port; reaching the network would be a transport error.
        let api = ApiClient::new(&config("http://127.0.0.1:9/api"), CredentialSlot::new()).unwrap();
        let filter = ProductFilter::new().with(phoneplace_core::FilterKey::InStock, "maybe");
        assert!(matches!(
            api.list_products(&filter).await,
            Err(ApiError::InvalidFilter(_))
        ));
    }
}
