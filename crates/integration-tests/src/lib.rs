//! Integration tests for the PhonePlace storefront client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p phoneplace-integration-tests
//! ```
//!
//! No external services are needed: every test starts a [`FakeCatalog`] on
//! `127.0.0.1:0`, an in-process stand-in for the catalog service that
//! implements the endpoints the client uses and records what it receives.
//!
//! # Test Categories
//!
//! - `gateway` - Bearer header, error classification, caching
//! - `catalog` - Latest-wins product searches
//! - `auth` - Remote login/signup and the demo account fallback
//! - `checkout` - Cart clearing on success and failure
//! - `admin` - Role checks and catalog mutation
//! - `persistence` - Session and cart surviving a restart

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

use phoneplace_client::ClientConfig;
use phoneplace_client::api::ApiClient;
use phoneplace_client::session::CredentialSlot;

/// Credential the fake service accepts for admin mutations.
pub const ADMIN_TOKEN: &str = "server-admin-token";
/// Credential the fake service issues to regular accounts.
pub const USER_TOKEN: &str = "server-user-token";

/// Everything the fake service knows and has seen.
#[derive(Debug, Default)]
pub struct FakeState {
    pub products: Vec<Value>,
    pub orders: Vec<Value>,
    pub filter_options: Value,
    /// email -> (password, user JSON)
    pub accounts: HashMap<String, (String, Value)>,
    /// When set, auth endpoints answer with this status.
    pub auth_status: Option<StatusCode>,
    /// When set, `POST /orders` answers with this status.
    pub order_status: Option<StatusCode>,
    /// Artificial latency for `GET /products?brand=<key>`.
    pub brand_delays: HashMap<String, Duration>,
    /// `Authorization` header of every request, in arrival order.
    pub authorization: Vec<Option<String>>,
    /// Number of `GET /products/{id}` requests served.
    pub product_reads: usize,
    /// Query strings of `GET /products`, in arrival order.
    pub searches: Vec<String>,
}

type Shared = Arc<Mutex<FakeState>>;

/// A running fake catalog service.
pub struct FakeCatalog {
    pub base_url: Url,
    state: Shared,
}

impl FakeCatalog {
    /// Start the service with a small seeded catalog.
    pub async fn start() -> Self {
        let mut state = FakeState {
            products: vec![
                product_json("p-phone", "Galaxy A55", "Samsung", "Phone", 4_599_900, true),
                product_json("p-iphone", "iPhone 15", "Apple", "Phone", 11_999_900, true),
                product_json("p-case", "Clear Case", "Spigen", "Accessory", 150_000, true),
                product_json("p-gone", "Nokia 3310", "Nokia", "Phone", 500_000, false),
            ],
            filter_options: json!({
                "brands": ["Apple", "Nokia", "Samsung", "Spigen"],
                "price_tiers": ["budget", "flagship"],
                "price_range": { "min": 150_000, "max": 11_999_900 }
            }),
            ..FakeState::default()
        };
        state.accounts.insert(
            "jane@example.com".to_string(),
            (
                "hunter22".to_string(),
                json!({
                    "id": "u-jane",
                    "email": "jane@example.com",
                    "firstName": "Jane",
                    "lastName": "Doe",
                    "role": "user"
                }),
            ),
        );
        state.accounts.insert(
            "boss@phoneplace.com".to_string(),
            (
                "letmein1".to_string(),
                json!({
                    "id": "u-boss",
                    "email": "boss@phoneplace.com",
                    "firstName": "Boss",
                    "lastName": "Person",
                    "role": "admin"
                }),
            ),
        );

        let state: Shared = Arc::new(Mutex::new(state));
        let api = Router::new()
            .route("/health", get(health))
            .route("/products", get(list_products).post(create_product))
            .route(
                "/products/{id}",
                get(get_product).put(update_product).delete(delete_product),
            )
            .route("/filter-options", get(filter_options))
            .route("/auth/login", axum::routing::post(login))
            .route("/auth/signup", axum::routing::post(signup))
            .route("/orders", axum::routing::post(create_order))
            .route("/orders/user", get(orders_for_user));
        let app = Router::new()
            .nest("/api", api)
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}/api")).unwrap(),
            state,
        }
    }

    /// Lock the service state to seed it or inspect what it received.
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Client configuration pointing at this service.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.base_url.clone(),
            state_dir: scratch_dir(),
            demo_accounts: true,
            request_timeout: Some(Duration::from_secs(10)),
            cache_ttl: Duration::from_secs(60),
        }
    }

    /// A gateway reading its credential from `slot`.
    #[must_use]
    pub fn api(&self, slot: CredentialSlot) -> ApiClient {
        ApiClient::new(&self.config(), slot).unwrap()
    }
}

/// A fresh, unique directory under the system temp dir.
#[must_use]
pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("phoneplace-it-{}", uuid::Uuid::new_v4()))
}

/// Catalog product in the service's wire format.
#[must_use]
pub fn product_json(
    id: &str,
    name: &str,
    brand: &str,
    category: &str,
    price: u64,
    in_stock: bool,
) -> Value {
    json!({
        "_id": id,
        "name": name,
        "brand": brand,
        "category": category,
        "price": price,
        "description": format!("{brand} {name}"),
        "images": [format!("https://img.example.com/{id}.jpg")],
        "in_stock": in_stock,
        "created_at": "2025-03-01T10:00:00"
    })
}

// =============================================================================
// Handlers
// =============================================================================

fn record(state: &Shared, headers: &HeaderMap) {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.lock().unwrap().authorization.push(auth);
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn require_admin(headers: &HeaderMap) -> Result<(), Response> {
    match bearer(headers) {
        Some(ADMIN_TOKEN) => Ok(()),
        Some(_) => Err(error(StatusCode::FORBIDDEN, "Admin access required")),
        None => Err(error(StatusCode::UNAUTHORIZED, "Authentication required")),
    }
}

async fn health(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&state, &headers);
    Json(json!({ "status": "healthy", "database": "connected" }))
}

async fn list_products(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    record(&state, &headers);
    let brand = query.get("brand").cloned();
    let delay = {
        let mut guard = state.lock().unwrap();
        let mut pairs: Vec<_> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        pairs.sort();
        guard.searches.push(pairs.join("&"));
        brand
            .as_ref()
            .and_then(|b| guard.brand_delays.get(b).copied())
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let guard = state.lock().unwrap();
    let products: Vec<Value> = guard
        .products
        .iter()
        .filter(|p| brand.as_deref().is_none_or(|b| p["brand"] == b))
        .filter(|p| {
            query
                .get("category")
                .is_none_or(|c| p["category"] == c.as_str())
        })
        .filter(|p| query.get("in_stock").is_none_or(|_| p["in_stock"] == true))
        .cloned()
        .collect();
    Json(Value::Array(products))
}

async fn get_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    record(&state, &headers);
    let mut guard = state.lock().unwrap();
    guard.product_reads += 1;
    guard
        .products
        .iter()
        .find(|p| p["_id"] == id.as_str())
        .cloned()
        .map_or_else(
            || error(StatusCode::NOT_FOUND, "Product not found"),
            |p| Json(p).into_response(),
        )
}

async fn filter_options(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&state, &headers);
    Json(state.lock().unwrap().filter_options.clone())
}

async fn create_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    record(&state, &headers);
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    body["_id"] = json!(format!("p-{}", uuid::Uuid::new_v4()));
    state.lock().unwrap().products.push(body.clone());
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Product created successfully", "product": body })),
    )
        .into_response()
}

async fn update_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    record(&state, &headers);
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    let mut guard = state.lock().unwrap();
    let Some(existing) = guard.products.iter_mut().find(|p| p["_id"] == id.as_str()) else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    body["_id"] = json!(id);
    *existing = body.clone();
    Json(json!({ "message": "Product updated successfully", "product": body })).into_response()
}

async fn delete_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    record(&state, &headers);
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    let mut guard = state.lock().unwrap();
    let before = guard.products.len();
    guard.products.retain(|p| p["_id"] != id.as_str());
    if guard.products.len() == before {
        return error(StatusCode::NOT_FOUND, "Product not found");
    }
    Json(json!({ "message": "Product deleted successfully" })).into_response()
}

async fn login(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, &headers);
    let guard = state.lock().unwrap();
    if let Some(status) = guard.auth_status {
        return error(status, "Auth service unavailable");
    }
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match guard.accounts.get(email) {
        Some((expected, user)) if expected == password => {
            let token = if user["role"] == "admin" {
                ADMIN_TOKEN
            } else {
                USER_TOKEN
            };
            Json(json!({ "token": token, "user": user })).into_response()
        }
        _ => error(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn signup(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, &headers);
    let mut guard = state.lock().unwrap();
    if let Some(status) = guard.auth_status {
        return error(status, "Auth service unavailable");
    }
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if guard.accounts.contains_key(&email) {
        return error(StatusCode::CONFLICT, "User already exists");
    }
    let user = json!({
        "id": format!("u-{}", uuid::Uuid::new_v4()),
        "email": email,
        "firstName": body["firstName"],
        "lastName": body["lastName"],
        "role": "user"
    });
    let password = body["password"].as_str().unwrap_or_default().to_string();
    guard.accounts.insert(email, (password, user.clone()));
    (
        StatusCode::CREATED,
        Json(json!({ "token": USER_TOKEN, "user": user })),
    )
        .into_response()
}

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, &headers);
    if bearer(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    }
    let mut guard = state.lock().unwrap();
    if let Some(status) = guard.order_status {
        return error(status, "Order service failure");
    }
    let order = json!({
        "_id": format!("{}", uuid::Uuid::new_v4().simple()),
        "user_email": body["user_email"],
        "items": body["items"],
        "shipping_details": body["shipping_details"],
        "total": body["total"],
        "status": "pending",
        "created_at": "2025-03-01T12:30:00.123456"
    });
    guard.orders.push(order.clone());
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Order created successfully", "order": order })),
    )
        .into_response()
}

async fn orders_for_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record(&state, &headers);
    let Some(email) = query.get("email") else {
        return error(StatusCode::BAD_REQUEST, "email is required");
    };
    let guard = state.lock().unwrap();
    let orders: Vec<Value> = guard
        .orders
        .iter()
        .filter(|o| o["user_email"] == email.as_str())
        .cloned()
        .collect();
    Json(Value::Array(orders)).into_response()
}
