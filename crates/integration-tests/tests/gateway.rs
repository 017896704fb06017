//! HTTP gateway against the fake catalog service.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use secrecy::SecretString;

use phoneplace_client::ApiError;
use phoneplace_client::session::{CredentialSlot, SessionStore};
use phoneplace_client::storage::MemoryStore;
use phoneplace_core::{
    Category, Email, FilterKey, Identity, ProductFilter, ProductId, Role, UserId,
};
use phoneplace_integration_tests::{FakeCatalog, USER_TOKEN};

fn identity() -> Identity {
    Identity {
        id: UserId::new("u-jane"),
        email: Email::parse("jane@example.com").unwrap(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        phone: None,
        role: Role::User,
    }
}

#[tokio::test]
async fn test_bearer_follows_session() {
    let server = FakeCatalog::start().await;
    let mut session = SessionStore::new(Arc::new(MemoryStore::new()));
    let api = server.api(session.credential_slot());

    api.health().await.unwrap();
    session
        .login(SecretString::from(USER_TOKEN), identity())
        .unwrap();
    api.health().await.unwrap();
    session.logout().unwrap();
    api.health().await.unwrap();

    let seen = server.state().authorization.clone();
    assert_eq!(
        seen,
        [None, Some(format!("Bearer {USER_TOKEN}")), None]
    );
}

#[tokio::test]
async fn test_list_products_with_filters() {
    let server = FakeCatalog::start().await;
    let api = server.api(CredentialSlot::new());

    let phones = api
        .list_products(
            &ProductFilter::new()
                .with(FilterKey::Category, "Phone")
                .with(FilterKey::InStock, true),
        )
        .await
        .unwrap();
    let ids: Vec<_> = phones.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["p-phone", "p-iphone"]);
    assert!(phones.iter().all(|p| p.category == Category::Phone));

    assert_eq!(
        server.state().searches.last().unwrap(),
        "category=Phone&in_stock=true"
    );
}

#[tokio::test]
async fn test_invalid_filter_never_reaches_server() {
    let server = FakeCatalog::start().await;
    let api = server.api(CredentialSlot::new());

    let err = api
        .list_products(&ProductFilter::new().with(FilterKey::Category, "Tablet"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidFilter(_)));
    assert!(err.is_client_error());
    assert!(server.state().searches.is_empty());
}

#[tokio::test]
async fn test_not_found_is_typed() {
    let server = FakeCatalog::start().await;
    let api = server.api(CredentialSlot::new());

    let err = api.get_product(&ProductId::new("nope")).await.unwrap_err();
    assert!(matches!(&err, ApiError::NotFound(message) if message == "Product not found"));
    assert!(err.is_client_error());
    assert!(!err.is_server_error());
}

#[tokio::test]
async fn test_product_detail_is_cached() {
    let server = FakeCatalog::start().await;
    let api = server.api(CredentialSlot::new());
    let id = ProductId::new("p-case");

    let first = api.get_product(&id).await.unwrap();
    let second = api.get_product(&id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.price.display(), "KES 1,500.00");
    assert_eq!(server.state().product_reads, 1);
}

#[tokio::test]
async fn test_fresh_read_sees_stock_change() {
    let server = FakeCatalog::start().await;
    let api = server.api(CredentialSlot::new());
    let id = ProductId::new("p-case");

    assert!(api.get_product(&id).await.unwrap().in_stock);
    for product in &mut server.state().products {
        if product["_id"] == "p-case" {
            product["in_stock"] = false.into();
        }
    }

    // The cached copy is still the old one; a fresh read replaces it.
    assert!(api.get_product(&id).await.unwrap().in_stock);
    assert!(!api.fetch_product(&id).await.unwrap().in_stock);
    assert!(!api.get_product(&id).await.unwrap().in_stock);
    assert_eq!(server.state().product_reads, 2);
}

#[tokio::test]
async fn test_filter_options() {
    let server = FakeCatalog::start().await;
    let api = server.api(CredentialSlot::new());

    let options = api.filter_options().await.unwrap();
    assert_eq!(options.choices(FilterKey::Brand).len(), 4);
    assert_eq!(options.price_range.max, 11_999_900);
    assert!(options.use_cases.is_empty());
}

#[tokio::test]
async fn test_unreachable_service_is_server_class() {
    let server = FakeCatalog::start().await;
    let mut config = server.config();
    config.api_url = "http://127.0.0.1:9/api".parse().unwrap();
    let api = phoneplace_client::ApiClient::new(&config, CredentialSlot::new()).unwrap();

    let err = api.health().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.is_server_error());
}
