//! Checkout clears the cart only after the order is accepted.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::StatusCode;
use secrecy::SecretString;

use phoneplace_client::cart::CartStore;
use phoneplace_client::checkout::{Checkout, CheckoutError};
use phoneplace_client::session::SessionStore;
use phoneplace_client::storage::MemoryStore;
use phoneplace_client::validation::ValidationError;
use phoneplace_client::{ApiClient, ApiError};
use phoneplace_core::{
    Email, Identity, OrderStatus, Price, ProductId, Role, ShippingDetails, UserId,
};
use phoneplace_integration_tests::{FakeCatalog, USER_TOKEN};

fn shipping() -> ShippingDetails {
    ShippingDetails {
        name: "Jane Doe".to_string(),
        email: "jane@example.com".to_string(),
        address: "Moi Avenue, Nairobi".to_string(),
    }
}

fn signed_in() -> SessionStore {
    let mut session = SessionStore::new(Arc::new(MemoryStore::new()));
    session
        .login(
            SecretString::from(USER_TOKEN),
            Identity {
                id: UserId::new("u-jane"),
                email: Email::parse("jane@example.com").unwrap(),
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                phone: None,
                role: Role::User,
            },
        )
        .unwrap();
    session
}

async fn filled_cart(api: &ApiClient) -> CartStore {
    let mut cart = CartStore::new();
    let phone = api.get_product(&ProductId::new("p-phone")).await.unwrap();
    let case = api.get_product(&ProductId::new("p-case")).await.unwrap();
    cart.add_item(&phone, 1).unwrap();
    cart.add_item(&case, 2).unwrap();
    cart
}

#[tokio::test]
async fn test_successful_order_clears_cart() {
    let server = FakeCatalog::start().await;
    let session = signed_in();
    let api = server.api(session.credential_slot());
    let mut cart = filled_cart(&api).await;
    let expected_total = cart.total();
    assert_eq!(expected_total, Price::from_minor(4_599_900 + 2 * 150_000));

    let order = Checkout::new(api.clone())
        .submit(&mut cart, &session, &shipping())
        .await
        .unwrap();

    assert!(cart.cart().is_empty());
    assert_eq!(order.total, expected_total);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.unit_count(), 3);
    assert_eq!(order.items.first().unwrap().id.as_str(), "p-phone");

    let orders = Checkout::new(api).my_orders(&session).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders.first().unwrap().id, order.id);
}

#[tokio::test]
async fn test_failed_order_keeps_cart() {
    let server = FakeCatalog::start().await;
    server.state().order_status = Some(StatusCode::INTERNAL_SERVER_ERROR);
    let session = signed_in();
    let api = server.api(session.credential_slot());
    let mut cart = filled_cart(&api).await;
    let before = cart.cart().clone();

    let err = Checkout::new(api)
        .submit(&mut cart, &session, &shipping())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Api(ApiError::Server { status: 500, .. })
    ));
    assert_eq!(cart.cart(), &before);
    assert!(server.state().orders.is_empty());
}

#[tokio::test]
async fn test_rejected_order_keeps_cart() {
    let server = FakeCatalog::start().await;
    server.state().order_status = Some(StatusCode::UNPROCESSABLE_ENTITY);
    let session = signed_in();
    let api = server.api(session.credential_slot());
    let mut cart = filled_cart(&api).await;

    let err = Checkout::new(api)
        .submit(&mut cart, &session, &shipping())
        .await
        .unwrap_err();

    let CheckoutError::Api(api_err) = err else {
        panic!("expected an API error");
    };
    assert!(api_err.is_client_error());
    assert_eq!(cart.item_count(), 3);
}

#[tokio::test]
async fn test_checkout_requires_session_and_items() {
    let server = FakeCatalog::start().await;
    let anonymous = SessionStore::new(Arc::new(MemoryStore::new()));
    let api = server.api(anonymous.credential_slot());
    let mut cart = filled_cart(&api).await;

    let err = Checkout::new(api.clone())
        .submit(&mut cart, &anonymous, &shipping())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::NotSignedIn));
    assert_eq!(cart.item_count(), 3);

    let session = signed_in();
    let mut empty = CartStore::new();
    let err = Checkout::new(api.clone())
        .submit(&mut empty, &session, &shipping())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::EmptyCart)
    ));

    assert!(matches!(
        Checkout::new(api).my_orders(&anonymous).await,
        Err(CheckoutError::NotSignedIn)
    ));
    assert!(server.state().orders.is_empty());
}
