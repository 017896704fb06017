//! Session and cart surviving a restart through the file-backed store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use phoneplace_client::cart::CartStore;
use phoneplace_client::session::SessionStore;
use phoneplace_client::storage::{FileStore, KeyValueStore, SharedStore, keys};
use phoneplace_core::{Email, Identity, ProductId, Role, UserId};
use phoneplace_integration_tests::{FakeCatalog, scratch_dir};

fn identity() -> Identity {
    Identity {
        id: UserId::new("admin-user-1"),
        email: Email::parse("admin@phoneplace.com").unwrap(),
        first_name: "Admin".to_string(),
        last_name: "User".to_string(),
        phone: Some("+254 700 000 001".to_string()),
        role: Role::Admin,
    }
}

fn open(dir: &std::path::Path) -> SharedStore {
    Arc::new(FileStore::open(dir).unwrap())
}

#[tokio::test]
async fn test_session_and_cart_survive_restart() {
    let server = FakeCatalog::start().await;
    let dir = scratch_dir();

    {
        let storage = open(&dir);
        let mut session = SessionStore::new(Arc::clone(&storage));
        session
            .login(SecretString::from("admin-token-1"), identity())
            .unwrap();

        let api = server.api(session.credential_slot());
        let mut cart = CartStore::new();
        let phone = api.get_product(&ProductId::new("p-phone")).await.unwrap();
        cart.add_item(&phone, 2).unwrap();
        cart.persist(storage.as_ref()).unwrap();
    }

    let storage = open(&dir);
    let mut session = SessionStore::new(Arc::clone(&storage));
    assert!(session.restore());
    assert!(session.is_admin());
    assert_eq!(
        session.credential_slot().current().unwrap().expose_secret(),
        "admin-token-1"
    );

    let mut cart = CartStore::new();
    assert!(cart.restore(storage.as_ref()));
    assert_eq!(cart.item_count(), 2);
    assert_eq!(cart.total().minor(), 2 * 4_599_900);

    session.logout().unwrap();
    let storage = open(&dir);
    let mut session = SessionStore::new(Arc::clone(&storage));
    assert!(!session.restore());
    assert!(storage.get(keys::CART).unwrap().is_some());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_corrupted_session_restores_anonymous() {
    let dir = scratch_dir();
    {
        let storage = open(&dir);
        storage.set(keys::AUTH_TOKEN, "some-token").unwrap();
        storage.set(keys::USER, "{\"id\": 42, \"email\":").unwrap();
    }

    let storage = open(&dir);
    let mut session = SessionStore::new(Arc::clone(&storage));
    assert!(!session.restore());
    assert!(!session.is_authenticated());
    assert!(session.credential_slot().current().is_none());
    assert!(storage.get(keys::AUTH_TOKEN).unwrap().is_none());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_corrupted_state_file_is_set_aside() {
    let dir = scratch_dir();
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("state.json"), "not json at all").unwrap();

    let storage = open(&dir);
    let mut session = SessionStore::new(Arc::clone(&storage));
    assert!(!session.restore());
    let mut cart = CartStore::new();
    assert!(!cart.restore(storage.as_ref()));
    assert!(dir.join("state.json.corrupt").exists());

    std::fs::remove_dir_all(&dir).ok();
}
