//! Latest-wins product searches.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use phoneplace_client::catalog::{CatalogBrowser, CategoryTab};
use phoneplace_client::session::CredentialSlot;
use phoneplace_core::{FilterKey, ProductFilter};
use phoneplace_integration_tests::FakeCatalog;

fn visible_ids(browser: &CatalogBrowser) -> Vec<String> {
    browser
        .visible_products()
        .iter()
        .map(|p| p.id.to_string())
        .collect()
}

#[tokio::test]
async fn test_later_search_wins_when_answered_first() {
    let server = FakeCatalog::start().await;
    server
        .state()
        .brand_delays
        .insert("Samsung".to_string(), Duration::from_millis(300));
    let mut browser = CatalogBrowser::new(server.api(CredentialSlot::new()));

    browser.toggle_filter(FilterKey::Brand, "Samsung");
    let slow = tokio::spawn(browser.begin_search().run());
    browser.toggle_filter(FilterKey::Brand, "Apple");
    let fast = tokio::spawn(browser.begin_search().run());

    // Apple answers first, Samsung arrives late.
    let fast = fast.await.unwrap();
    assert!(browser.settle(fast));
    let slow = slow.await.unwrap();
    assert!(!browser.settle(slow));

    assert_eq!(visible_ids(&browser), ["p-iphone"]);
}

#[tokio::test]
async fn test_stale_search_dropped_even_if_it_completes_last() {
    let server = FakeCatalog::start().await;
    let mut browser = CatalogBrowser::new(server.api(CredentialSlot::new()));

    browser.toggle_filter(FilterKey::Brand, "Samsung");
    let first = browser.begin_search().run().await;
    browser.toggle_filter(FilterKey::Brand, "Apple");
    let second = browser.begin_search();

    // The superseded response is still pending settlement.
    assert!(!browser.settle(first));
    assert!(browser.products().is_loading());

    let second = second.run().await;
    assert!(browser.settle(second));
    assert_eq!(visible_ids(&browser), ["p-iphone"]);
}

#[tokio::test]
async fn test_refresh_and_tabs() {
    let server = FakeCatalog::start().await;
    let mut browser = CatalogBrowser::new(server.api(CredentialSlot::new()));

    assert!(browser.refresh().await);
    assert_eq!(browser.visible_products().len(), 4);

    browser.set_tab(CategoryTab::Accessory);
    assert_eq!(visible_ids(&browser), ["p-case"]);
}

#[tokio::test]
async fn test_price_range_uses_loaded_bounds() {
    let server = FakeCatalog::start().await;
    let mut browser = CatalogBrowser::new(server.api(CredentialSlot::new()));

    browser.load_filter_options().await;
    assert!(browser.filter_options().ready().is_some());

    assert!(browser.set_price_range(150_000, 5_000_000));
    assert!(browser.filter().get(FilterKey::MinPrice).is_none());
    assert!(browser.filter().get(FilterKey::MaxPrice).is_some());
}

#[tokio::test]
async fn test_failed_search_is_reported() {
    let server = FakeCatalog::start().await;
    let mut browser = CatalogBrowser::new(server.api(CredentialSlot::new()));

    browser.toggle_filter(FilterKey::MinPrice, "cheap");
    assert!(browser.refresh().await);
    assert!(browser.products().error().unwrap().contains("min_price"));
    assert!(server.state().searches.is_empty());
}

#[tokio::test]
async fn test_lowercase_category_matches_catalog() {
    let server = FakeCatalog::start().await;
    let mut browser = CatalogBrowser::new(server.api(CredentialSlot::new()));

    browser.set_filter(ProductFilter::new().with(FilterKey::Category, "phone"));
    assert!(browser.refresh().await);

    assert_eq!(server.state().searches, ["category=Phone"]);
    assert_eq!(visible_ids(&browser), ["p-phone", "p-iphone", "p-gone"]);
}
