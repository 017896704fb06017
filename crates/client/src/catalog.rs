//! Catalog browsing state: filters, the product list and the filter sidebar.
//!
//! Product list fetches are split in two so that several can be in flight at
//! once without holding the browser borrowed:
//!
//! ```rust,ignore
//! let first = browser.begin_search();           // brand=X
//! browser.toggle_filter(FilterKey::Brand, "Y");
//! let second = browser.begin_search();          // brand=Y
//!
//! let (x, y) = tokio::join!(first.run(), second.run());
//! browser.settle(y);   // applied
//! browser.settle(x);   // stale, dropped
//! ```

use tracing::debug;

use phoneplace_core::{Category, FilterKey, FilterOptions, FilterValue, Product, ProductFilter};

use crate::api::{ApiClient, ApiError};
use crate::loadable::{LatestWins, Loadable, RequestToken};

/// Local category tab applied over the loaded list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryTab {
    #[default]
    All,
    Phone,
    Accessory,
}

impl CategoryTab {
    pub const ALL: [Self; 3] = [Self::All, Self::Phone, Self::Accessory];

    #[must_use]
    pub fn matches(self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Phone => product.category == Category::Phone,
            Self::Accessory => product.category == Category::Accessory,
        }
    }
}

impl From<Category> for CategoryTab {
    fn from(category: Category) -> Self {
        match category {
            Category::Phone => Self::Phone,
            Category::Accessory => Self::Accessory,
        }
    }
}

/// A product list request that has been issued a token but not yet sent.
#[derive(Debug)]
pub struct PendingSearch {
    token: RequestToken,
    api: ApiClient,
    filter: ProductFilter,
}

impl PendingSearch {
    #[must_use]
    pub const fn token(&self) -> RequestToken {
        self.token
    }

    /// Send the request. Does not touch the browser.
    pub async fn run(self) -> CompletedSearch {
        let result = self.api.list_products(&self.filter).await;
        CompletedSearch {
            token: self.token,
            result,
        }
    }
}

/// The outcome of a [`PendingSearch`], waiting to be settled.
#[derive(Debug)]
pub struct CompletedSearch {
    token: RequestToken,
    result: Result<Vec<Product>, ApiError>,
}

impl CompletedSearch {
    #[must_use]
    pub const fn token(&self) -> RequestToken {
        self.token
    }
}

/// Catalog page state.
#[derive(Debug)]
pub struct CatalogBrowser {
    api: ApiClient,
    filter: ProductFilter,
    tab: CategoryTab,
    products: LatestWins<Vec<Product>>,
    options: Loadable<FilterOptions>,
}

impl CatalogBrowser {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            filter: ProductFilter::new(),
            tab: CategoryTab::All,
            products: LatestWins::new(),
            options: Loadable::Loading,
        }
    }

    #[must_use]
    pub const fn filter(&self) -> &ProductFilter {
        &self.filter
    }

    /// Replace all filters. Takes effect on the next search.
    pub fn set_filter(&mut self, filter: ProductFilter) {
        self.filter = filter;
    }

    /// Select `value` for `key`, or deselect it if it is already selected.
    pub fn toggle_filter(&mut self, key: FilterKey, value: impl Into<FilterValue>) {
        self.filter.toggle(key, value);
    }

    /// Apply a price range against the catalog bounds, once those are loaded.
    /// Returns whether the range was applied.
    pub fn set_price_range(&mut self, min: u64, max: u64) -> bool {
        let Some(options) = self.options.ready() else {
            return false;
        };
        self.filter.set_price_range(min, max, options.price_range);
        true
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
    }

    #[must_use]
    pub const fn tab(&self) -> CategoryTab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: CategoryTab) {
        self.tab = tab;
    }

    /// State of the most recently issued product list request.
    #[must_use]
    pub const fn products(&self) -> &Loadable<Vec<Product>> {
        self.products.state()
    }

    /// Loaded products that pass the category tab; empty unless ready.
    #[must_use]
    pub fn visible_products(&self) -> Vec<&Product> {
        self.products
            .state()
            .ready()
            .map(|products| products.iter().filter(|p| self.tab.matches(p)).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn filter_options(&self) -> &Loadable<FilterOptions> {
        &self.options
    }

    /// Fetch the filter sidebar choices.
    pub async fn load_filter_options(&mut self) {
        self.options = Loadable::Loading;
        self.options = Loadable::from_result(self.api.filter_options().await);
    }

    /// Issue a token for the current filters. Every earlier search goes stale.
    pub fn begin_search(&mut self) -> PendingSearch {
        let token = self.products.begin();
        debug!(?token, filters = self.filter.active_count(), "Searching products");
        PendingSearch {
            token,
            api: self.api.clone(),
            filter: self.filter.clone(),
        }
    }

    /// Apply a completed search if it is still the latest. Returns whether it
    /// was applied.
    pub fn settle(&mut self, completed: CompletedSearch) -> bool {
        self.products.settle(completed.token, completed.result)
    }

    /// Search with the current filters and wait for the result.
    pub async fn refresh(&mut self) -> bool {
        let completed = self.begin_search().run().await;
        self.settle(completed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use phoneplace_core::{Price, ProductId};
    use url::Url;

    use super::*;
    use crate::config::ClientConfig;
    use crate::session::CredentialSlot;

    fn browser() -> CatalogBrowser {
        let config = ClientConfig {
            api_url: Url::parse("http://127.0.0.1:9/api").unwrap(),
            state_dir: std::env::temp_dir(),
            demo_accounts: false,
            request_timeout: Some(Duration::from_secs(1)),
            cache_ttl: Duration::from_secs(1),
        };
        CatalogBrowser::new(ApiClient::new(&config, CredentialSlot::new()).unwrap())
    }

    fn product(id: &str, category: Category) -> Product {
        Product {
            id: ProductId::new(id),
            name: id.to_string(),
            category,
            brand: "Acme".to_string(),
            price: Price::from_minor(1000),
            description: String::new(),
            images: vec![],
            specs: None,
            in_stock: true,
            stock_quantity: None,
            created_at: None,
        }
    }

    fn completed(token: RequestToken, products: Vec<Product>) -> CompletedSearch {
        CompletedSearch {
            token,
            result: Ok(products),
        }
    }

    #[test]
    fn test_out_of_order_results_keep_latest() {
        let mut browser = browser();
        browser.toggle_filter(FilterKey::Brand, "X");
        let x = browser.begin_search();
        browser.toggle_filter(FilterKey::Brand, "Y");
        let y = browser.begin_search();

        assert!(browser.settle(completed(y.token(), vec![product("y1", Category::Phone)])));
        assert!(!browser.settle(completed(x.token(), vec![product("x1", Category::Phone)])));

        let visible: Vec<_> = browser.visible_products().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(visible, ["y1"]);
    }

    #[test]
    fn test_tab_filters_loaded_list() {
        let mut browser = browser();
        let search = browser.begin_search();
        browser.settle(completed(
            search.token(),
            vec![product("p", Category::Phone), product("a", Category::Accessory)],
        ));

        browser.set_tab(CategoryTab::Accessory);
        let visible: Vec<_> = browser.visible_products().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(visible, ["a"]);

        browser.set_tab(CategoryTab::All);
        assert_eq!(browser.visible_products().len(), 2);
    }

    #[test]
    fn test_loading_shows_nothing() {
        let mut browser = browser();
        browser.begin_search();
        assert!(browser.products().is_loading());
        assert!(browser.visible_products().is_empty());
    }

    #[test]
    fn test_price_range_needs_options() {
        let mut browser = browser();
        assert!(!browser.set_price_range(100, 200));
        assert!(browser.filter().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_with_unreachable_service_fails() {
        let mut browser = browser();
        assert!(browser.refresh().await);
        assert!(browser.products().error().is_some());
    }
}
