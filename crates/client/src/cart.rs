//! Shopping cart store.
//!
//! The cart is an ordered list of line items, one per distinct product.
//! Insertion order is display order. The total is always derived from the
//! lines (`Σ price × quantity`, integer minor units), never stored.
//!
//! Every operation that changes the lines notifies subscribers exactly once,
//! after the change is complete, with the event and the settled cart. Calls
//! that leave the cart unchanged (removing an absent product, setting the
//! current quantity) notify nobody.
//!
//! # Example
//!
//! ```
//! use phoneplace_client::cart::CartStore;
//! # use phoneplace_core::{Category, Price, Product, ProductId};
//! # let phone = Product {
//! #     id: ProductId::new("p1"), name: "Phone".into(), category: Category::Phone,
//! #     brand: "Acme".into(), price: Price::from_minor(150_000), description: String::new(),
//! #     images: vec![], specs: None, in_stock: true, stock_quantity: None, created_at: None,
//! # };
//!
//! let mut cart = CartStore::new();
//! cart.add_item(&phone, 2).unwrap();
//! cart.add_item(&phone, 1).unwrap();
//! assert_eq!(cart.cart().len(), 1);
//! assert_eq!(cart.item_count(), 3);
//! assert_eq!(cart.total(), Price::from_minor(450_000));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use phoneplace_core::{Price, Product, ProductId};

use crate::observer::{Listeners, SubscriptionId};
use crate::storage::{KeyValueStore, StorageError, keys};

/// Reasons an item cannot be added.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product is flagged out of stock.
    #[error("{0} is out of stock")]
    OutOfStock(ProductId),

    /// A quantity of zero was requested.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
}

/// A product and how many units of it are in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    product: Product,
    quantity: u32,
}

impl LineItem {
    /// The product on this line.
    #[must_use]
    pub const fn product(&self) -> &Product {
        &self.product
    }

    /// Units on this line; always at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `price × quantity`.
    #[must_use]
    pub const fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// Read-only view of the cart contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<LineItem>,
}

impl Cart {
    /// Lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// Line for a product, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&LineItem> {
        self.lines.iter().find(|line| &line.product.id == product_id)
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(LineItem::line_total).sum()
    }

    /// Sum of quantities, for the cart badge.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| &line.product.id == product_id)
    }

    /// Merge `quantity` units of `product`, appending a line if needed.
    fn merge(&mut self, product: &Product, quantity: u32) {
        match self
            .lines
            .iter_mut()
            .find(|line| line.product.id == product.id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(LineItem {
                product: product.clone(),
                quantity,
            }),
        }
    }
}

/// What changed in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// Units of a product were added (new line or merged into an existing one).
    Added {
        product_id: ProductId,
        quantity: u32,
    },
    /// A line was removed.
    Removed { product_id: ProductId },
    /// A line's quantity was set.
    QuantityChanged {
        product_id: ProductId,
        quantity: u32,
    },
    /// All lines were removed.
    Cleared,
    /// The cart was replaced by a persisted snapshot.
    Restored,
}

/// Listener signature: the event and the cart after it settled.
pub type CartListener = dyn FnMut(&CartEvent, &Cart) + Send;

/// The cart store: owns the cart and its subscribers.
#[derive(Debug, Default)]
pub struct CartStore {
    cart: Cart,
    listeners: Listeners<CartListener>,
}

impl CartStore {
    /// An empty cart with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Derived total; see [`Cart::total`].
    #[must_use]
    pub fn total(&self) -> Price {
        self.cart.total()
    }

    /// Sum of quantities; see [`Cart::item_count`].
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    /// Register a listener called after every settled change.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&CartEvent, &Cart) + Send + 'static,
    ) -> SubscriptionId {
        self.listeners.add(Box::new(listener))
    }

    /// Detach a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    /// Add `quantity` units of `product`.
    ///
    /// An existing line for the product has its quantity increased; otherwise
    /// a new line is appended at the end.
    ///
    /// # Errors
    ///
    /// - [`CartError::OutOfStock`] if `product.in_stock` is false
    /// - [`CartError::ZeroQuantity`] if `quantity` is 0
    ///
    /// The cart is unchanged and nobody is notified in both cases.
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if !product.in_stock {
            debug!(product_id = %product.id, "Rejected out-of-stock product");
            return Err(CartError::OutOfStock(product.id.clone()));
        }
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        self.cart.merge(product, quantity);
        self.notify(&CartEvent::Added {
            product_id: product.id.clone(),
            quantity,
        });
        Ok(())
    }

    /// Remove the line for `product_id`. No-op if absent.
    pub fn remove_item(&mut self, product_id: &ProductId) {
        let Some(index) = self.cart.position(product_id) else {
            return;
        };
        self.cart.lines.remove(index);
        self.notify(&CartEvent::Removed {
            product_id: product_id.clone(),
        });
    }

    /// Set the quantity of an existing line.
    ///
    /// Quantities `<= 0` remove the line. Values above `u32::MAX` are clamped.
    /// Products not in the cart are ignored.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let Some(line) = self
            .cart
            .lines
            .iter_mut()
            .find(|line| &line.product.id == product_id)
        else {
            return;
        };
        if line.quantity == quantity {
            return;
        }
        line.quantity = quantity;
        self.notify(&CartEvent::QuantityChanged {
            product_id: product_id.clone(),
            quantity,
        });
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        if self.cart.is_empty() {
            return;
        }
        self.cart.lines.clear();
        self.notify(&CartEvent::Cleared);
    }

    /// Write the cart snapshot under [`keys::CART`].
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded or written.
    pub fn persist(&self, storage: &dyn KeyValueStore) -> Result<(), StorageError> {
        let snapshot = serde_json::to_string(&self.cart.lines)?;
        storage.set(keys::CART, &snapshot)
    }

    /// Replace the cart with the persisted snapshot, if any.
    ///
    /// Lines are re-merged so the one-line-per-product and quantity `>= 1`
    /// invariants hold even for hand-edited snapshots. A snapshot that cannot
    /// be read or decoded is discarded and the cart is left as it was.
    /// Returns whether a snapshot was applied.
    pub fn restore(&mut self, storage: &dyn KeyValueStore) -> bool {
        let raw = match storage.get(keys::CART) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "Failed to read cart snapshot");
                return false;
            }
        };

        let lines: Vec<LineItem> = match serde_json::from_str(&raw) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(error = %e, "Discarding corrupt cart snapshot");
                if let Err(e) = storage.remove(keys::CART) {
                    warn!(error = %e, "Failed to remove corrupt cart snapshot");
                }
                return false;
            }
        };

        let mut cart = Cart::default();
        for line in lines.into_iter().filter(|line| line.quantity > 0) {
            cart.merge(&line.product, line.quantity);
        }
        debug!(lines = cart.len(), "Restored cart snapshot");
        self.cart = cart;
        self.notify(&CartEvent::Restored);
        true
    }

    fn notify(&mut self, event: &CartEvent) {
        for listener in self.listeners.iter_mut() {
            listener(event, &self.cart);
        }
    }
}
