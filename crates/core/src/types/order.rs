//! Orders and shipping details.
//!
//! Orders are created by the order service from a checkout submission and are
//! read-only to the client afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{OrderId, ProductId};
use super::price::Price;
use super::status::OrderStatus;
use super::timestamp;

/// Where an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub name: String,
    pub email: String,
    pub address: String,
}

/// Snapshot of one cart line inside an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    /// Unit price at the time of the order.
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub images: Vec<String>,
}

impl OrderLine {
    /// `price × quantity` for this line.
    #[must_use]
    pub const fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// An order as returned by the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id", alias = "id")]
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub items: Vec<OrderLine>,
    pub shipping_details: ShippingDetails,
    pub total: Price,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// First eight characters of the id, for compact listings.
    #[must_use]
    pub fn short_id(&self) -> &str {
        let id = self.id.as_str();
        id.char_indices()
            .nth(8)
            .and_then(|(end, _)| id.get(..end))
            .unwrap_or(id)
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }
}
