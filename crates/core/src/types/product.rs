//! Catalog product types.
//!
//! Products are owned by the catalog service; the client only reads them
//! (and, for administrators, submits drafts). Wire names follow the service:
//! the identifier travels as `_id`, with `id` accepted for older payloads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::timestamp;

/// Product category. The catalog only knows these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(alias = "Smartphone")]
    Phone,
    Accessory,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Self; 2] = [Self::Phone, Self::Accessory];

    /// Wire and display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Phone => "Phone",
            Self::Accessory => "Accessory",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "phone" | "smartphone" => Ok(Self::Phone),
            "accessory" => Ok(Self::Accessory),
            _ => Err(format!("invalid category: {s}")),
        }
    }
}

/// Technical specifications of a phone or accessory.
///
/// The well-known fields are typed; anything else the catalog attaches
/// (price tier, use case, form factor, ...) lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSpecs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor: Option<String>,
    /// Free-form categorisation attributes.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ProductSpecs {
    /// Look up any attribute, typed or free-form, rendered as text.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let typed = match key {
            "screen_size" => self.screen_size.as_ref(),
            "ram" => self.ram.as_ref(),
            "storage" => self.storage.as_ref(),
            "battery" => self.battery.as_ref(),
            "camera" => self.camera.as_ref(),
            "processor" => self.processor.as_ref(),
            _ => None,
        };
        if let Some(value) = typed {
            return Some(value.clone());
        }
        self.extra.get(key).and_then(|value| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
    }

    /// All non-empty attributes as `(key, value)` pairs, typed fields first.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, String)> {
        const TYPED: [&str; 6] = [
            "screen_size",
            "ram",
            "storage",
            "battery",
            "camera",
            "processor",
        ];
        TYPED
            .iter()
            .copied()
            .chain(self.extra.keys().map(String::as_str))
            .filter_map(|key| self.get(key).map(|value| (key.to_owned(), value)))
            .filter(|(_, value)| !value.is_empty())
            .collect()
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProductWire")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub category: Category,
    pub brand: String,
    /// Unit price in minor units.
    pub price: Price,
    pub description: String,
    /// Image URLs in display order.
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specs: Option<ProductSpecs>,
    pub in_stock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// First image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Wire shape accepted for products, including the legacy single `image_url`.
#[derive(Deserialize)]
struct ProductWire {
    #[serde(rename = "_id", alias = "id")]
    id: ProductId,
    name: String,
    category: Category,
    brand: String,
    price: Price,
    #[serde(default)]
    description: String,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    specs: Option<ProductSpecs>,
    #[serde(default = "default_in_stock")]
    in_stock: bool,
    #[serde(default)]
    stock_quantity: Option<u32>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    created_at: Option<DateTime<Utc>>,
}

const fn default_in_stock() -> bool {
    true
}

impl From<ProductWire> for Product {
    fn from(wire: ProductWire) -> Self {
        let mut images = wire.images;
        if images.is_empty()
            && let Some(url) = wire.image_url
        {
            images.push(url);
        }

        Self {
            id: wire.id,
            name: wire.name,
            category: wire.category,
            brand: wire.brand,
            price: wire.price,
            description: wire.description,
            images,
            specs: wire.specs,
            in_stock: wire.in_stock,
            stock_quantity: wire.stock_quantity,
            created_at: wire.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_full_product() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p-1",
            "name": "Pixel 9",
            "category": "Phone",
            "brand": "Google",
            "price": 129_900,
            "description": "Fast",
            "images": ["a.jpg", "b.jpg"],
            "specs": { "ram": "12GB", "price_tier": "Flagship" },
            "in_stock": false,
            "stock_quantity": 0,
            "created_at": "2025-01-02T03:04:05Z"
        }))
        .unwrap();

        assert_eq!(product.id.as_str(), "p-1");
        assert_eq!(product.price.minor(), 129_900);
        assert!(!product.in_stock);
        assert_eq!(product.primary_image(), Some("a.jpg"));
        let specs = product.specs.unwrap();
        assert_eq!(specs.ram.as_deref(), Some("12GB"));
        assert_eq!(specs.get("price_tier").as_deref(), Some("Flagship"));
    }

    #[test]
    fn test_deserialize_defaults_and_legacy_image() {
        let product: Product = serde_json::from_value(json!({
            "id": "legacy",
            "name": "Case",
            "category": "Accessory",
            "brand": "Generic",
            "price": 1500,
            "image_url": "case.jpg"
        }))
        .unwrap();

        assert_eq!(product.id.as_str(), "legacy");
        assert!(product.in_stock);
        assert_eq!(product.images, vec!["case.jpg".to_string()]);
        assert!(product.created_at.is_none());
    }

    #[test]
    fn test_serialize_uses_underscore_id() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p-2",
            "name": "Charger",
            "category": "Accessory",
            "brand": "Anker",
            "price": 250_000
        }))
        .unwrap();
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["_id"], "p-2");
        assert!(value.get("specs").is_none());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("phone".parse::<Category>().unwrap(), Category::Phone);
        assert_eq!("Smartphone".parse::<Category>().unwrap(), Category::Phone);
        assert!("tablet".parse::<Category>().is_err());
    }

    #[test]
    fn test_specs_entries_skip_empty() {
        let specs = ProductSpecs {
            ram: Some("8GB".to_string()),
            storage: Some(String::new()),
            ..ProductSpecs::default()
        };
        assert_eq!(specs.entries(), vec![("ram".to_string(), "8GB".to_string())]);
    }
}
