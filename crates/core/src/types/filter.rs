//! Catalog filters.
//!
//! A [`ProductFilter`] is a closed mapping from [`FilterKey`] to a typed
//! [`FilterValue`]. The sidebar builds it up through [`ProductFilter::toggle`]
//! and [`ProductFilter::set_price_range`]; the HTTP gateway calls
//! [`ProductFilter::validate`] before turning it into query parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::product::Category;

/// Errors reported by [`ProductFilter::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// The value has the wrong type for its key.
    #[error("filter {key} expects {expected}")]
    WrongType {
        /// Offending key.
        key: FilterKey,
        /// Human-readable description of the expected type.
        expected: &'static str,
    },
    /// A text value is blank.
    #[error("filter {0} cannot be blank")]
    Blank(FilterKey),
    /// The category is not one of the known categories.
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    /// `min_price` is greater than `max_price`.
    #[error("min_price {min} is greater than max_price {max}")]
    InvertedPriceRange {
        /// Requested minimum.
        min: u64,
        /// Requested maximum.
        max: u64,
    },
    /// The key name is not a known filter.
    #[error("unknown filter: {0}")]
    UnknownKey(String),
}

/// The filters the catalog service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    Brand,
    Category,
    InStock,
    PriceTier,
    UseCase,
    FormFactor,
    SoftwareExperience,
    ChipsetCategory,
    MarketOrigin,
    TargetDemographic,
    MinPrice,
    MaxPrice,
}

impl FilterKey {
    /// Every key, in query-string order.
    pub const ALL: [Self; 12] = [
        Self::Brand,
        Self::Category,
        Self::InStock,
        Self::PriceTier,
        Self::UseCase,
        Self::FormFactor,
        Self::SoftwareExperience,
        Self::ChipsetCategory,
        Self::MarketOrigin,
        Self::TargetDemographic,
        Self::MinPrice,
        Self::MaxPrice,
    ];

    /// Query parameter name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Category => "category",
            Self::InStock => "in_stock",
            Self::PriceTier => "price_tier",
            Self::UseCase => "use_case",
            Self::FormFactor => "form_factor",
            Self::SoftwareExperience => "software_experience",
            Self::ChipsetCategory => "chipset_category",
            Self::MarketOrigin => "market_origin",
            Self::TargetDemographic => "target_demographic",
            Self::MinPrice => "min_price",
            Self::MaxPrice => "max_price",
        }
    }
}

impl std::fmt::Display for FilterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FilterKey {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| FilterError::UnknownKey(s.to_owned()))
    }
}

/// Value attached to a filter key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Flag(bool),
    Number(u64),
    Text(String),
}

impl FilterValue {
    /// Render as a query-string value.
    #[must_use]
    pub fn to_query_value(&self) -> String {
        match self {
            Self::Flag(flag) => flag.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<u64> for FilterValue {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

/// Lowest and highest price in the catalog, in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceBounds {
    pub min: u64,
    pub max: u64,
}

/// Enumerations served by `GET /filter-options` to build the filter sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    pub brands: Vec<String>,
    pub price_tiers: Vec<String>,
    pub use_cases: Vec<String>,
    pub form_factors: Vec<String>,
    pub software_experiences: Vec<String>,
    pub chipset_categories: Vec<String>,
    pub market_origins: Vec<String>,
    pub target_demographics: Vec<String>,
    pub price_range: PriceBounds,
}

impl FilterOptions {
    /// Choices offered for a text filter key; empty for non-enumerated keys.
    #[must_use]
    pub fn choices(&self, key: FilterKey) -> &[String] {
        match key {
            FilterKey::Brand => &self.brands,
            FilterKey::PriceTier => &self.price_tiers,
            FilterKey::UseCase => &self.use_cases,
            FilterKey::FormFactor => &self.form_factors,
            FilterKey::SoftwareExperience => &self.software_experiences,
            FilterKey::ChipsetCategory => &self.chipset_categories,
            FilterKey::MarketOrigin => &self.market_origins,
            FilterKey::TargetDemographic => &self.target_demographics,
            FilterKey::Category
            | FilterKey::InStock
            | FilterKey::MinPrice
            | FilterKey::MaxPrice => &[],
        }
    }
}

/// Active catalog filters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductFilter(BTreeMap<FilterKey, FilterValue>);

impl ProductFilter {
    /// No filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: FilterKey, value: impl Into<FilterValue>) -> Self {
        self.0.insert(key, canonical(key, value.into()));
        self
    }

    /// Set a filter, replacing any previous value.
    pub fn set(&mut self, key: FilterKey, value: impl Into<FilterValue>) {
        self.0.insert(key, canonical(key, value.into()));
    }

    /// Remove a filter.
    pub fn remove(&mut self, key: FilterKey) -> Option<FilterValue> {
        self.0.remove(&key)
    }

    /// Current value of a filter.
    #[must_use]
    pub fn get(&self, key: FilterKey) -> Option<&FilterValue> {
        self.0.get(&key)
    }

    /// Select `value` for `key`, or deselect it if it is already selected.
    pub fn toggle(&mut self, key: FilterKey, value: impl Into<FilterValue>) {
        let value = canonical(key, value.into());
        if self.0.get(&key) == Some(&value) {
            self.0.remove(&key);
        } else {
            self.0.insert(key, value);
        }
    }

    /// Apply a price slider. Bounds equal to the catalog range are not filters.
    pub fn set_price_range(&mut self, min: u64, max: u64, bounds: PriceBounds) {
        if min > bounds.min {
            self.0.insert(FilterKey::MinPrice, FilterValue::Number(min));
        } else {
            self.0.remove(&FilterKey::MinPrice);
        }

        if max < bounds.max {
            self.0.insert(FilterKey::MaxPrice, FilterValue::Number(max));
        } else {
            self.0.remove(&FilterKey::MaxPrice);
        }
    }

    /// Remove every filter.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Number of active filters (for the "Clear All (n)" button).
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.0.len()
    }

    /// Whether no filter is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over active filters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (FilterKey, &FilterValue)> {
        self.0.iter().map(|(key, value)| (*key, value))
    }

    /// Check every value against the type its key requires.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in key order.
    pub fn validate(&self) -> Result<(), FilterError> {
        for (key, value) in self.iter() {
            match (key, value) {
                (FilterKey::InStock, FilterValue::Flag(_))
                | (FilterKey::MinPrice | FilterKey::MaxPrice, FilterValue::Number(_)) => {}
                (FilterKey::InStock, _) => {
                    return Err(FilterError::WrongType {
                        key,
                        expected: "a boolean",
                    });
                }
                (FilterKey::MinPrice | FilterKey::MaxPrice, _) => {
                    return Err(FilterError::WrongType {
                        key,
                        expected: "a non-negative integer amount in minor units",
                    });
                }
                (_, FilterValue::Text(text)) => {
                    if text.trim().is_empty() {
                        return Err(FilterError::Blank(key));
                    }
                    if key == FilterKey::Category && text.parse::<Category>().is_err() {
                        return Err(FilterError::UnknownCategory(text.clone()));
                    }
                }
                (_, _) => {
                    return Err(FilterError::WrongType {
                        key,
                        expected: "text",
                    });
                }
            }
        }

        if let (Some(FilterValue::Number(min)), Some(FilterValue::Number(max))) =
            (self.get(FilterKey::MinPrice), self.get(FilterKey::MaxPrice))
            && min > max
        {
            return Err(FilterError::InvertedPriceRange {
                min: *min,
                max: *max,
            });
        }

        Ok(())
    }

    /// Query-string pairs, in key order.
    ///
    /// The catalog matches `category` exactly, so it always goes out in its
    /// canonical spelling.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        self.iter()
            .map(|(key, value)| (key.as_str(), canonical(key, value.clone()).to_query_value()))
            .collect()
    }
}

/// Rewrite a recognised category spelling (`phone`, `smartphone`) to the
/// catalog's own (`Phone`). Anything else is left for `validate` to judge.
fn canonical(key: FilterKey, value: FilterValue) -> FilterValue {
    if key == FilterKey::Category
        && let FilterValue::Text(text) = &value
        && let Ok(category) = text.trim().parse::<Category>()
    {
        return FilterValue::Text(category.as_str().to_string());
    }
    value
}
