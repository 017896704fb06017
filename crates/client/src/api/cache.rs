//! Cache types for catalog reads.

use phoneplace_core::{FilterOptions, Product, ProductId};

/// Cache key for single-resource reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    FilterOptions,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    FilterOptions(Box<FilterOptions>),
}
