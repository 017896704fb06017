//! Core types for PhonePlace.
//!
//! This module provides type-safe wrappers for the catalog domain.

pub mod email;
pub mod filter;
pub mod id;
pub mod identity;
pub mod order;
pub mod price;
pub mod product;
pub mod status;
mod timestamp;

pub use email::{Email, EmailError};
pub use filter::{FilterError, FilterKey, FilterOptions, FilterValue, PriceBounds, ProductFilter};
pub use id::*;
pub use identity::Identity;
pub use order::{Order, OrderLine, ShippingDetails};
pub use price::{Price, PriceError};
pub use product::{Category, Product, ProductSpecs};
pub use status::*;
