//! PhonePlace Core - Shared domain types.
//!
//! This crate provides the types exchanged between the storefront client and
//! the catalog service:
//! - products, categories and technical specs
//! - integer minor-unit prices
//! - catalog filters and filter options
//! - user identities and roles
//! - orders and shipping details
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and allows it to be
//! used by every other crate in the workspace.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers and wire types for the catalog domain

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
