//! PhonePlace storefront client library.
//!
//! Client-side state and services for the PhonePlace storefront:
//! - [`cart::CartStore`] - the shopping cart and its subscribers
//! - [`session::SessionStore`] - who is signed in, and the bearer credential
//! - [`api::ApiClient`] - the HTTP gateway to the catalog service
//!
//! plus the flows built on them ([`auth`], [`checkout`], [`admin`],
//! [`catalog`]). Rendering is left to the caller; `pp-cli` is one such
//! caller.
//!
//! The two stores do not know about each other. The gateway reads the
//! credential through a [`session::CredentialSlot`] and never sees the
//! session store itself.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod loadable;
pub mod observer;
pub mod session;
pub mod storage;
pub mod validation;

pub use api::{ApiClient, ApiError};
pub use cart::CartStore;
pub use config::ClientConfig;
pub use session::SessionStore;
