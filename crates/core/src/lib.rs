//! Tierra Querida Core - Shared domain types and logic.
//!
//! This crate provides the types used across all ordering-site components:
//! - `server` - HTTP API for the menu, accounts, stores and orders
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The browser keeps the cart and the user profile in
//! `localStorage`; the serde shapes here match those records exactly so the
//! server can accept them unchanged.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, phones and statuses
//! - [`cart`] - Cart line items and cart math
//! - [`geo`] - Coordinates and nearest-store lookup
//! - [`checkout`] - Delivery form validation for order confirmation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod geo;
pub mod types;

pub use cart::{Cart, CartError, CartExtra, CartLine};
pub use checkout::{DeliveryForm, FormErrors, ValidatedDelivery};
pub use geo::{Coordinates, GeoError, Located, distance_km, nearest};
pub use types::*;
