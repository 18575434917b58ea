//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Accounts, sessions and password recovery
//! - `catalog` - Cached menu, store and landing reads
//! - `checkout` - Server-side order confirmation
//! - `email` - Recovery code delivery
//! - `message` - Order summary and WhatsApp links

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod message;

pub use auth::{AuthError, AuthService, SessionTokens};
pub use catalog::CatalogService;
pub use checkout::{CheckoutError, CheckoutService};
pub use email::{EmailService, MailError};
