//! FreightGate Core - Domain types
//!
//! This crate contains the fundamental types shared across FreightGate:
//! - `Amount`: Non-negative decimal wrapper for rate amounts
//! - `Currency`: Type-safe currency codes
//! - `PartyRole`: The four parties to a shipment

pub mod amount;
pub mod currency;
pub mod role;

pub use amount::{Amount, AmountError};
pub use currency::{Currency, CurrencyError};
pub use role::{PartyRole, RoleError};
