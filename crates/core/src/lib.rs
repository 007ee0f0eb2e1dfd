//! BuyIt Core - Shared types library.
//!
//! This crate provides common types used across all BuyIt components:
//! - `api` - JSON HTTP backend (catalog, cart, checkout)
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and emails,
//!   plus the [`types::CartLedger`] bounded quantity map

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
