//! Tool Depot Core - Shared domain types.
//!
//! This crate provides the types shared by every Tool Depot component:
//! - `storefront` - Catalog client, memo (cart) store, and checkout
//! - `cli` - Command-line front end over the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and usable anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, GST numbers, catalog records, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
