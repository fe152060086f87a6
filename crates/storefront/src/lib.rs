//! Tool Depot storefront client library.
//!
//! Talks to the Tool Depot REST backend and keeps the customer's memo (cart)
//! on the client:
//!
//! - [`memo`]: the memo store, its persistence, and user notices
//! - [`checkout`]: turning the memo into a submitted order
//! - [`api`]: the HTTP client, typed endpoints, and catalog cache
//! - [`auth`]: shared sign-in state and saved sessions
//! - [`catalog`]: client-side search, sort, and paging over products

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
mod files;
pub mod memo;

#[cfg(test)]
mod testing;
