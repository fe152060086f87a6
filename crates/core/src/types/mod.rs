//! Core types for Tool Depot.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod gst;
pub mod id;
pub mod price;
pub mod status;

pub use catalog::{Category, Product, ProductSnapshot, Variant};
pub use gst::{GstNo, GstNoError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use status::*;
