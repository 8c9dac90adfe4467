//! Common types used across Bourse
//!
//! This crate provides the fundamental domain vocabulary shared by every
//! service crate: order sides and the limit/market price representation.

pub mod types;

pub use types::{OrderPrice, Side};
