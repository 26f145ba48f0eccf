//! Bookshop Core - Shared types library.
//!
//! This crate provides common types used across all bookshop client components:
//! - `client` - HTTP clients for the catalog and user/sales services
//! - `cli` - Terminal front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and allows it to be used
//! by any front end.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and roles
//! - [`navigation`] - Role-based navigation menus

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod navigation;
pub mod types;

pub use navigation::{
    Icon, Route, Screen, UnknownRoute, allows, can_edit, menu_for, start_route_for,
};
pub use types::*;
