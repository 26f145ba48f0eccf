//! Bookshop Client - API clients, session store and sales cart.
//!
//! Talks to the two bookshop backends:
//! - [`CatalogClient`] - authors, genres, publishers and products
//! - [`SalesClient`] - users, roles, authentication and sales
//!
//! Alongside the clients live the pieces a front end needs between calls:
//! the persisted [`session`] and the in-memory sales [`Cart`].
//!
//! # Configuration
//!
//! See [`config`] for the environment variables read by
//! [`ClientConfig::from_env`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
mod http;
pub mod sales;
pub mod session;
mod wire;

pub use cart::{Cart, CartError, CartLine};
pub use catalog::CatalogClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, Result};
pub use sales::SalesClient;
pub use session::{
    FileStore, KeyValueStore, MemoryStore, Session, SessionError, SessionState, SessionStore,
};
