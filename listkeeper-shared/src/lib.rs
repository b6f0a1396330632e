//! # Listkeeper Shared Library
//!
//! This crate contains the trust-and-ownership core used by the Listkeeper
//! API server: credentials, bearer tokens, identity resolution and the
//! ownership-gated list store.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, token secrets, identity middleware, ownership checks
//! - `db`: Connection pooling and migrations
//! - `models`: Database models (users, tokens, lists)

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Listkeeper shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
