//! # Taskdeck Core Library
//!
//! This crate contains the domain logic shared by the Taskdeck web server:
//! data models, credential handling, session identity, and query composition.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Password hashing and session identity
//! - `query`: Task filter parsing and owner-scoped query composition
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod query;

/// Current version of the Taskdeck core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
