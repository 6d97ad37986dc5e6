//! # Heirlooms Common Library
//!
//! Shared code for the Heirlooms services including:
//! - Error types
//! - Configuration loading
//! - Slug derivation
//! - Canonical identifier helpers
//! - Database schema synchronization and retry utilities

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod slug;

pub use error::{Error, Result};
