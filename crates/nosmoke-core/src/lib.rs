//! Core types and trait definitions for the nosmoke habit log.
//!
//! This crate is deliberately free of database dependencies. Storage backends
//! implement [`store::LocalStore`]; callers depend on the trait and the types
//! defined here.

pub mod cigarette;
pub mod day;
pub mod entry;
pub mod error;
pub mod record;
pub mod store;

pub use error::{Error, Result};
