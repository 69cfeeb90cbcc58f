//! # amoria-core
//!
//! Core crate for Amoria. Contains configuration schemas, logging
//! initialization, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Amoria crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
