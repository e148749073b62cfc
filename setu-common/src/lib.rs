//! # Setu Common Library
//!
//! Shared code for the Setu triage services:
//! - Common error type
//! - Configuration file resolution and loading (CLI → ENV → TOML → defaults)
//! - Logging configuration and tracing initialization

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
