//! Common types shared across Parley components.

#![warn(clippy::pedantic)]

/// Module for shared data types
pub mod types;

/// Module for shared configuration
pub mod config;

/// Module for secret types that prevent accidental logging
pub mod secret;
