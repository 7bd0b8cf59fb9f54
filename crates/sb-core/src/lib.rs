//! Core types for staged shape construction
//!
//! This crate provides:
//! - The point type shared by every construction crate
//! - State flags with a declarative invalidation cascade
//! - Synchronous notification lists
//! - Builder configuration loaded from RON

pub mod config;
pub mod constants;
pub mod signal;
pub mod state;

/// A point in 3D space
pub type Point3 = glam::Vec3;

// Re-exports for convenience
pub use config::{BuilderConfig, ConfigError, LoggingConfig, SnapConfig};
pub use signal::{Callback, Signal, SubscriptionId};
pub use state::{StateEvent, StateFlag, StateFlags, StateManager};
