//! Concrete Shapes
//!
//! This crate provides:
//! - Shape kinds and the stage schema each one is built with
//! - A construction shape binding control points to state flags
//! - RON documents storing many shapes

pub mod document;
pub mod kind;
pub mod shape;

// Re-exports for convenience
pub use document::{DOCUMENT_VERSION, DocumentError, ShapeDocument, ShapeRecord};
pub use kind::ShapeKind;
pub use shape::ConstructionShape;
