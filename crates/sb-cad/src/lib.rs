//! Staged Constrained Point Input
//!
//! This crate provides:
//! - Geometric constraint functions projecting points onto planes, lines,
//!   circles and axes
//! - Combinators binding those functions to previously placed points
//! - Stage schemas describing how a shape type is built
//! - A control-point manager driving stages, undo, preview and editing

pub mod constraint;
pub mod control_points;
pub mod stage;

// Re-exports for convenience
pub use constraint::{
    ConstraintError, ConstraintFn, ConstraintResult, PointRef, StageConstraint, combine,
    create_constraint_call,
};
pub use control_points::{
    ControlPointError, ControlPointEvent, ControlPointManager, ControlPointResult, PersistError,
    StageTransition,
};
pub use stage::{SchemaError, StageDescriptor, StageSchema, StageSchemaSource};
