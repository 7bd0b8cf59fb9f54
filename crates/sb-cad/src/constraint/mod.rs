//! Construction Constraints
//!
//! Constraints project a freshly clicked point onto a valid subspace built
//! from points placed earlier. They are plain data: a [`ConstraintFn`]
//! names one of the library functions and a [`StageConstraint`] binds it to
//! point references, so shape schemas are declared without new code.

mod combinator;
pub mod library;

pub use combinator::{PointRef, StageConstraint, combine, create_constraint_call};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Constraint-related errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("Reference point {index} of stage {stage} does not exist")]
    PointOutOfRange { stage: usize, index: usize },
}

/// Result type for constraint operations
pub type ConstraintResult<T> = Result<T, ConstraintError>;

/// A geometric projection taking a flat list of reference points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConstraintFn {
    /// Leave the point unchanged
    #[default]
    None,
    /// Onto the plane through three references
    Plane,
    /// Onto the line through two references
    Line,
    /// Onto the horizontal plane at the first reference's height
    ZPlane,
    /// Onto the axis through the reference polygon's centroid
    VerticalToBase,
    /// Orthogonal to the edge between two references, anchored at the second
    PerpendicularToLastTwoPoints,
    /// At the distance of the second reference from the first
    Circle,
    /// Onto the axis of the circle through three references
    PerpendicularToCirclePlane,
    /// As far from an anchor as the first two references are apart
    EqualLength,
}

impl ConstraintFn {
    /// Apply the function
    pub fn apply(self, point: Vec3, refs: &[Vec3]) -> Vec3 {
        match self {
            ConstraintFn::None => library::none(point, refs),
            ConstraintFn::Plane => library::plane(point, refs),
            ConstraintFn::Line => library::line(point, refs),
            ConstraintFn::ZPlane => library::z_plane(point, refs),
            ConstraintFn::VerticalToBase => library::vertical_to_base(point, refs),
            ConstraintFn::PerpendicularToLastTwoPoints => {
                library::perpendicular_to_last_two_points(point, refs)
            }
            ConstraintFn::Circle => library::circle(point, refs),
            ConstraintFn::PerpendicularToCirclePlane => {
                library::perpendicular_to_circle_plane(point, refs)
            }
            ConstraintFn::EqualLength => library::equal_length(point, refs),
        }
    }

    /// Number of reference points the function needs to constrain fully
    pub fn reference_count(self) -> usize {
        match self {
            ConstraintFn::None => 0,
            ConstraintFn::ZPlane => 1,
            ConstraintFn::Line
            | ConstraintFn::PerpendicularToLastTwoPoints
            | ConstraintFn::Circle
            | ConstraintFn::EqualLength => 2,
            ConstraintFn::Plane
            | ConstraintFn::VerticalToBase
            | ConstraintFn::PerpendicularToCirclePlane => 3,
        }
    }

    /// Get the display name of the function
    pub fn name(self) -> &'static str {
        match self {
            ConstraintFn::None => "None",
            ConstraintFn::Plane => "Plane",
            ConstraintFn::Line => "Line",
            ConstraintFn::ZPlane => "Z Plane",
            ConstraintFn::VerticalToBase => "Vertical to Base",
            ConstraintFn::PerpendicularToLastTwoPoints => "Perpendicular",
            ConstraintFn::Circle => "Circle",
            ConstraintFn::PerpendicularToCirclePlane => "Circle Axis",
            ConstraintFn::EqualLength => "Equal Length",
        }
    }
}
