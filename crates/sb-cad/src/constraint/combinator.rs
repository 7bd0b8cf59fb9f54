//! Constraint combinators
//!
//! Bind library functions to points of earlier stages and chain them.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{ConstraintError, ConstraintFn, ConstraintResult};

/// Address of a stored point: stage index and index within the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointRef {
    /// Stage index
    pub stage: usize,
    /// Index within the stage
    pub index: usize,
}

impl PointRef {
    /// Create a new point reference
    pub fn new(stage: usize, index: usize) -> Self {
        Self { stage, index }
    }

    /// Look the point up in the stages placed so far
    pub fn resolve(&self, stages: &[Vec<Vec3>]) -> ConstraintResult<Vec3> {
        stages
            .get(self.stage)
            .and_then(|stage| stage.get(self.index))
            .copied()
            .ok_or(ConstraintError::PointOutOfRange {
                stage: self.stage,
                index: self.index,
            })
    }
}

impl From<(usize, usize)> for PointRef {
    fn from((stage, index): (usize, usize)) -> Self {
        Self { stage, index }
    }
}

/// A constraint evaluated against every stage placed so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageConstraint {
    /// Call a library function with the referenced points, in order
    Call {
        /// Function to apply
        function: ConstraintFn,
        /// Points passed as the reference list
        refs: Vec<PointRef>,
    },
    /// Apply each constraint to the output of the previous one
    Sequence(Vec<StageConstraint>),
}

impl Default for StageConstraint {
    fn default() -> Self {
        Self::identity()
    }
}

impl StageConstraint {
    /// Constraint leaving every point unchanged
    pub fn identity() -> Self {
        StageConstraint::Sequence(Vec::new())
    }

    /// Apply the constraint, reporting references that do not exist yet
    pub fn try_apply(&self, point: Vec3, stages: &[Vec<Vec3>]) -> ConstraintResult<Vec3> {
        match self {
            StageConstraint::Call { function, refs } => {
                let resolved = refs
                    .iter()
                    .map(|r| r.resolve(stages))
                    .collect::<ConstraintResult<Vec<_>>>()?;
                Ok(function.apply(point, &resolved))
            }
            StageConstraint::Sequence(steps) => steps
                .iter()
                .try_fold(point, |p, step| step.try_apply(p, stages)),
        }
    }

    /// Apply the constraint
    ///
    /// Referencing a point that has not been placed is a schema bug: debug
    /// builds panic, release builds log it and keep the point unchanged.
    pub fn apply(&self, point: Vec3, stages: &[Vec<Vec3>]) -> Vec3 {
        match self.try_apply(point, stages) {
            Ok(constrained) => constrained,
            Err(e) => {
                if cfg!(debug_assertions) {
                    panic!("Invalid stage constraint: {e}");
                }
                tracing::error!("Invalid stage constraint: {}", e);
                point
            }
        }
    }

    /// Every point reference captured by this constraint
    pub fn references(&self) -> Vec<PointRef> {
        match self {
            StageConstraint::Call { refs, .. } => refs.clone(),
            StageConstraint::Sequence(steps) => steps.iter().flat_map(|s| s.references()).collect(),
        }
    }

    /// Check if the constraint never moves a point
    pub fn is_identity(&self) -> bool {
        match self {
            StageConstraint::Call { function, .. } => *function == ConstraintFn::None,
            StageConstraint::Sequence(steps) => steps.iter().all(|s| s.is_identity()),
        }
    }
}

/// Chain constraints; each receives the previous output and the same stages
pub fn combine(constraints: impl IntoIterator<Item = StageConstraint>) -> StageConstraint {
    StageConstraint::Sequence(constraints.into_iter().collect())
}

/// Bind a library function to `(stage, index)` references
///
/// Too few references are allowed; the function then falls back to a weaker
/// projection, which is logged once here.
pub fn create_constraint_call(function: ConstraintFn, refs: &[(usize, usize)]) -> StageConstraint {
    if refs.len() < function.reference_count() {
        tracing::warn!(
            "{} constraint bound to {} references, needs {}",
            function.name(),
            refs.len(),
            function.reference_count()
        );
    }
    StageConstraint::Call {
        function,
        refs: refs.iter().copied().map(PointRef::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::library;

    fn sample_stages() -> Vec<Vec<Vec3>> {
        vec![
            vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)],
            vec![Vec3::new(0.0, 2.0, 0.0)],
        ]
    }

    #[test]
    fn test_call_resolves_references_in_order() {
        let stages = sample_stages();
        let call = create_constraint_call(ConstraintFn::Circle, &[(1, 0), (0, 1)]);

        let result = call.apply(Vec3::new(0.0, 10.0, 0.0), &stages);

        let expected = library::circle(
            Vec3::new(0.0, 10.0, 0.0),
            &[Vec3::new(0.0, 2.0, 0.0), Vec3::new(2.0, 0.0, 0.0)],
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn test_combine_threads_output() {
        let stages = sample_stages();
        let f = create_constraint_call(ConstraintFn::PerpendicularToLastTwoPoints, &[(0, 1), (0, 0)]);
        let g = create_constraint_call(ConstraintFn::Circle, &[(0, 0), (0, 1)]);
        let combined = combine([f.clone(), g.clone()]);

        for p in [
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(3.0, -1.0, 2.0),
            Vec3::new(-4.0, 0.5, 0.0),
        ] {
            let expected = g.apply(f.apply(p, &stages), &stages);
            assert_eq!(combined.apply(p, &stages), expected);
        }
    }

    #[test]
    fn test_empty_combination_is_identity() {
        let identity = combine(Vec::new());
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(identity.apply(p, &[]), p);
        assert!(identity.is_identity());
        assert!(StageConstraint::default().is_identity());
    }

    #[test]
    fn test_out_of_range_reference() {
        let call = create_constraint_call(ConstraintFn::Line, &[(0, 0), (0, 5)]);
        let result = call.try_apply(Vec3::ONE, &sample_stages());
        assert_eq!(
            result,
            Err(ConstraintError::PointOutOfRange { stage: 0, index: 5 })
        );

        let missing_stage = create_constraint_call(ConstraintFn::ZPlane, &[(3, 0)]);
        assert!(missing_stage.try_apply(Vec3::ONE, &sample_stages()).is_err());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "Invalid stage constraint")]
    fn test_out_of_range_reference_panics_in_debug() {
        let call = create_constraint_call(ConstraintFn::ZPlane, &[(2, 0)]);
        call.apply(Vec3::ONE, &sample_stages());
    }

    #[test]
    fn test_references() {
        let combined = combine([
            create_constraint_call(ConstraintFn::Line, &[(0, 0), (0, 1)]),
            create_constraint_call(ConstraintFn::ZPlane, &[(1, 0)]),
        ]);
        assert_eq!(
            combined.references(),
            vec![PointRef::new(0, 0), PointRef::new(0, 1), PointRef::new(1, 0)]
        );
        assert!(!combined.is_identity());
    }
}
