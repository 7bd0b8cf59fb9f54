//! Staged Control Points
//!
//! The [`ControlPointManager`] collects the points of one shape stage by
//! stage. Every incoming point is run through its stage's constraint before
//! it is stored, so only constrained points are ever kept.

pub mod format;

pub use format::PersistError;

use glam::Vec3;
use sb_core::Signal;
use sb_core::SubscriptionId;
use thiserror::Error;

use crate::stage::{StageDescriptor, StageSchema};

/// Control point errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlPointError {
    #[error("Construction is already complete")]
    SessionComplete,

    #[error("Construction is not complete yet")]
    SessionIncomplete,

    #[error("Control point {index} out of range ({len} points)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Control point {0:?} is not finite")]
    NonFinitePoint(Vec3),
}

/// Result type for control point operations
pub type ControlPointResult<T> = Result<T, ControlPointError>;

/// What happened to the stage cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageTransition {
    /// The current stage is still open
    Stayed,
    /// A new, empty stage became current
    Advanced {
        /// Index of the new current stage
        stage: usize,
    },
    /// The last stage was left; the session is complete
    Completed,
    /// The current stage holds too few points to be left
    Rejected {
        /// Points in the current stage
        have: usize,
        /// Points required
        need: usize,
    },
}

impl StageTransition {
    /// Check if the cursor moved or the session completed
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            StageTransition::Advanced { .. } | StageTransition::Completed
        )
    }
}

/// Notification fired by a [`ControlPointManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlPointEvent {
    /// Stored control points or stages changed
    Changed,
    /// The preview point changed
    TempPointChanged,
}

/// Stage-aware store of a shape's control points
#[derive(Debug)]
pub struct ControlPointManager {
    schema: StageSchema,
    /// One entry per reached stage; the last one is current
    stages: Vec<Vec<Vec3>>,
    temp_point: Option<Vec3>,
    complete: bool,
    events: Signal<ControlPointEvent>,
}

impl ControlPointManager {
    /// Create an empty session for the schema
    pub fn new(schema: StageSchema) -> Self {
        Self {
            schema,
            stages: vec![Vec::new()],
            temp_point: None,
            complete: false,
            events: Signal::new(),
        }
    }

    /// Register a notification callback
    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&ControlPointEvent) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(callback)
    }

    /// Remove a notification callback
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ============== Queries ==============

    /// The schema driving this session
    pub fn schema(&self) -> &StageSchema {
        &self.schema
    }

    /// Stored stages, without the preview point
    pub fn stages(&self) -> &[Vec<Vec3>] {
        &self.stages
    }

    /// Index of the stage receiving points
    pub fn current_stage_index(&self) -> usize {
        self.stages.len() - 1
    }

    /// Points of the current stage
    pub fn current_stage(&self) -> &[Vec3] {
        &self.stages[self.current_stage_index()]
    }

    /// Descriptor of the current stage
    pub fn current_descriptor(&self) -> &StageDescriptor {
        &self.schema[self.current_stage_index()]
    }

    /// Total number of stored points
    pub fn point_count(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }

    /// Check if every stage has been filled
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Check if nothing has been placed yet
    pub fn is_empty(&self) -> bool {
        self.stages.len() == 1 && self.stages[0].is_empty()
    }

    /// Raw preview point, if any
    pub fn temp_point(&self) -> Option<Vec3> {
        self.temp_point
    }

    /// Stored points in stage order
    pub fn points(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.stages.iter().flatten().copied()
    }

    /// Find the stage and in-stage index of a global point index
    pub fn locate(&self, global_index: usize) -> Option<(usize, usize)> {
        let mut remaining = global_index;
        for (stage, points) in self.stages.iter().enumerate() {
            if remaining < points.len() {
                return Some((stage, remaining));
            }
            remaining -= points.len();
        }
        None
    }

    // ============== Construction ==============

    /// Constrain and store a point in the current stage
    ///
    /// Filling the stage advances to the next one, or completes the session
    /// after the last stage.
    pub fn add_control_point(&mut self, point: Vec3) -> ControlPointResult<StageTransition> {
        if self.complete {
            tracing::error!("Control point added to a complete construction");
            return Err(ControlPointError::SessionComplete);
        }
        if !point.is_finite() {
            tracing::warn!("Non-finite control point {:?} ignored", point);
            return Err(ControlPointError::NonFinitePoint(point));
        }

        let stage = self.current_stage_index();
        let descriptor = &self.schema[stage];
        let constrained = descriptor.constrain(point, &self.stages);
        self.stages[stage].push(constrained);
        let full = descriptor.is_full(self.stages[stage].len());
        self.temp_point = None;

        tracing::debug!("Control point {:?} added to stage {}", constrained, stage);

        let transition = if full {
            self.advance()
        } else {
            StageTransition::Stayed
        };
        self.events.emit(&ControlPointEvent::Changed);
        Ok(transition)
    }

    /// Leave the current stage
    ///
    /// Fails with [`StageTransition::Rejected`] when the stage holds fewer
    /// than its minimum. Leaving the last stage completes the session.
    pub fn next_stage(&mut self) -> StageTransition {
        if self.complete {
            return StageTransition::Completed;
        }
        let transition = self.advance();
        if transition.is_success() {
            self.events.emit(&ControlPointEvent::Changed);
        }
        transition
    }

    fn advance(&mut self) -> StageTransition {
        let stage = self.current_stage_index();
        let have = self.stages[stage].len();
        let need = self.schema[stage].min_points;

        if have < need {
            tracing::warn!(
                "Stage '{}' needs {} points, has {}",
                self.schema[stage].name,
                need,
                have
            );
            return StageTransition::Rejected { have, need };
        }

        if stage == self.schema.last_index() {
            self.complete = true;
            self.temp_point = None;
            tracing::debug!("Construction complete with {} points", self.point_count());
            return StageTransition::Completed;
        }

        self.stages.push(Vec::new());
        tracing::debug!("Advanced to stage '{}'", self.schema[stage + 1].name);
        StageTransition::Advanced { stage: stage + 1 }
    }

    /// Remove the most recent point
    ///
    /// When the current stage is empty the stage boundary is undone as well:
    /// the empty stage is dropped and the last point of the previous stage is
    /// removed. Returns false if there is nothing to undo or the session is
    /// complete.
    pub fn undo_last_control_point(&mut self) -> bool {
        if self.complete {
            return false;
        }

        let stage = self.current_stage_index();
        if self.stages[stage].pop().is_none() {
            if self.stages.len() == 1 {
                return false;
            }
            self.stages.pop();
            if let Some(previous) = self.stages.last_mut() {
                previous.pop();
            }
        }

        tracing::debug!("Undo, now in stage {}", self.current_stage_index());
        self.events.emit(&ControlPointEvent::Changed);
        true
    }

    // ============== Preview ==============

    /// Set the preview point
    ///
    /// Returns false once the session is complete or for a non-finite point.
    pub fn set_temp_point(&mut self, point: Vec3) -> bool {
        if self.complete || !point.is_finite() {
            return false;
        }
        self.temp_point = Some(point);
        self.events.emit(&ControlPointEvent::TempPointChanged);
        true
    }

    /// Drop the preview point
    pub fn clear_temp_point(&mut self) {
        if self.temp_point.take().is_some() {
            self.events.emit(&ControlPointEvent::TempPointChanged);
        }
    }

    /// Preview point after the current stage's constraint
    pub fn constrained_temp_point(&self) -> Option<Vec3> {
        if self.complete {
            return None;
        }
        self.temp_point
            .map(|p| self.current_descriptor().constrain(p, &self.stages))
    }

    /// Every stage, with the constrained preview point appended to the
    /// current one while the session is open
    pub fn all_stage_control_points(&self) -> Vec<Vec<Vec3>> {
        let mut stages = self.stages.clone();
        if let Some(preview) = self.constrained_temp_point()
            && let Some(current) = stages.last_mut()
        {
            current.push(preview);
        }
        stages
    }

    // ============== Editing ==============

    /// Move a point of a complete session
    ///
    /// Every constraint is applied again in stage order, each point seeing
    /// the points that preceded it when it was placed.
    pub fn set_control_point(&mut self, global_index: usize, point: Vec3) -> ControlPointResult<()> {
        if !self.complete {
            return Err(ControlPointError::SessionIncomplete);
        }
        if !point.is_finite() {
            return Err(ControlPointError::NonFinitePoint(point));
        }
        let (stage, index) =
            self.locate(global_index)
                .ok_or(ControlPointError::IndexOutOfRange {
                    index: global_index,
                    len: self.point_count(),
                })?;

        self.stages[stage][index] = point;
        self.reapply_constraints();

        tracing::debug!("Control point {} moved", global_index);
        self.events.emit(&ControlPointEvent::Changed);
        Ok(())
    }

    fn reapply_constraints(&mut self) {
        for stage in 0..self.stages.len() {
            let Some(constraint) = self.schema[stage].constraint.as_ref() else {
                continue;
            };
            // Earlier stages plus the points of this stage redone so far
            let mut prior = self.stages[..stage].to_vec();
            prior.push(Vec::with_capacity(self.stages[stage].len()));
            for index in 0..self.stages[stage].len() {
                let constrained = constraint.apply(self.stages[stage][index], &prior);
                self.stages[stage][index] = constrained;
                prior[stage].push(constrained);
            }
        }
    }

    // ============== Persistence ==============

    /// Encode the stored points (see [`format`])
    pub fn serialize(&self) -> String {
        format::encode(&self.stages)
    }

    /// Replace the session with decoded points
    ///
    /// On error the session is reset to a single empty stage.
    pub fn deserialize(&mut self, text: &str) -> Result<(), PersistError> {
        match format::decode(text, &self.schema) {
            Ok(stages) => {
                self.load_stages(stages);
                self.events.emit(&ControlPointEvent::Changed);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to load control points: {}", e);
                self.reset();
                Err(e)
            }
        }
    }

    fn load_stages(&mut self, stages: Vec<Vec<Vec3>>) {
        self.reset();
        if stages.is_empty() {
            return;
        }

        let last = stages.len() - 1;
        let last_len = stages[last].len();
        self.stages = stages;

        if last == self.schema.last_index() && self.schema[last].accepts_len(last_len) {
            self.complete = true;
        } else if self.schema[last].is_full(last_len) {
            self.stages.push(Vec::new());
        }
    }

    /// Drop every point and return to a single empty stage
    pub fn reset(&mut self) {
        self.stages = vec![Vec::new()];
        self.temp_point = None;
        self.complete = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintFn, combine, create_constraint_call};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn two_stage_schema() -> StageSchema {
        StageSchema::new(vec![
            StageDescriptor::exact("base", 2),
            StageDescriptor::exact("top", 1),
        ])
    }

    fn square_box_schema() -> StageSchema {
        StageSchema::new(vec![
            StageDescriptor::exact("edge", 2),
            StageDescriptor::exact("width", 1).with_constraint(combine([
                create_constraint_call(ConstraintFn::PerpendicularToLastTwoPoints, &[(0, 1), (0, 0)]),
                create_constraint_call(ConstraintFn::Circle, &[(0, 0), (0, 1)]),
            ])),
            StageDescriptor::exact("height", 1).with_constraint(create_constraint_call(
                ConstraintFn::PerpendicularToCirclePlane,
                &[(0, 0), (0, 1), (1, 0)],
            )),
        ])
    }

    fn outline_schema() -> StageSchema {
        StageSchema::new(vec![
            StageDescriptor::exact("anchor", 1),
            StageDescriptor::unbounded("outline", 2).with_constraint(create_constraint_call(
                ConstraintFn::ZPlane,
                &[(0, 0)],
            )),
        ])
    }

    fn assert_vec_eq(actual: Vec3, expected: Vec3) {
        assert!(
            actual.abs_diff_eq(expected, 1e-5),
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_new_session() {
        let manager = ControlPointManager::new(two_stage_schema());
        assert!(manager.is_empty());
        assert_eq!(manager.current_stage_index(), 0);
        assert!(!manager.is_complete());
        assert_eq!(manager.serialize(), "0");
    }

    #[test]
    fn test_auto_advance_and_complete() {
        let mut manager = ControlPointManager::new(two_stage_schema());

        assert_eq!(manager.add_control_point(Vec3::ZERO), Ok(StageTransition::Stayed));
        assert_eq!(
            manager.add_control_point(Vec3::X),
            Ok(StageTransition::Advanced { stage: 1 })
        );
        assert_eq!(manager.current_stage_index(), 1);
        assert!(manager.current_stage().is_empty());

        assert_eq!(
            manager.add_control_point(Vec3::Y),
            Ok(StageTransition::Completed)
        );
        assert!(manager.is_complete());
        assert_eq!(manager.stages().len(), 2);
    }

    #[test]
    fn test_add_after_complete() {
        let mut manager = ControlPointManager::new(two_stage_schema());
        for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
            manager.add_control_point(p).unwrap();
        }
        assert_eq!(
            manager.add_control_point(Vec3::Z),
            Err(ControlPointError::SessionComplete)
        );
        assert_eq!(manager.point_count(), 3);
    }

    #[test]
    fn test_next_stage_rejected_below_minimum() {
        let mut manager = ControlPointManager::new(outline_schema());
        manager.add_control_point(Vec3::new(0.0, 0.0, 1.0)).unwrap();
        manager.add_control_point(Vec3::new(1.0, 0.0, 5.0)).unwrap();

        assert_eq!(
            manager.next_stage(),
            StageTransition::Rejected { have: 1, need: 2 }
        );
        assert_eq!(manager.stages().len(), 2);

        manager.add_control_point(Vec3::new(1.0, 1.0, -3.0)).unwrap();
        manager.add_control_point(Vec3::new(0.0, 1.0, 0.0)).unwrap();
        assert_eq!(manager.next_stage(), StageTransition::Completed);
        assert!(manager.is_complete());
        assert_eq!(manager.next_stage(), StageTransition::Completed);

        // Outline points were pulled onto the anchor's height
        assert!(manager.stages()[1].iter().all(|p| p.z == 1.0));
    }

    #[test]
    fn test_undo_within_stage() {
        let mut manager = ControlPointManager::new(outline_schema());
        manager.add_control_point(Vec3::ZERO).unwrap();
        manager.add_control_point(Vec3::X).unwrap();

        assert!(manager.undo_last_control_point());
        assert_eq!(manager.current_stage_index(), 1);
        assert!(manager.current_stage().is_empty());
    }

    #[test]
    fn test_undo_across_stage_boundary() {
        let mut manager = ControlPointManager::new(two_stage_schema());
        let a = Vec3::new(1.0, 2.0, 3.0);
        manager.add_control_point(a).unwrap();
        manager.add_control_point(Vec3::new(4.0, 5.0, 6.0)).unwrap();
        assert_eq!(manager.current_stage_index(), 1);

        assert!(manager.undo_last_control_point());

        assert_eq!(manager.current_stage_index(), 0);
        assert_eq!(manager.stages(), &[vec![a]]);
    }

    #[test]
    fn test_undo_nothing() {
        let mut manager = ControlPointManager::new(two_stage_schema());
        assert!(!manager.undo_last_control_point());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_undo_after_complete_is_refused() {
        let mut manager = ControlPointManager::new(two_stage_schema());
        for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
            manager.add_control_point(p).unwrap();
        }
        assert!(!manager.undo_last_control_point());
        assert_eq!(manager.point_count(), 3);
    }

    #[test]
    fn test_temp_point_preview() {
        let mut manager = ControlPointManager::new(square_box_schema());
        manager.add_control_point(Vec3::ZERO).unwrap();
        manager.add_control_point(Vec3::new(2.0, 0.0, 0.0)).unwrap();

        assert!(manager.set_temp_point(Vec3::new(0.0, 5.0, 0.0)));
        let preview = manager.all_stage_control_points();

        assert_eq!(preview.len(), 2);
        assert_vec_eq(preview[1][0], Vec3::new(0.0, 2.0, 0.0));
        // Stored stages are untouched
        assert!(manager.current_stage().is_empty());
        assert_eq!(manager.point_count(), 2);

        manager.add_control_point(Vec3::new(0.0, 5.0, 0.0)).unwrap();
        assert_eq!(manager.temp_point(), None);
    }

    #[test]
    fn test_temp_point_ignored_when_complete() {
        let mut manager = ControlPointManager::new(two_stage_schema());
        for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
            manager.add_control_point(p).unwrap();
        }
        assert!(!manager.set_temp_point(Vec3::Z));
        assert_eq!(manager.all_stage_control_points(), manager.stages().to_vec());
    }

    #[test]
    fn test_square_box_scenario() {
        let mut manager = ControlPointManager::new(square_box_schema());

        manager.add_control_point(Vec3::ZERO).unwrap();
        assert_eq!(
            manager.add_control_point(Vec3::new(2.0, 0.0, 0.0)),
            Ok(StageTransition::Advanced { stage: 1 })
        );
        assert_eq!(
            manager.add_control_point(Vec3::new(0.0, 5.0, 0.0)),
            Ok(StageTransition::Advanced { stage: 2 })
        );
        assert_vec_eq(manager.stages()[1][0], Vec3::new(0.0, 2.0, 0.0));

        assert_eq!(
            manager.add_control_point(Vec3::new(3.0, 4.0, 7.0)),
            Ok(StageTransition::Completed)
        );
        let height = manager.stages()[2][0];
        assert_vec_eq(height, Vec3::new(0.0, 0.0, 7.0));
        assert!(manager.is_complete());
    }

    #[test]
    fn test_set_control_point_requires_completion() {
        let mut manager = ControlPointManager::new(two_stage_schema());
        manager.add_control_point(Vec3::ZERO).unwrap();
        assert_eq!(
            manager.set_control_point(0, Vec3::ONE),
            Err(ControlPointError::SessionIncomplete)
        );
    }

    #[test]
    fn test_set_control_point_reapplies_constraints() {
        let mut manager = ControlPointManager::new(square_box_schema());
        for p in [
            Vec3::ZERO,
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.0, 0.0, 3.0),
        ] {
            manager.add_control_point(p).unwrap();
        }

        // Lengthen the base edge; the width follows
        manager.set_control_point(1, Vec3::new(4.0, 0.0, 0.0)).unwrap();

        assert_vec_eq(manager.stages()[0][1], Vec3::new(4.0, 0.0, 0.0));
        assert_vec_eq(manager.stages()[1][0], Vec3::new(0.0, 4.0, 0.0));
        assert_vec_eq(manager.stages()[2][0], Vec3::new(0.0, 0.0, 3.0));

        // Moving a constrained point projects it again
        manager.set_control_point(3, Vec3::new(1.0, 1.0, 9.0)).unwrap();
        assert_vec_eq(manager.stages()[2][0], Vec3::new(0.0, 0.0, 9.0));

        assert_eq!(
            manager.set_control_point(4, Vec3::ZERO),
            Err(ControlPointError::IndexOutOfRange { index: 4, len: 4 })
        );
    }

    #[test]
    fn test_moving_anchor_reprojects_whole_outline() {
        let mut manager = ControlPointManager::new(outline_schema());
        manager.add_control_point(Vec3::ZERO).unwrap();
        for i in 0..50 {
            let x = i as f32;
            manager.add_control_point(Vec3::new(x, x * 0.5, 3.0)).unwrap();
        }
        assert_eq!(manager.next_stage(), StageTransition::Completed);

        manager.set_control_point(0, Vec3::new(0.0, 0.0, -2.0)).unwrap();

        let outline = &manager.stages()[1];
        assert_eq!(outline.len(), 50);
        assert!(outline.iter().all(|p| p.z == -2.0));
        assert_eq!(outline[49], Vec3::new(49.0, 24.5, -2.0));
    }

    #[test]
    fn test_locate() {
        let mut manager = ControlPointManager::new(two_stage_schema());
        for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
            manager.add_control_point(p).unwrap();
        }
        assert_eq!(manager.locate(0), Some((0, 0)));
        assert_eq!(manager.locate(1), Some((0, 1)));
        assert_eq!(manager.locate(2), Some((1, 0)));
        assert_eq!(manager.locate(3), None);
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut manager = ControlPointManager::new(outline_schema());
        for p in [
            Vec3::new(0.5, -1.25, 2.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.1, 0.7, 0.0),
        ] {
            manager.add_control_point(p).unwrap();
        }
        manager.next_stage();
        let text = manager.serialize();

        let mut restored = ControlPointManager::new(outline_schema());
        restored.deserialize(&text).unwrap();

        assert_eq!(restored.stages(), manager.stages());
        assert!(restored.is_complete());
    }

    #[test]
    fn test_deserialize_in_progress_resumes_next_stage() {
        let mut manager = ControlPointManager::new(two_stage_schema());
        manager.deserialize("1;2;0,0,0;1,0,0").unwrap();

        assert!(!manager.is_complete());
        assert_eq!(manager.current_stage_index(), 1);
        assert_eq!(
            manager.add_control_point(Vec3::Y),
            Ok(StageTransition::Completed)
        );
    }

    #[test]
    fn test_deserialize_failure_resets() {
        let mut manager = ControlPointManager::new(two_stage_schema());
        manager.add_control_point(Vec3::ONE).unwrap();

        assert!(manager.deserialize("2;2;0,0,0;1,0,0;1;oops").is_err());

        assert!(manager.is_empty());
        assert!(!manager.is_complete());
    }

    #[test]
    fn test_deserialize_empty() {
        let mut manager = ControlPointManager::new(two_stage_schema());
        manager.add_control_point(Vec3::ONE).unwrap();
        manager.deserialize("").unwrap();
        assert!(manager.is_empty());
    }

    #[test]
    fn test_change_notifications() {
        let mut manager = ControlPointManager::new(two_stage_schema());
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        manager.subscribe(move |e| sink.borrow_mut().push(*e));

        manager.set_temp_point(Vec3::ONE);
        manager.add_control_point(Vec3::ZERO).unwrap();
        manager.next_stage();
        manager.undo_last_control_point();
        manager.undo_last_control_point();

        assert_eq!(
            *log.borrow(),
            vec![
                ControlPointEvent::TempPointChanged,
                ControlPointEvent::Changed,
                ControlPointEvent::Changed,
            ]
        );
    }

    #[test]
    fn test_edit_and_load_notifications() {
        let mut manager = ControlPointManager::new(two_stage_schema());
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        manager.subscribe(move |e| sink.borrow_mut().push(*e));

        manager.add_control_point(Vec3::ZERO).unwrap();
        assert_eq!(log.borrow().len(), 1);

        // Refused operations stay silent
        assert!(!manager.next_stage().is_success());
        assert!(manager.set_control_point(0, Vec3::ONE).is_err());
        assert!(manager.add_control_point(Vec3::NAN).is_err());
        assert_eq!(log.borrow().len(), 1);

        manager.add_control_point(Vec3::X).unwrap();
        manager.add_control_point(Vec3::Y).unwrap();
        assert_eq!(log.borrow().len(), 3);

        manager.set_control_point(2, Vec3::Z).unwrap();
        assert_eq!(log.borrow().len(), 4);

        assert!(manager.deserialize("two;").is_err());
        assert_eq!(log.borrow().len(), 4);

        manager.deserialize("1;2;0,0,0;1,0,0").unwrap();
        assert_eq!(log.borrow().len(), 5);
        assert!(log.borrow().iter().all(|e| *e == ControlPointEvent::Changed));
    }

    #[test]
    fn test_non_finite_points_rejected() {
        let mut manager = ControlPointManager::new(two_stage_schema());
        let nan = Vec3::new(f32::NAN, 0.0, 0.0);

        assert!(matches!(
            manager.add_control_point(nan),
            Err(ControlPointError::NonFinitePoint(_))
        ));
        assert_eq!(
            manager.add_control_point(Vec3::INFINITY),
            Err(ControlPointError::NonFinitePoint(Vec3::INFINITY))
        );
        assert!(manager.is_empty());

        assert!(!manager.set_temp_point(Vec3::NEG_INFINITY));
        assert_eq!(manager.temp_point(), None);

        for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
            manager.add_control_point(p).unwrap();
        }
        assert!(matches!(
            manager.set_control_point(1, nan),
            Err(ControlPointError::NonFinitePoint(_))
        ));
        assert_eq!(manager.stages()[0][1], Vec3::X);

        let mut restored = ControlPointManager::new(two_stage_schema());
        restored.deserialize(&manager.serialize()).unwrap();
        assert!(restored.is_complete());
    }

    #[test]
    fn test_resume_after_skipping_empty_stage() {
        let schema = StageSchema::new(vec![
            StageDescriptor::exact("base", 3),
            StageDescriptor::unbounded("outline", 0),
            StageDescriptor::exact("height", 1),
        ]);
        let mut manager = ControlPointManager::new(schema.clone());
        for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
            manager.add_control_point(p).unwrap();
        }
        assert_eq!(manager.next_stage(), StageTransition::Advanced { stage: 2 });

        let text = manager.serialize();
        assert!(text.ends_with(";0"));

        // The trailing empty stage is not stored, so the cursor comes back
        // on the skipped stage; advancing again restores the session
        let mut restored = ControlPointManager::new(schema);
        restored.deserialize(&text).unwrap();
        assert_eq!(restored.current_stage_index(), 1);
        assert_eq!(restored.next_stage(), StageTransition::Advanced { stage: 2 });
        assert_eq!(restored.stages(), manager.stages());
    }
}
