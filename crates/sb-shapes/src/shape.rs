//! Shape under construction
//!
//! [`ConstructionShape`] ties a control-point session to the state flags of
//! one shape: every change to the stored points raises
//! `ControlPointsInvalid`, stage outcomes raise `Complete` or `Invalid`.

use glam::Vec3;
use uuid::Uuid;

use sb_cad::{
    ControlPointError, ControlPointEvent, ControlPointManager, ControlPointResult, PersistError,
    StageSchemaSource, StageTransition,
};
use sb_core::{SnapConfig, StateEvent, StateFlag, StateManager, SubscriptionId};

use crate::kind::ShapeKind;

/// A shape built from staged, constrained control points
#[derive(Debug)]
pub struct ConstructionShape {
    /// Unique identifier
    pub id: Uuid,
    /// Shape name
    pub name: String,
    kind: ShapeKind,
    points: ControlPointManager,
    state: StateManager,
    snap: SnapConfig,
}

impl ConstructionShape {
    /// Create an empty shape of the given kind
    pub fn new(kind: ShapeKind, name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), kind, name)
    }

    /// Create an empty shape with a known identifier
    pub fn with_id(id: Uuid, kind: ShapeKind, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            points: ControlPointManager::new(kind.stage_schema()),
            state: StateManager::new(),
            snap: SnapConfig::default(),
        }
    }

    /// Snap raw input to a grid before it is constrained
    pub fn with_snap(mut self, snap: SnapConfig) -> Self {
        self.snap = snap;
        self
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn control_points(&self) -> &ControlPointManager {
        &self.points
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Name of the stage waiting for input
    pub fn current_stage_name(&self) -> &str {
        &self.points.current_descriptor().name
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Register a state notification callback
    pub fn subscribe_state(
        &mut self,
        callback: impl FnMut(&StateEvent) + 'static,
    ) -> SubscriptionId {
        self.state.subscribe(callback)
    }

    /// Register a control point notification callback
    pub fn subscribe_points(
        &mut self,
        callback: impl FnMut(&ControlPointEvent) + 'static,
    ) -> SubscriptionId {
        self.points.subscribe(callback)
    }

    // ============== Construction ==============

    /// Place a clicked point
    pub fn add_point(&mut self, raw: Vec3) -> ControlPointResult<StageTransition> {
        let transition = self.points.add_control_point(self.snap.snap_point(raw))?;
        self.state.clear(StateFlag::Invalid);
        self.state.set(StateFlag::ControlPointsInvalid);
        self.apply_transition(transition);
        Ok(transition)
    }

    /// Leave the current stage
    pub fn next_stage(&mut self) -> StageTransition {
        let transition = self.points.next_stage();
        if transition.is_success() {
            self.state.clear(StateFlag::Invalid);
        }
        self.apply_transition(transition);
        transition
    }

    /// Undo the last placed point
    pub fn undo(&mut self) -> bool {
        if !self.points.undo_last_control_point() {
            return false;
        }
        self.state.clear(StateFlag::Invalid);
        self.state.set(StateFlag::ControlPointsInvalid);
        true
    }

    fn apply_transition(&mut self, transition: StageTransition) {
        match transition {
            StageTransition::Completed => self.state.set(StateFlag::Complete),
            StageTransition::Rejected { .. } => self.state.set(StateFlag::Invalid),
            StageTransition::Stayed | StageTransition::Advanced { .. } => {}
        }
    }

    // ============== Preview ==============

    /// Update the hover preview
    pub fn set_temp_point(&mut self, raw: Vec3) -> bool {
        if !self.points.set_temp_point(self.snap.snap_point(raw)) {
            return false;
        }
        self.state.set(StateFlag::TemporaryPointsUpdated);
        true
    }

    /// Drop the hover preview
    pub fn clear_temp_point(&mut self) {
        if self.points.temp_point().is_some() {
            self.points.clear_temp_point();
            self.state.set(StateFlag::TemporaryPointsUpdated);
        }
    }

    /// Stages to draw, including the constrained preview point
    pub fn preview_points(&self) -> Vec<Vec<Vec3>> {
        self.points.all_stage_control_points()
    }

    // ============== Editing ==============

    /// Start editing the points of a complete shape
    pub fn begin_edit(&mut self) -> ControlPointResult<()> {
        if !self.points.is_complete() {
            return Err(ControlPointError::SessionIncomplete);
        }
        self.state.set(StateFlag::Editing);
        Ok(())
    }

    /// Move a control point, keeping every stage constraint satisfied
    pub fn move_control_point(&mut self, index: usize, raw: Vec3) -> ControlPointResult<()> {
        self.points
            .set_control_point(index, self.snap.snap_point(raw))?;
        self.state.set(StateFlag::ControlPointsInvalid);
        Ok(())
    }

    /// Finish editing
    pub fn end_edit(&mut self) {
        self.state.clear(StateFlag::Editing);
    }

    // ============== Selection ==============

    pub fn select(&mut self) {
        self.state.set(StateFlag::Selected);
    }

    pub fn deselect(&mut self) {
        self.state.clear(StateFlag::Selected);
    }

    // ============== Rebuild ==============

    /// Called once derived artifacts have been rebuilt
    pub fn acknowledge_rebuild(&mut self) {
        self.state.clear(StateFlag::ControlPointsInvalid);
        self.state.clear(StateFlag::ParametersUpdated);
        self.state.clear(StateFlag::TemporaryPointsUpdated);
        self.state.clear_all_invalid();
    }

    // ============== Persistence ==============

    /// Encode the control points
    pub fn serialize_control_points(&self) -> String {
        self.points.serialize()
    }

    /// Replace the control points with decoded ones
    ///
    /// State flags are reset and every artifact is marked stale. On error the
    /// shape is left empty.
    pub fn restore_control_points(&mut self, text: &str) -> Result<(), PersistError> {
        let result = self.points.deserialize(text);
        self.state.reset();
        if self.points.is_complete() {
            self.state.set(StateFlag::Complete);
        }
        self.state.set_all_invalid();
        result
    }
}
