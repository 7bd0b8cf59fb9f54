//! Shape state flags and invalidation cascade
//!
//! Every shape owns one [`StateManager`]. Flags are independent bits; the
//! relations between them live in a single static table ([`FLAG_RULES`])
//! that says which flags a flag forces and which notification it fires.
//! Raising `ControlPointsInvalid` therefore ends up requesting a rebuild of
//! the vertex, edge and face geometry without any per-setter code.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::signal::{Signal, SubscriptionId};

/// A single state bit of a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StateFlag {
    // ============== Lifecycle ==============
    /// The shape has been created
    Initialized = 0,
    /// Every construction stage has been filled
    Complete,
    /// The last stage advancement was rejected
    Invalid,
    /// The shape is selected in the view
    Selected,
    /// Control points of a complete shape are being edited
    Editing,

    // ============== Updates ==============
    /// Shape parameters changed
    ParametersUpdated,
    /// The preview point changed
    TemporaryPointsUpdated,
    /// Stored control points changed
    ControlPointsInvalid,

    // ============== Invalidation ==============
    /// Vertex buffers need a rebuild
    VertexGeometryInvalid,
    /// Edge buffers need a rebuild
    EdgeGeometryInvalid,
    /// Face buffers need a rebuild
    FaceGeometryInvalid,
    /// Aggregate of vertex, edge and face geometry
    GeometryInvalid,
    /// Bounding box needs a recompute
    BoundingBoxInvalid,
    /// Material needs a refresh
    MaterialInvalid,
    /// Texture needs a refresh
    TextureInvalid,
    /// Transform needs a recompute
    TransformInvalid,
    /// Spatial index needs a rebuild
    OctreeInvalid,
    /// Cached draw commands need a rebuild
    DisplayListInvalid,
}

impl StateFlag {
    /// All flags in bit order
    pub const ALL: [StateFlag; 18] = [
        StateFlag::Initialized,
        StateFlag::Complete,
        StateFlag::Invalid,
        StateFlag::Selected,
        StateFlag::Editing,
        StateFlag::ParametersUpdated,
        StateFlag::TemporaryPointsUpdated,
        StateFlag::ControlPointsInvalid,
        StateFlag::VertexGeometryInvalid,
        StateFlag::EdgeGeometryInvalid,
        StateFlag::FaceGeometryInvalid,
        StateFlag::GeometryInvalid,
        StateFlag::BoundingBoxInvalid,
        StateFlag::MaterialInvalid,
        StateFlag::TextureInvalid,
        StateFlag::TransformInvalid,
        StateFlag::OctreeInvalid,
        StateFlag::DisplayListInvalid,
    ];

    /// Flags touched by the batch invalidate/clear operations
    pub const INVALIDATION: [StateFlag; 10] = [
        StateFlag::VertexGeometryInvalid,
        StateFlag::EdgeGeometryInvalid,
        StateFlag::FaceGeometryInvalid,
        StateFlag::GeometryInvalid,
        StateFlag::BoundingBoxInvalid,
        StateFlag::MaterialInvalid,
        StateFlag::TextureInvalid,
        StateFlag::TransformInvalid,
        StateFlag::OctreeInvalid,
        StateFlag::DisplayListInvalid,
    ];

    /// Flags standing for a derived artifact a renderer rebuilds
    pub const ARTIFACTS: [StateFlag; 9] = [
        StateFlag::VertexGeometryInvalid,
        StateFlag::EdgeGeometryInvalid,
        StateFlag::FaceGeometryInvalid,
        StateFlag::BoundingBoxInvalid,
        StateFlag::MaterialInvalid,
        StateFlag::TextureInvalid,
        StateFlag::TransformInvalid,
        StateFlag::OctreeInvalid,
        StateFlag::DisplayListInvalid,
    ];

    /// Bit mask of this flag
    pub const fn bit(self) -> u32 {
        1 << self as u32
    }

    /// Get the display name of the flag
    pub fn name(self) -> &'static str {
        match self {
            StateFlag::Initialized => "Initialized",
            StateFlag::Complete => "Complete",
            StateFlag::Invalid => "Invalid",
            StateFlag::Selected => "Selected",
            StateFlag::Editing => "Editing",
            StateFlag::ParametersUpdated => "ParametersUpdated",
            StateFlag::TemporaryPointsUpdated => "TemporaryPointsUpdated",
            StateFlag::ControlPointsInvalid => "ControlPointsInvalid",
            StateFlag::VertexGeometryInvalid => "VertexGeometryInvalid",
            StateFlag::EdgeGeometryInvalid => "EdgeGeometryInvalid",
            StateFlag::FaceGeometryInvalid => "FaceGeometryInvalid",
            StateFlag::GeometryInvalid => "GeometryInvalid",
            StateFlag::BoundingBoxInvalid => "BoundingBoxInvalid",
            StateFlag::MaterialInvalid => "MaterialInvalid",
            StateFlag::TextureInvalid => "TextureInvalid",
            StateFlag::TransformInvalid => "TransformInvalid",
            StateFlag::OctreeInvalid => "OctreeInvalid",
            StateFlag::DisplayListInvalid => "DisplayListInvalid",
        }
    }

    /// The rule describing this flag's cascade and notifications
    pub fn rule(self) -> &'static FlagRule {
        &FLAG_RULES[self as usize]
    }
}

impl fmt::Display for StateFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of [`StateFlag`]s stored as a bit mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StateFlags(u32);

impl StateFlags {
    /// The empty set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build a set from a slice of flags
    pub const fn from_slice(flags: &[StateFlag]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < flags.len() {
            bits |= flags[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// Check if the flag is in the set
    pub const fn contains(self, flag: StateFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Check if the set is empty
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Add a flag, returns true if it was not already present
    pub fn insert(&mut self, flag: StateFlag) -> bool {
        let was_set = self.contains(flag);
        self.0 |= flag.bit();
        !was_set
    }

    /// Remove a flag, returns true if it was present
    pub fn remove(&mut self, flag: StateFlag) -> bool {
        let was_set = self.contains(flag);
        self.0 &= !flag.bit();
        was_set
    }

    /// Flags present in `self` but not in `other`
    pub const fn difference(self, other: StateFlags) -> StateFlags {
        StateFlags(self.0 & !other.0)
    }

    /// Iterate over the flags in bit order
    pub fn iter(self) -> impl Iterator<Item = StateFlag> {
        StateFlag::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl From<StateFlag> for StateFlags {
    fn from(flag: StateFlag) -> Self {
        Self(flag.bit())
    }
}

impl BitOr for StateFlags {
    type Output = StateFlags;

    fn bitor(self, rhs: StateFlags) -> StateFlags {
        StateFlags(self.0 | rhs.0)
    }
}

impl BitOr<StateFlag> for StateFlags {
    type Output = StateFlags;

    fn bitor(self, rhs: StateFlag) -> StateFlags {
        StateFlags(self.0 | rhs.bit())
    }
}

impl BitOrAssign<StateFlag> for StateFlags {
    fn bitor_assign(&mut self, rhs: StateFlag) {
        self.0 |= rhs.bit();
    }
}

impl FromIterator<StateFlag> for StateFlags {
    fn from_iter<I: IntoIterator<Item = StateFlag>>(iter: I) -> Self {
        iter.into_iter().fold(StateFlags::empty(), |set, f| set | f)
    }
}

/// Notification fired by a [`StateManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateEvent {
    /// The shape became complete
    Completed,
    /// A stage advancement was rejected
    Invalidated,
    /// The shape was selected
    Selected,
    /// The shape was deselected
    Deselected,
    /// Editing of control points started
    EditingStarted,
    /// Editing of control points finished
    EditingFinished,
    /// Shape parameters changed
    ParametersChanged,
    /// The preview point changed
    TemporaryPointsChanged,
    /// Stored control points changed
    ControlPointsChanged,
    /// Vertex geometry must be rebuilt
    UpdateVertexGeometry,
    /// Edge geometry must be rebuilt
    UpdateEdgeGeometry,
    /// Face geometry must be rebuilt
    UpdateFaceGeometry,
    /// Bounding box must be recomputed
    UpdateBoundingBox,
    /// Material must be refreshed
    UpdateMaterial,
    /// Texture must be refreshed
    UpdateTexture,
    /// Transform must be recomputed
    UpdateTransform,
    /// Spatial index must be rebuilt
    UpdateOctree,
    /// Draw commands must be rebuilt
    UpdateDisplayList,
}

impl StateEvent {
    /// Check if this event asks a renderer to rebuild an artifact
    pub fn is_update_request(&self) -> bool {
        matches!(
            self,
            StateEvent::UpdateVertexGeometry
                | StateEvent::UpdateEdgeGeometry
                | StateEvent::UpdateFaceGeometry
                | StateEvent::UpdateBoundingBox
                | StateEvent::UpdateMaterial
                | StateEvent::UpdateTexture
                | StateEvent::UpdateTransform
                | StateEvent::UpdateOctree
                | StateEvent::UpdateDisplayList
        )
    }
}

/// Cascade and notification rule of one flag
#[derive(Debug)]
pub struct FlagRule {
    /// The flag this rule belongs to
    pub flag: StateFlag,
    /// Flags forced on whenever this flag is set
    pub implies: &'static [StateFlag],
    /// Fired on the 0 -> 1 transition
    pub on_set: Option<StateEvent>,
    /// Fired on the 1 -> 0 transition
    pub on_clear: Option<StateEvent>,
}

const fn rule(
    flag: StateFlag,
    implies: &'static [StateFlag],
    on_set: Option<StateEvent>,
    on_clear: Option<StateEvent>,
) -> FlagRule {
    FlagRule {
        flag,
        implies,
        on_set,
        on_clear,
    }
}

const GEOMETRY_PARTS: &[StateFlag] = &[
    StateFlag::VertexGeometryInvalid,
    StateFlag::EdgeGeometryInvalid,
    StateFlag::FaceGeometryInvalid,
];

/// Dependency table, indexed by flag discriminant
pub static FLAG_RULES: [FlagRule; 18] = [
    rule(StateFlag::Initialized, &[], None, None),
    rule(StateFlag::Complete, &[], Some(StateEvent::Completed), None),
    rule(StateFlag::Invalid, &[], Some(StateEvent::Invalidated), None),
    rule(
        StateFlag::Selected,
        &[],
        Some(StateEvent::Selected),
        Some(StateEvent::Deselected),
    ),
    rule(
        StateFlag::Editing,
        &[],
        Some(StateEvent::EditingStarted),
        Some(StateEvent::EditingFinished),
    ),
    rule(
        StateFlag::ParametersUpdated,
        &[StateFlag::GeometryInvalid],
        Some(StateEvent::ParametersChanged),
        None,
    ),
    rule(
        StateFlag::TemporaryPointsUpdated,
        &[],
        Some(StateEvent::TemporaryPointsChanged),
        None,
    ),
    rule(
        StateFlag::ControlPointsInvalid,
        &[StateFlag::GeometryInvalid],
        Some(StateEvent::ControlPointsChanged),
        None,
    ),
    rule(
        StateFlag::VertexGeometryInvalid,
        &[],
        Some(StateEvent::UpdateVertexGeometry),
        None,
    ),
    rule(
        StateFlag::EdgeGeometryInvalid,
        &[],
        Some(StateEvent::UpdateEdgeGeometry),
        None,
    ),
    rule(
        StateFlag::FaceGeometryInvalid,
        &[],
        Some(StateEvent::UpdateFaceGeometry),
        None,
    ),
    rule(StateFlag::GeometryInvalid, GEOMETRY_PARTS, None, None),
    rule(
        StateFlag::BoundingBoxInvalid,
        &[],
        Some(StateEvent::UpdateBoundingBox),
        None,
    ),
    rule(
        StateFlag::MaterialInvalid,
        &[],
        Some(StateEvent::UpdateMaterial),
        None,
    ),
    rule(
        StateFlag::TextureInvalid,
        &[],
        Some(StateEvent::UpdateTexture),
        None,
    ),
    rule(
        StateFlag::TransformInvalid,
        &[],
        Some(StateEvent::UpdateTransform),
        None,
    ),
    rule(
        StateFlag::OctreeInvalid,
        &[],
        Some(StateEvent::UpdateOctree),
        None,
    ),
    rule(
        StateFlag::DisplayListInvalid,
        &[],
        Some(StateEvent::UpdateDisplayList),
        None,
    ),
];

/// Owns the state flags of one shape and notifies subscribers of transitions
///
/// Subscribers run synchronously while the flag is being set, so a cascade
/// has delivered all of its notifications by the time `set` returns.
#[derive(Debug)]
pub struct StateManager {
    flags: StateFlags,
    events: Signal<StateEvent>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    /// Create a manager holding only `Initialized`
    pub fn new() -> Self {
        Self {
            flags: StateFlag::Initialized.into(),
            events: Signal::new(),
        }
    }

    /// Current flag set
    pub fn flags(&self) -> StateFlags {
        self.flags
    }

    /// Check if a flag is set
    pub fn is_set(&self, flag: StateFlag) -> bool {
        self.flags.contains(flag)
    }

    /// Register a notification callback
    pub fn subscribe(&mut self, callback: impl FnMut(&StateEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(callback)
    }

    /// Remove a notification callback
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Set a flag and everything it implies
    ///
    /// The flag's own notification fires only on the 0 -> 1 transition, so
    /// setting an already-set flag is silent. It is not a no-op for its
    /// dependents: implied flags are still driven, so an artifact cleared by
    /// a rebuild goes stale again when its source is raised a second time.
    /// Dependents that are already set fire nothing either.
    pub fn set(&mut self, flag: StateFlag) {
        let rule = flag.rule();
        if self.flags.insert(flag) {
            tracing::trace!("State flag {} set", flag);
            if let Some(event) = rule.on_set {
                self.events.emit(&event);
            }
        }
        for &implied in rule.implies {
            self.set(implied);
        }
    }

    /// Clear a single flag, firing its paired notification if it has one
    pub fn clear(&mut self, flag: StateFlag) {
        if self.flags.remove(flag) {
            tracing::trace!("State flag {} cleared", flag);
            if let Some(event) = flag.rule().on_clear {
                self.events.emit(&event);
            }
        }
    }

    /// Set or clear a flag
    pub fn set_value(&mut self, flag: StateFlag, value: bool) {
        if value {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// Mark every invalidation flag in one step
    ///
    /// Fires one update request per artifact that was clean before.
    pub fn set_all_invalid(&mut self) {
        let mask = StateFlags::from_slice(&StateFlag::INVALIDATION);
        let newly = mask.difference(self.flags);
        self.flags = self.flags | mask;

        for artifact in StateFlag::ARTIFACTS {
            if newly.contains(artifact)
                && let Some(event) = artifact.rule().on_set
            {
                self.events.emit(&event);
            }
        }
    }

    /// Clear every invalidation flag without notifications
    pub fn clear_all_invalid(&mut self) {
        let mask = StateFlags::from_slice(&StateFlag::INVALIDATION);
        self.flags = self.flags.difference(mask);
    }

    /// Reset to `{Initialized}` without notifications
    pub fn reset(&mut self) {
        self.flags = StateFlag::Initialized.into();
    }

    /// Artifacts currently waiting for a rebuild
    pub fn invalid_artifacts(&self) -> StateFlags {
        StateFlag::ARTIFACTS
            .into_iter()
            .filter(|f| self.flags.contains(*f))
            .collect()
    }

    pub fn is_initialized(&self) -> bool {
        self.is_set(StateFlag::Initialized)
    }

    pub fn is_complete(&self) -> bool {
        self.is_set(StateFlag::Complete)
    }

    pub fn is_invalid(&self) -> bool {
        self.is_set(StateFlag::Invalid)
    }

    pub fn is_selected(&self) -> bool {
        self.is_set(StateFlag::Selected)
    }

    pub fn is_editing(&self) -> bool {
        self.is_set(StateFlag::Editing)
    }
}
