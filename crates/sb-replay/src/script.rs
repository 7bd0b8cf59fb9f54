//! Construction scripts
//!
//! A script lists shapes and the input each one receives, in RON:
//!
//! ```ron
//! (
//!     document: "demo",
//!     shapes: [
//!         (
//!             name: "crate",
//!             kind: SquareBox,
//!             actions: [Click((0.0, 0.0, 0.0)), Click((2.0, 0.0, 0.0)), Hover((0.0, 5.0, 0.0))],
//!         ),
//!     ],
//! )
//! ```

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use sb_core::SnapConfig;
use sb_shapes::{ConstructionShape, ShapeDocument, ShapeKind};

/// One user input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Place a point
    Click([f32; 3]),
    /// Move the preview point
    Hover([f32; 3]),
    /// Remove the last point
    Undo,
    /// Leave the current stage
    NextStage,
    /// Move a control point of a complete shape
    Move { index: usize, to: [f32; 3] },
    /// Select the shape
    Select,
}

/// Input for one shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeScript {
    pub name: String,
    pub kind: ShapeKind,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// A whole replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    /// Name of the written document
    pub document: String,
    pub shapes: Vec<ShapeScript>,
}

impl ReplayScript {
    pub fn from_ron_str(content: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(content)
    }
}

/// Result of a replay
#[derive(Debug)]
pub struct ReplayOutcome {
    pub shapes: Vec<ConstructionShape>,
    /// Artifact rebuilds requested over the whole run
    pub rebuild_requests: usize,
}

impl ReplayOutcome {
    pub fn document(&self, name: &str) -> ShapeDocument {
        ShapeDocument::from_shapes(name, &self.shapes)
    }
}

/// Replay every shape script
pub fn replay(script: &ReplayScript, snap: &SnapConfig) -> ReplayOutcome {
    let rebuilds = Rc::new(Cell::new(0usize));
    let mut shapes = Vec::with_capacity(script.shapes.len());

    for shape_script in &script.shapes {
        let mut shape = ConstructionShape::new(shape_script.kind, shape_script.name.clone())
            .with_snap(snap.clone());

        let name = shape_script.name.clone();
        let counter = rebuilds.clone();
        shape.subscribe_state(move |event| {
            if event.is_update_request() {
                counter.set(counter.get() + 1);
            }
            tracing::debug!("[{}] {:?}", name, event);
        });

        tracing::info!(
            "Building '{}' ({}), {} actions",
            shape_script.name,
            shape_script.kind.name(),
            shape_script.actions.len()
        );
        for action in &shape_script.actions {
            apply(&mut shape, action);
            rebuild(&mut shape);
        }

        if shape.is_complete() {
            tracing::info!(
                "'{}' complete with {} points",
                shape.name,
                shape.control_points().point_count()
            );
        } else {
            tracing::warn!(
                "'{}' incomplete, waiting in stage '{}'",
                shape.name,
                shape.current_stage_name()
            );
        }
        shapes.push(shape);
    }

    ReplayOutcome {
        shapes,
        rebuild_requests: rebuilds.get(),
    }
}

fn apply(shape: &mut ConstructionShape, action: &Action) {
    match action {
        Action::Click(p) => match shape.add_point(Vec3::from_array(*p)) {
            Ok(transition) => tracing::info!("[{}] click -> {:?}", shape.name, transition),
            Err(e) => tracing::warn!("[{}] click ignored: {}", shape.name, e),
        },
        Action::Hover(p) => {
            if !shape.set_temp_point(Vec3::from_array(*p)) {
                tracing::debug!("[{}] hover ignored", shape.name);
            }
        }
        Action::Undo => {
            if !shape.undo() {
                tracing::warn!("[{}] nothing to undo", shape.name);
            }
        }
        Action::NextStage => {
            let transition = shape.next_stage();
            tracing::info!("[{}] next stage -> {:?}", shape.name, transition);
        }
        Action::Move { index, to } => {
            let moved = shape
                .begin_edit()
                .and_then(|()| shape.move_control_point(*index, Vec3::from_array(*to)));
            shape.end_edit();
            if let Err(e) = moved {
                tracing::warn!("[{}] move ignored: {}", shape.name, e);
            }
        }
        Action::Select => shape.select(),
    }
}

/// Stand-in for a renderer: report what went stale, then mark it rebuilt
fn rebuild(shape: &mut ConstructionShape) {
    let stale = shape.state().invalid_artifacts();
    if !stale.is_empty() {
        let names: Vec<_> = stale.iter().map(|f| f.name()).collect();
        tracing::debug!("[{}] rebuilding {}", shape.name, names.join(", "));
    }
    shape.acknowledge_rebuild();
}
