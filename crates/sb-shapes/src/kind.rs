//! Shape kinds and their construction stages

use serde::{Deserialize, Serialize};

use sb_cad::{
    ConstraintFn, StageDescriptor, StageSchema, StageSchemaSource, combine, create_constraint_call,
};

/// Shape types that can be built point by point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Box from a base edge, a perpendicular width and a height
    #[default]
    Box,
    /// Box whose width equals its base edge
    SquareBox,
    /// Cone from a base circle and an apex on its axis
    Cone,
    /// Prism over a planar outline
    Prism,
    /// Building from a ground footprint and a roof height
    Building,
}

impl ShapeKind {
    /// All shape kinds
    pub fn all() -> [ShapeKind; 5] {
        [
            ShapeKind::Box,
            ShapeKind::SquareBox,
            ShapeKind::Cone,
            ShapeKind::Prism,
            ShapeKind::Building,
        ]
    }

    /// Get the display name of the shape kind
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Box => "Box",
            ShapeKind::SquareBox => "Square Box",
            ShapeKind::Cone => "Cone",
            ShapeKind::Prism => "Prism",
            ShapeKind::Building => "Building",
        }
    }
}

impl StageSchemaSource for ShapeKind {
    fn stage_schema(&self) -> StageSchema {
        match self {
            ShapeKind::Box => box_schema(false),
            ShapeKind::SquareBox => box_schema(true),
            ShapeKind::Cone => cone_schema(),
            ShapeKind::Prism => prism_schema(),
            ShapeKind::Building => building_schema(),
        }
    }
}

/// Base edge A-B, width from A orthogonal to AB, height along the base normal
fn box_schema(square: bool) -> StageSchema {
    let perpendicular =
        create_constraint_call(ConstraintFn::PerpendicularToLastTwoPoints, &[(0, 1), (0, 0)]);
    let width = if square {
        combine([
            perpendicular,
            create_constraint_call(ConstraintFn::Circle, &[(0, 0), (0, 1)]),
        ])
    } else {
        perpendicular
    };

    StageSchema::new(vec![
        StageDescriptor::exact("Base edge", 2),
        StageDescriptor::exact("Width", 1).with_constraint(width),
        StageDescriptor::exact("Height", 1).with_constraint(create_constraint_call(
            ConstraintFn::PerpendicularToCirclePlane,
            &[(0, 0), (0, 1), (1, 0)],
        )),
    ])
}

fn cone_schema() -> StageSchema {
    StageSchema::new(vec![
        StageDescriptor::exact("Base center", 1),
        StageDescriptor::exact("Base radius", 1),
        StageDescriptor::exact("Base orientation", 1).with_constraint(create_constraint_call(
            ConstraintFn::Circle,
            &[(0, 0), (1, 0)],
        )),
        StageDescriptor::exact("Apex", 1).with_constraint(create_constraint_call(
            ConstraintFn::PerpendicularToCirclePlane,
            &[(0, 0), (1, 0), (2, 0)],
        )),
    ])
}

fn prism_schema() -> StageSchema {
    let base = [(0, 0), (0, 1), (0, 2)];
    StageSchema::new(vec![
        StageDescriptor::exact("Base plane", 3),
        StageDescriptor::unbounded("Base outline", 0)
            .with_constraint(create_constraint_call(ConstraintFn::Plane, &base)),
        StageDescriptor::exact("Height", 1)
            .with_constraint(create_constraint_call(ConstraintFn::VerticalToBase, &base)),
    ])
}

fn building_schema() -> StageSchema {
    StageSchema::new(vec![
        StageDescriptor::exact("Ground corner", 1),
        StageDescriptor::unbounded("Footprint", 2)
            .with_constraint(create_constraint_call(ConstraintFn::ZPlane, &[(0, 0)])),
        StageDescriptor::exact("Roof height", 1).with_constraint(create_constraint_call(
            ConstraintFn::VerticalToBase,
            &[(0, 0), (1, 0), (1, 1)],
        )),
    ])
}
