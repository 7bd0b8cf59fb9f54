//! Construction stage schema
//!
//! A shape type describes how it is built as an ordered list of stages. The
//! schema is fixed per shape type and never changed by the control-point
//! manager.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constraint::StageConstraint;

/// Stage schema errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("A stage schema needs at least one stage")]
    Empty,

    #[error("Stage '{0}' can never take a point")]
    ZeroCapacity(String),
}

/// One stage of point collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDescriptor {
    /// Name shown while the stage is active
    pub name: String,
    /// Points required before the stage may be left
    pub min_points: usize,
    /// Points after which the stage is left automatically (None = unbounded)
    pub max_points: Option<usize>,
    /// Constraint applied to every point of this stage
    pub constraint: Option<StageConstraint>,
}

impl StageDescriptor {
    /// Stage taking exactly `count` points
    pub fn exact(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            min_points: count,
            max_points: Some(count),
            constraint: None,
        }
    }

    /// Stage taking between `min` and `max` points
    pub fn bounded(name: impl Into<String>, min: usize, max: usize) -> Self {
        Self {
            name: name.into(),
            min_points: min,
            max_points: Some(max.max(min)),
            constraint: None,
        }
    }

    /// Stage taking at least `min` points, left only by an explicit advance
    pub fn unbounded(name: impl Into<String>, min: usize) -> Self {
        Self {
            name: name.into(),
            min_points: min,
            max_points: None,
            constraint: None,
        }
    }

    /// Attach a constraint
    pub fn with_constraint(mut self, constraint: StageConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// Check if a stage holding `len` points is full
    pub fn is_full(&self, len: usize) -> bool {
        self.max_points.is_some_and(|max| len >= max)
    }

    /// Check if a stage holding `len` points may be left
    pub fn accepts_len(&self, len: usize) -> bool {
        len >= self.min_points && self.max_points.is_none_or(|max| len <= max)
    }

    /// Constrain a point against the stages placed so far
    pub fn constrain(&self, point: Vec3, stages: &[Vec<Vec3>]) -> Vec3 {
        match &self.constraint {
            Some(constraint) => constraint.apply(point, stages),
            None => point,
        }
    }
}

/// Ordered, non-empty list of stage descriptors for one shape type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StageDescriptor>", into = "Vec<StageDescriptor>")]
pub struct StageSchema {
    stages: Vec<StageDescriptor>,
}

impl TryFrom<Vec<StageDescriptor>> for StageSchema {
    type Error = SchemaError;

    fn try_from(stages: Vec<StageDescriptor>) -> Result<Self, SchemaError> {
        Self::try_new(stages)
    }
}

impl From<StageSchema> for Vec<StageDescriptor> {
    fn from(schema: StageSchema) -> Self {
        schema.stages
    }
}

impl StageSchema {
    /// Create a schema
    ///
    /// # Panics
    ///
    /// Panics if `stages` is empty or a stage can never take a point.
    pub fn new(stages: Vec<StageDescriptor>) -> Self {
        match Self::try_new(stages) {
            Ok(schema) => schema,
            Err(e) => panic!("{e}"),
        }
    }

    /// Create a schema, rejecting one the control-point manager cannot drive
    pub fn try_new(stages: Vec<StageDescriptor>) -> Result<Self, SchemaError> {
        if stages.is_empty() {
            return Err(SchemaError::Empty);
        }
        if let Some(stage) = stages.iter().find(|s| s.max_points == Some(0)) {
            return Err(SchemaError::ZeroCapacity(stage.name.clone()));
        }
        Ok(Self { stages })
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false, a schema holds at least one stage
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Get a stage descriptor by index
    pub fn get(&self, index: usize) -> Option<&StageDescriptor> {
        self.stages.get(index)
    }

    /// Iterate over the descriptors
    pub fn iter(&self) -> impl Iterator<Item = &StageDescriptor> {
        self.stages.iter()
    }

    /// Index of the last stage
    pub fn last_index(&self) -> usize {
        self.stages.len() - 1
    }
}

impl std::ops::Index<usize> for StageSchema {
    type Output = StageDescriptor;

    fn index(&self, index: usize) -> &StageDescriptor {
        &self.stages[index]
    }
}

/// Anything that knows how it is built
pub trait StageSchemaSource {
    /// The stage schema of this shape type
    fn stage_schema(&self) -> StageSchema;
}
