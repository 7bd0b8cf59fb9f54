//! Shape document serialization

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sb_cad::PersistError;

use crate::kind::ShapeKind;
use crate::shape::ConstructionShape;

/// Current document format version
pub const DOCUMENT_VERSION: u32 = 1;

/// Stored form of one shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    pub id: Uuid,
    pub name: String,
    pub kind: ShapeKind,
    /// Control points in the staged text format
    pub control_points: String,
}

impl From<&ConstructionShape> for ShapeRecord {
    fn from(shape: &ConstructionShape) -> Self {
        Self {
            id: shape.id,
            name: shape.name.clone(),
            kind: shape.kind(),
            control_points: shape.serialize_control_points(),
        }
    }
}

impl ShapeRecord {
    /// Rebuild the shape, replaying its control points
    pub fn to_shape(&self) -> Result<ConstructionShape, DocumentError> {
        let mut shape = ConstructionShape::with_id(self.id, self.kind, self.name.clone());
        shape
            .restore_control_points(&self.control_points)
            .map_err(|source| DocumentError::ControlPoints {
                shape: self.name.clone(),
                source,
            })?;
        Ok(shape)
    }
}

/// File holding a set of shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDocument {
    /// File format version
    pub version: u32,
    /// Document name
    pub name: String,
    /// Shapes in creation order
    pub shapes: Vec<ShapeRecord>,
}

impl Default for ShapeDocument {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl ShapeDocument {
    /// Create an empty document
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            name: name.into(),
            shapes: Vec::new(),
        }
    }

    /// Create a document from live shapes
    pub fn from_shapes<'a>(
        name: impl Into<String>,
        shapes: impl IntoIterator<Item = &'a ConstructionShape>,
    ) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            name: name.into(),
            shapes: shapes.into_iter().map(ShapeRecord::from).collect(),
        }
    }

    /// Add a shape, returns its ID
    pub fn add_shape(&mut self, shape: &ConstructionShape) -> Uuid {
        self.shapes.push(ShapeRecord::from(shape));
        shape.id
    }

    /// Rebuild every shape
    pub fn to_shapes(&self) -> Result<Vec<ConstructionShape>, DocumentError> {
        self.shapes.iter().map(ShapeRecord::to_shape).collect()
    }

    /// Save document to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let content = self.to_bytes()?;
        std::fs::write(path, content).map_err(|e| DocumentError::Io(e.to_string()))?;
        tracing::info!("Saved {} shapes to {}", self.shapes.len(), path.display());
        Ok(())
    }

    /// Serialize document to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| DocumentError::Serialize(e.to_string()))?;
        Ok(content.into_bytes())
    }

    /// Load document from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| DocumentError::Io(e.to_string()))?;
        let document: ShapeDocument =
            ron::from_str(&content).map_err(|e| DocumentError::Deserialize(e.to_string()))?;
        Ok(document)
    }

    /// Load document from bytes
    pub fn load_from_bytes(data: &[u8]) -> Result<Self, DocumentError> {
        let content =
            std::str::from_utf8(data).map_err(|e| DocumentError::Deserialize(e.to_string()))?;
        let document: ShapeDocument =
            ron::from_str(content).map_err(|e| DocumentError::Deserialize(e.to_string()))?;
        Ok(document)
    }
}

/// Document-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Invalid control points in shape '{shape}': {source}")]
    ControlPoints {
        shape: String,
        #[source]
        source: PersistError,
    },
}
