//! Global constants for sb-core

/// Length below which vectors, edges and normals are treated as degenerate
pub const GEOMETRY_EPSILON: f32 = 1e-6;

/// Default grid spacing used when snapping raw input points
pub const DEFAULT_GRID_SPACING: f32 = 1.0;

/// Default tracing filter for the replay tool
pub const DEFAULT_LOG_FILTER: &str = "sb_replay=info,sb_shapes=info,sb_cad=debug";
