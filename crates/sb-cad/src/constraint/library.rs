//! Geometric projection functions
//!
//! Each function takes a candidate point plus a flat list of reference points
//! and returns the adjusted point. None of them fail: when the references are
//! missing or degenerate they fall back to a weaker constraint or return the
//! candidate unchanged.

use glam::Vec3;
use sb_core::constants::GEOMETRY_EPSILON;

/// Return the candidate unchanged
pub fn none(point: Vec3, _refs: &[Vec3]) -> Vec3 {
    point
}

/// Project onto the plane through `refs[0..3]`
///
/// Collinear references degrade to [`line`] through the first two.
pub fn plane(point: Vec3, refs: &[Vec3]) -> Vec3 {
    if refs.len() < 3 {
        return line(point, refs);
    }
    let (a, b, c) = (refs[0], refs[1], refs[2]);
    let normal = (b - a).cross(c - a);
    if normal.length() < GEOMETRY_EPSILON {
        return line(point, &refs[..2]);
    }
    let normal = normal.normalize();
    point - normal * (point - a).dot(normal)
}

/// Project onto the infinite line through `refs[0]` and `refs[1]`
pub fn line(point: Vec3, refs: &[Vec3]) -> Vec3 {
    if refs.len() < 2 {
        return point;
    }
    let (a, b) = (refs[0], refs[1]);
    let dir = b - a;
    if dir.length() < GEOMETRY_EPSILON {
        return point;
    }
    let dir = dir.normalize();
    a + dir * (point - a).dot(dir)
}

/// Keep x and y, take z from the first reference (0 without references)
pub fn z_plane(point: Vec3, refs: &[Vec3]) -> Vec3 {
    let z = refs.first().map_or(0.0, |r| r.z);
    Vec3::new(point.x, point.y, z)
}

/// Project onto the axis through the centroid of the reference polygon,
/// along its normal
pub fn vertical_to_base(point: Vec3, refs: &[Vec3]) -> Vec3 {
    if refs.len() < 3 {
        return point;
    }
    let centroid = refs.iter().copied().sum::<Vec3>() / refs.len() as f32;
    let normal = polygon_normal(refs);
    if normal.length() < GEOMETRY_EPSILON {
        return point;
    }
    let normal = normal.normalize();
    centroid + normal * (point - centroid).dot(normal)
}

/// Keep only the part of `point - B` orthogonal to AB, anchored at B
pub fn perpendicular_to_last_two_points(point: Vec3, refs: &[Vec3]) -> Vec3 {
    if refs.len() < 2 {
        return point;
    }
    let (a, b) = (refs[0], refs[1]);
    let edge = b - a;
    if edge.length() < GEOMETRY_EPSILON {
        return point;
    }
    let dir = edge.normalize();
    let offset = point - b;
    b + (offset - dir * offset.dot(dir))
}

/// Snap onto the sphere centred at A with radius |AB|
///
/// A candidate on the centre, or a zero radius, yields B.
pub fn circle(point: Vec3, refs: &[Vec3]) -> Vec3 {
    if refs.len() < 2 {
        return point;
    }
    let (a, b) = (refs[0], refs[1]);
    snap_to_radius(point, a, (b - a).length()).unwrap_or(b)
}

/// Project onto the axis of the circle centred at A through B and C
pub fn perpendicular_to_circle_plane(point: Vec3, refs: &[Vec3]) -> Vec3 {
    if refs.len() < 3 {
        return point;
    }
    let (a, b, c) = (refs[0], refs[1], refs[2]);
    let normal = (b - a).cross(c - a);
    if normal.length() < GEOMETRY_EPSILON {
        return point;
    }
    let normal = normal.normalize();
    a + normal * (point - a).dot(normal)
}

/// Make the segment from the anchor to the result as long as AB
///
/// The anchor is C when three references are given, A otherwise. Degenerate
/// input yields `anchor + (B - A)`.
pub fn equal_length(point: Vec3, refs: &[Vec3]) -> Vec3 {
    if refs.len() < 2 {
        return point;
    }
    let (a, b) = (refs[0], refs[1]);
    let anchor = refs.get(2).copied().unwrap_or(a);
    snap_to_radius(point, anchor, (b - a).length()).unwrap_or(anchor + (b - a))
}

fn snap_to_radius(point: Vec3, center: Vec3, radius: f32) -> Option<Vec3> {
    let offset = point - center;
    if offset.length() < GEOMETRY_EPSILON || radius < GEOMETRY_EPSILON {
        return None;
    }
    Some(center + offset.normalize() * radius)
}

/// Newell normal of a (possibly non-planar) polygon, not normalized
fn polygon_normal(points: &[Vec3]) -> Vec3 {
    let mut normal = Vec3::ZERO;
    for (i, current) in points.iter().enumerate() {
        let next = points[(i + 1) % points.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}
