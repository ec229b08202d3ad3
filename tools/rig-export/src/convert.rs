//! Axis conversion (right-handed Z-up source → Y-up target)
//!
//! Source `(x, y, z)` maps to target `(x, z, -y)`. Points are then scaled and shifted;
//! directions (normals, bone segments) only get the axis remap.

use glam::{Mat3, Vec3};

/// Up axis of the source convention
pub const SOURCE_UP: Vec3 = Vec3::Z;

/// Maps source-space points and directions into the target frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisConverter {
    pub scale: f32,
    /// Added after scaling, in target space
    pub shift: Vec3,
}

impl AxisConverter {
    pub fn new(scale: f32, shift: Vec3) -> Self {
        Self { scale, shift }
    }

    /// Remap, scale and shift a point
    pub fn convert_point(&self, p: Vec3) -> Vec3 {
        remap_axes(p) * self.scale + self.shift
    }

    /// Remap a direction (no scale, no shift)
    pub fn convert_direction(&self, v: Vec3) -> Vec3 {
        remap_axes(v)
    }
}

/// `(x, y, z) → (x, z, -y)`
pub fn remap_axes(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, -v.y)
}

/// Axis each joint's bounding box extends along in the target frame
pub fn bone_axis() -> Vec3 {
    remap_axes(SOURCE_UP)
}

/// Why [`rotation_between`] fell back to the identity for a vector pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    /// One of the vectors has no direction
    ZeroLength,
    /// The vectors point in opposite directions; identity is not a 180° turn
    AntiParallel,
}

/// Rotation taking direction `a` onto direction `b`.
///
/// Both inputs are normalized first. Uses Rodrigues' formula on the unnormalized
/// cross product: `R = I + [v]x + [v]x² · (1 - c) / s²` with `v = a × b`,
/// `s = |v|`, `c = a · b`. When `s == 0` the identity is returned, which is exact for
/// parallel vectors and wrong for anti-parallel ones (see [`degeneracy`]).
pub fn rotation_between(a: Vec3, b: Vec3) -> Mat3 {
    let (Some(a), Some(b)) = (a.try_normalize(), b.try_normalize()) else {
        return Mat3::IDENTITY;
    };

    let v = a.cross(b);
    let s = v.length();
    if s == 0.0 {
        return Mat3::IDENTITY;
    }
    let c = a.dot(b);

    // Columns of the skew-symmetric cross-product matrix [v]x
    let k = Mat3::from_cols(
        Vec3::new(0.0, v.z, -v.y),
        Vec3::new(-v.z, 0.0, v.x),
        Vec3::new(v.y, -v.x, 0.0),
    );

    Mat3::IDENTITY + k + (k * k) * ((1.0 - c) / (s * s))
}

/// Classify a pair that [`rotation_between`] cannot rotate correctly
pub fn degeneracy(a: Vec3, b: Vec3) -> Option<Degeneracy> {
    let (Some(a), Some(b)) = (a.try_normalize(), b.try_normalize()) else {
        return Some(Degeneracy::ZeroLength);
    };
    if a.cross(b).length() == 0.0 && a.dot(b) < 0.0 {
        return Some(Degeneracy::AntiParallel);
    }
    None
}

/// Row-major flattening of a 3×3 matrix
pub fn to_row_major(m: &Mat3) -> [f32; 9] {
    m.transpose().to_cols_array()
}
