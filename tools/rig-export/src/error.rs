//! Export error types

use thiserror::Error;

/// Why an export was refused.
///
/// Every variant is terminal for the export call that produced it; nothing is written.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    /// The import step never marked this object as prepared
    #[error("{kind} '{name}' has not been prepared for export (run the import step first)")]
    NotPrepared { kind: &'static str, name: String },

    #[error("armature '{0}' has no root bone")]
    MissingRoot(String),

    #[error("armature has several root bones: '{first}' and '{second}'")]
    MultipleRoots { first: String, second: String },

    #[error("duplicate bone name '{0}'")]
    DuplicateBone(String),

    #[error("bone '{bone}' names unknown parent '{parent}'")]
    UnknownParent { bone: String, parent: String },

    /// A parent chain loops back on itself and never reaches the root
    #[error("bone '{0}' is not reachable from the root (cyclic parent chain)")]
    Unreachable(String),

    #[error("bone '{0}' has a pose rotation but no unposed head/tail")]
    MissingUnposedTransform(String),

    #[error("vertex {vertex} references unknown bone group '{group}'")]
    UnknownBoneGroup { vertex: usize, group: String },

    #[error("face {face} has {count} vertices (only triangles are supported, triangulate the mesh)")]
    NonTriangleFace { face: usize, count: usize },

    #[error("face {face} references vertex {index} but the mesh has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    /// Skeleton nesting and skin bone table disagree at `index`
    #[error("bone order mismatch at index {index}: skeleton has '{skeleton}', skin has '{skin}'")]
    BoneOrderMismatch {
        index: usize,
        skeleton: String,
        skin: String,
    },

    #[error("invalid export config: {0}")]
    InvalidConfig(String),
}
