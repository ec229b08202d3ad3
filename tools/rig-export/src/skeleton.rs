//! Skeleton exporter (rig document -> .skel)
//!
//! Walks the bone tree from the root and emits one `balljoint` block per bone with
//! its offset from the parent, bounding box, orientation and rest-to-pose rotation.

use anyhow::{Context, Result};
use glam::Mat3;
use rig_common::BallJoint;
use std::path::Path;

use crate::config::{EulerOrder, ExportConfig};
use crate::convert::{bone_axis, degeneracy, rotation_between, to_row_major, AxisConverter, Degeneracy};
use crate::error::ExportError;
use crate::output::write_atomic;
use crate::rig::{Armature, Pose, RigDocument};

/// Result of in-memory skeleton conversion
#[derive(Debug, Clone)]
pub struct ConvertedSkeleton {
    /// Number of joints in the hierarchy
    pub joint_count: usize,
    /// Root joint with the whole hierarchy below it
    pub root: BallJoint,
}

impl ConvertedSkeleton {
    /// Rendered `.skel` file contents
    pub fn to_text(&self) -> String {
        self.root.to_skel_string()
    }
}

/// Build the joint hierarchy for `armature`.
///
/// Refuses armatures without the prepared marker before doing any work.
pub fn export_skeleton(armature: &Armature, config: &ExportConfig) -> Result<BallJoint, ExportError> {
    armature.require_prepared()?;
    config.validate()?;

    let converter = config.converter();
    Ok(export_joint(armature, armature.root_index(), config, &converter))
}

/// Build one joint and, recursively, its children.
///
/// Recursion depth equals hierarchy depth; the armature is known to be acyclic.
fn export_joint(
    armature: &Armature,
    index: usize,
    config: &ExportConfig,
    converter: &AxisConverter,
) -> BallJoint {
    let bone = armature.bone(index);

    let head = converter.convert_point(bone.head);
    let tail = converter.convert_point(bone.tail);
    let segment = tail - head;
    let length = segment.length();

    if length == 0.0 {
        tracing::warn!("Bone '{}' has zero length, orientation left as identity", bone.name);
    }

    let (offset, orient) = match bone.parent {
        Some(parent) => {
            if degeneracy(bone_axis(), segment) == Some(Degeneracy::AntiParallel) {
                tracing::warn!(
                    "Bone '{}' points straight down, orientation left as identity",
                    bone.name
                );
            }
            let parent_head = converter.convert_point(armature.bone(parent).head);
            (head - parent_head, rotation_between(bone_axis(), segment))
        }
        // Root keeps its absolute position and is never re-oriented
        None => (head, Mat3::IDENTITY),
    };

    let pose = pose_delta(&bone.name, &bone.pose, converter, config.euler_order);

    let w = config.box_half_width;
    BallJoint {
        name: config.joint_name(&bone.name).to_string(),
        offset: offset.to_array(),
        box_min: [-w, 0.0, -w],
        box_max: [w, length, w],
        orient: to_row_major(&orient),
        pose,
        rot_limits: [None; 3],
        children: bone
            .children
            .iter()
            .map(|&child| export_joint(armature, child, config, converter))
            .collect(),
    }
}

/// Euler angles of the rotation from the bone's unposed direction to its posed one
pub fn pose_delta(
    bone_name: &str,
    pose: &Pose,
    converter: &AxisConverter,
    order: EulerOrder,
) -> [f32; 3] {
    let unposed =
        converter.convert_point(pose.unposed_tail) - converter.convert_point(pose.unposed_head);
    let posed = converter.convert_point(pose.tail) - converter.convert_point(pose.head);

    match degeneracy(unposed, posed) {
        Some(Degeneracy::AntiParallel) => tracing::warn!(
            "Bone '{}' is posed exactly opposite its rest direction, pose left at zero",
            bone_name
        ),
        Some(Degeneracy::ZeroLength) => tracing::warn!(
            "Bone '{}' has a zero-length posed segment, pose left at zero",
            bone_name
        ),
        None => {}
    }

    let (x, y, z) = rotation_between(unposed, posed).to_euler(order.to_glam());
    [x, y, z]
}

/// Convert a rig document to an in-memory skeleton
pub fn skeleton_from_document(doc: &RigDocument, config: &ExportConfig) -> Result<ConvertedSkeleton> {
    let armature = Armature::from_desc(&doc.armature)
        .with_context(|| format!("Invalid armature '{}'", doc.armature.name))?;
    let root = export_skeleton(&armature, config)?;

    Ok(ConvertedSkeleton {
        joint_count: root.joint_count(),
        root,
    })
}

/// Convert a rig document file to an in-memory skeleton
pub fn convert_skeleton_to_memory(input: &Path, config: &ExportConfig) -> Result<ConvertedSkeleton> {
    let doc = RigDocument::load(input)?;
    skeleton_from_document(&doc, config)
}

/// Convert a rig document file to a .skel file
pub fn convert_skeleton(input: &Path, output: &Path, config: &ExportConfig) -> Result<()> {
    let skeleton = convert_skeleton_to_memory(input, config)?;

    write_atomic(output, &skeleton.to_text())?;

    tracing::info!(
        "Exported skeleton: {} joints, root '{}' -> {:?}",
        skeleton.joint_count,
        skeleton.root.name,
        output
    );

    Ok(())
}
