//! Whole-rig operations: export both files together, check, list bones
//!
//! The engine pairs a `.skel` and a `.skin` purely by joint order, so exporting both
//! from one document also verifies that the skeleton nesting and the skin's bone
//! table agree before anything is written.

use anyhow::{Context, Result};
use rig_common::{BallJoint, SkinFile, SKEL_EXT, SKIN_EXT};
use std::path::{Path, PathBuf};

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::output::write_atomic;
use crate::rig::{Armature, RigDocument};
use crate::skeleton::{export_skeleton, ConvertedSkeleton};
use crate::skin::{export_skin, ConvertedSkin};

/// Files written by [`convert_rig`]
#[derive(Debug, Clone)]
pub struct RigOutputs {
    pub skeleton_path: PathBuf,
    pub skin_path: PathBuf,
    pub joint_count: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
}

/// Fail unless the skeleton's nesting order names the same bones as the skin's table
pub fn verify_bone_order(
    skeleton: &BallJoint,
    table_names: &[String],
    config: &ExportConfig,
) -> Result<(), ExportError> {
    let joints = skeleton.depth_first_names();
    let count = joints.len().max(table_names.len());

    for index in 0..count {
        let joint = joints.get(index).copied();
        let bone = table_names.get(index).map(|name| config.joint_name(name));
        if joint != bone {
            return Err(ExportError::BoneOrderMismatch {
                index,
                skeleton: joint.unwrap_or("<none>").to_string(),
                skin: bone.unwrap_or("<none>").to_string(),
            });
        }
    }

    Ok(())
}

/// Export skeleton and skin from one document, in memory
pub fn export_rig(
    doc: &RigDocument,
    config: &ExportConfig,
) -> Result<(ConvertedSkeleton, ConvertedSkin)> {
    let armature = Armature::from_desc(&doc.armature)
        .with_context(|| format!("Invalid armature '{}'", doc.armature.name))?;
    let mesh = doc.require_mesh()?;

    let root = export_skeleton(&armature, config)?;
    let skin = export_skin(&armature, mesh, config)
        .with_context(|| format!("Failed to export skin for mesh '{}'", mesh.name))?;

    let table = armature.bone_index_table();
    verify_bone_order(&root, table.names(), config)?;

    let skeleton = ConvertedSkeleton {
        joint_count: root.joint_count(),
        root,
    };
    let skin = ConvertedSkin {
        vertex_count: skin.positions.len(),
        triangle_count: skin.triangles.len(),
        bone_count: skin.bindings.len(),
        skin,
    };
    Ok((skeleton, skin))
}

/// Export `<stem>.skel` and `<stem>.skin` next to the input, or into `out_dir`
pub fn convert_rig(input: &Path, out_dir: Option<&Path>, config: &ExportConfig) -> Result<RigOutputs> {
    let doc = RigDocument::load(input)?;
    let (skeleton, skin) = export_rig(&doc, config)?;

    let stem = input
        .file_stem()
        .with_context(|| format!("Input has no file name: {:?}", input))?;
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let stem = stem.to_string_lossy();
    let skeleton_path = dir.join(format!("{}.{}", stem, SKEL_EXT));
    let skin_path = dir.join(format!("{}.{}", stem, SKIN_EXT));

    write_atomic(&skeleton_path, &skeleton.to_text())?;
    write_atomic(&skin_path, &skin.to_text())?;

    tracing::info!(
        "Exported rig '{}': {} joints -> {:?}, {} vertices / {} triangles -> {:?}",
        doc.armature.name,
        skeleton.joint_count,
        skeleton_path,
        skin.vertex_count,
        skin.triangle_count,
        skin_path
    );

    Ok(RigOutputs {
        skeleton_path,
        skin_path,
        joint_count: skeleton.joint_count,
        vertex_count: skin.vertex_count,
        triangle_count: skin.triangle_count,
    })
}

/// Run every export in memory and read the results back; writes nothing
pub fn check_rig(input: &Path, config: &ExportConfig) -> Result<()> {
    let doc = RigDocument::load(input)?;

    let (skeleton, skin) = if doc.mesh.is_some() {
        let (skeleton, skin) = export_rig(&doc, config)?;
        (skeleton, Some(skin))
    } else {
        (crate::skeleton::skeleton_from_document(&doc, config)?, None)
    };

    let parsed = BallJoint::parse(&skeleton.to_text()).context("Skeleton output does not parse")?;
    if parsed.joint_count() != skeleton.joint_count {
        anyhow::bail!(
            "Skeleton output has {} joints after parsing, expected {}",
            parsed.joint_count(),
            skeleton.joint_count
        );
    }
    tracing::info!("Skeleton OK: {} joints", skeleton.joint_count);

    if let Some(skin) = skin {
        let parsed = SkinFile::parse(&skin.to_text()).context("Skin output does not parse")?;
        parsed
            .validate(Some(skeleton.joint_count))
            .context("Skin output is inconsistent")?;
        tracing::info!(
            "Skin OK: {} vertices, {} triangles, {} bindings",
            skin.vertex_count,
            skin.triangle_count,
            skin.bone_count
        );
    } else {
        tracing::info!("No mesh in {:?}, skin not checked", input);
    }

    Ok(())
}

/// Log the canonical bone index table
pub fn list_bones(input: &Path, config: &ExportConfig) -> Result<()> {
    let doc = RigDocument::load(input)?;
    let armature = Armature::from_desc(&doc.armature)
        .with_context(|| format!("Invalid armature '{}'", doc.armature.name))?;

    tracing::info!("Bones in '{}' ({}):", armature.name, armature.bone_count());
    for (index, (bone, depth)) in armature.depth_first_with_depth().into_iter().enumerate() {
        let name = &armature.bone(bone).name;
        tracing::info!(
            "  [{}] {}{} -> '{}'",
            index,
            "  ".repeat(depth),
            name,
            config.joint_name(name)
        );
    }

    Ok(())
}
