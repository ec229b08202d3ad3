//! Skin exporter (rig document -> .skin)
//!
//! Flattens the bone tree into the canonical index table, converts the mesh into the
//! target frame and remaps every vertex group name to its bone index. Any vertex or
//! face that cannot be expressed exactly rejects the whole export.

use anyhow::{Context, Result};
use glam::Affine3A;
use rig_common::{SkinFile, SkinWeight};
use std::path::Path;

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::output::write_atomic;
use crate::rig::{Armature, BoneIndexTable, Mesh, RigDocument};

/// Result of in-memory skin conversion
#[derive(Debug, Clone)]
pub struct ConvertedSkin {
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub bone_count: usize,
    pub skin: SkinFile,
}

impl ConvertedSkin {
    /// Rendered `.skin` file contents
    pub fn to_text(&self) -> String {
        self.skin.to_skin_string()
    }
}

/// Build skin data for `mesh` bound to `armature`
pub fn export_skin(
    armature: &Armature,
    mesh: &Mesh,
    config: &ExportConfig,
) -> Result<SkinFile, ExportError> {
    armature.require_prepared()?;
    mesh.require_prepared()?;
    config.validate()?;

    let converter = config.converter();
    let table = armature.bone_index_table();

    // 1 - positions
    let positions = mesh
        .vertices
        .iter()
        .map(|v| converter.convert_point(v.position).to_array())
        .collect();
    tracing::debug!("Skin export 1/5: positions");

    // 2 - normals
    let normals = mesh
        .vertices
        .iter()
        .map(|v| converter.convert_direction(v.normal).to_array())
        .collect();
    tracing::debug!("Skin export 2/5: normals");

    // 3 - skin weights
    let skin_weights = remap_skin_weights(mesh, &table)?;
    tracing::debug!("Skin export 3/5: skin weights");

    // 4 - triangles
    let triangles = validate_triangles(mesh)?;
    tracing::debug!("Skin export 4/5: triangles");

    // 5 - bindings, one per bone in table order
    let bindings = table
        .order()
        .iter()
        .map(|&bone| {
            let head = converter.convert_point(armature.bone(bone).head);
            affine_to_3x4(&Affine3A::from_translation(head))
        })
        .collect();
    tracing::debug!("Skin export 5/5: bindings");

    Ok(SkinFile {
        positions,
        normals,
        skin_weights,
        triangles,
        bindings,
    })
}

/// Resolve every vertex group name through the bone index table
fn remap_skin_weights(
    mesh: &Mesh,
    table: &BoneIndexTable,
) -> Result<Vec<Vec<SkinWeight>>, ExportError> {
    mesh.vertices
        .iter()
        .enumerate()
        .map(|(vertex, v)| {
            v.groups
                .iter()
                .map(|g| {
                    table
                        .index_of(&g.group)
                        .map(|bone| SkinWeight {
                            bone,
                            weight: g.weight,
                        })
                        .ok_or_else(|| ExportError::UnknownBoneGroup {
                            vertex,
                            group: g.group.clone(),
                        })
                })
                .collect()
        })
        .collect()
}

/// Require every face to be a triangle over existing vertices
fn validate_triangles(mesh: &Mesh) -> Result<Vec<[u32; 3]>, ExportError> {
    let vertex_count = mesh.vertices.len();
    mesh.faces
        .iter()
        .enumerate()
        .map(|(face, indices)| -> Result<[u32; 3], ExportError> {
            let tri: [u32; 3] = indices
                .as_slice()
                .try_into()
                .map_err(|_| ExportError::NonTriangleFace {
                    face,
                    count: indices.len(),
                })?;
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(ExportError::FaceIndexOutOfRange {
                    face,
                    index,
                    vertex_count,
                });
            }
            Ok(tri)
        })
        .collect()
}

/// 3×4 column-major: [col0.xyz, col1.xyz, col2.xyz, translation.xyz]
fn affine_to_3x4(m: &Affine3A) -> [f32; 12] {
    let c = m.to_cols_array();
    [
        c[0], c[1], c[2], // col0.xyz
        c[3], c[4], c[5], // col1.xyz
        c[6], c[7], c[8], // col2.xyz
        c[9], c[10], c[11], // translation
    ]
}

/// Convert a rig document to in-memory skin data
pub fn skin_from_document(doc: &RigDocument, config: &ExportConfig) -> Result<ConvertedSkin> {
    let armature = Armature::from_desc(&doc.armature)
        .with_context(|| format!("Invalid armature '{}'", doc.armature.name))?;
    let mesh = doc.require_mesh()?;
    let skin = export_skin(&armature, mesh, config)
        .with_context(|| format!("Failed to export skin for mesh '{}'", mesh.name))?;

    Ok(ConvertedSkin {
        vertex_count: skin.positions.len(),
        triangle_count: skin.triangles.len(),
        bone_count: skin.bindings.len(),
        skin,
    })
}

/// Convert a rig document file to in-memory skin data
pub fn convert_skin_to_memory(input: &Path, config: &ExportConfig) -> Result<ConvertedSkin> {
    let doc = RigDocument::load(input)?;
    skin_from_document(&doc, config)
}

/// Convert a rig document file to a .skin file
pub fn convert_skin(input: &Path, output: &Path, config: &ExportConfig) -> Result<()> {
    let skin = convert_skin_to_memory(input, config)?;

    write_atomic(output, &skin.to_text())?;

    tracing::info!(
        "Exported skin: {} vertices, {} triangles, {} bones -> {:?}",
        skin.vertex_count,
        skin.triangle_count,
        skin.bone_count,
        output
    );

    Ok(())
}
