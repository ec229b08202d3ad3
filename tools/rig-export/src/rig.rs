//! Rig interchange document and the validated armature/mesh model
//!
//! The host application dumps the armature (rest and posed bone transforms) and the
//! skinned mesh into a JSON document. [`Armature::from_desc`] turns the flat bone list
//! into a strict tree and rejects anything that is not one.

use anyhow::{Context, Result};
use glam::{Quat, Vec3};
use hashbrown::HashMap;
use serde::Deserialize;
use std::path::Path;

use crate::error::ExportError;

/// Top-level interchange document
#[derive(Debug, Clone, Deserialize)]
pub struct RigDocument {
    pub armature: ArmatureDesc,
    /// Absent for skeleton-only documents
    #[serde(default)]
    pub mesh: Option<Mesh>,
}

impl RigDocument {
    /// Load a rig document from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rig document: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid rig document: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse rig document JSON")
    }

    /// The mesh, or an error naming the document when there is none
    pub fn require_mesh(&self) -> Result<&Mesh> {
        self.mesh
            .as_ref()
            .with_context(|| format!("Rig '{}' contains no mesh", self.armature.name))
    }
}

/// Armature as supplied by the host
#[derive(Debug, Clone, Deserialize)]
pub struct ArmatureDesc {
    #[serde(default = "default_armature_name")]
    pub name: String,
    /// Set by the import step once the rig has been triangulated and baked
    #[serde(default)]
    pub prepared: bool,
    pub bones: Vec<BoneDesc>,
}

fn default_armature_name() -> String {
    "Armature".to_string()
}

/// One bone; its children are the bones naming it as parent, in document order
#[derive(Debug, Clone, Deserialize)]
pub struct BoneDesc {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Rest head (source space)
    pub head: Vec3,
    /// Rest tail (source space)
    pub tail: Vec3,
    #[serde(default)]
    pub pose: Option<PoseDesc>,
}

/// Posed transform of a bone
#[derive(Debug, Clone, Deserialize)]
pub struct PoseDesc {
    #[serde(default)]
    pub rotation: Quat,
    pub head: Vec3,
    pub tail: Vec3,
    /// Head/tail with this bone's own pose rotation reset (parents stay posed)
    #[serde(default)]
    pub unposed_head: Option<Vec3>,
    #[serde(default)]
    pub unposed_tail: Option<Vec3>,
}

/// Resolved pose of a bone (source space)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub rotation: Quat,
    pub head: Vec3,
    pub tail: Vec3,
    pub unposed_head: Vec3,
    pub unposed_tail: Vec3,
}

impl Pose {
    /// Unposed bone: every transform equals the rest transform
    pub fn rest(head: Vec3, tail: Vec3) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            head,
            tail,
            unposed_head: head,
            unposed_tail: tail,
        }
    }

    fn from_desc(bone: &str, desc: &PoseDesc) -> Result<Self, ExportError> {
        let (unposed_head, unposed_tail) = match (desc.unposed_head, desc.unposed_tail) {
            (Some(head), Some(tail)) => (head, tail),
            // Resetting an identity rotation changes nothing
            _ if is_identity(desc.rotation) => (desc.head, desc.tail),
            _ => return Err(ExportError::MissingUnposedTransform(bone.to_string())),
        };
        Ok(Self {
            rotation: desc.rotation,
            head: desc.head,
            tail: desc.tail,
            unposed_head,
            unposed_tail,
        })
    }
}

fn is_identity(q: Quat) -> bool {
    const EPSILON: f32 = 1e-6;
    q.abs_diff_eq(Quat::IDENTITY, EPSILON) || q.abs_diff_eq(-Quat::IDENTITY, EPSILON)
}

/// Bone node in a validated armature
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Rest head (source space)
    pub head: Vec3,
    /// Rest tail (source space)
    pub tail: Vec3,
    pub parent: Option<usize>,
    /// Child indices in stored order
    pub children: Vec<usize>,
    pub pose: Pose,
}

/// Strict bone tree: one root, unique names, every bone reachable from the root
#[derive(Debug, Clone, PartialEq)]
pub struct Armature {
    pub name: String,
    pub prepared: bool,
    bones: Vec<Bone>,
    root: usize,
}

impl Armature {
    pub fn from_desc(desc: &ArmatureDesc) -> Result<Self, ExportError> {
        if desc.bones.is_empty() {
            return Err(ExportError::MissingRoot(desc.name.clone()));
        }

        let mut by_name: HashMap<&str, usize> = HashMap::with_capacity(desc.bones.len());
        for (i, bone) in desc.bones.iter().enumerate() {
            if by_name.insert(bone.name.as_str(), i).is_some() {
                return Err(ExportError::DuplicateBone(bone.name.clone()));
            }
        }

        let mut bones = Vec::with_capacity(desc.bones.len());
        let mut root = None;
        for bone in &desc.bones {
            let parent = match &bone.parent {
                Some(parent) => Some(*by_name.get(parent.as_str()).ok_or_else(|| {
                    ExportError::UnknownParent {
                        bone: bone.name.clone(),
                        parent: parent.clone(),
                    }
                })?),
                None => None,
            };

            if parent.is_none() {
                if let Some(first) = root {
                    let first: &BoneDesc = &desc.bones[first];
                    return Err(ExportError::MultipleRoots {
                        first: first.name.clone(),
                        second: bone.name.clone(),
                    });
                }
                root = Some(bones.len());
            }

            let pose = match &bone.pose {
                Some(pose) => Pose::from_desc(&bone.name, pose)?,
                None => Pose::rest(bone.head, bone.tail),
            };

            bones.push(Bone {
                name: bone.name.clone(),
                head: bone.head,
                tail: bone.tail,
                parent,
                children: Vec::new(),
                pose,
            });
        }

        let root = root.ok_or_else(|| ExportError::MissingRoot(desc.name.clone()))?;

        for i in 0..bones.len() {
            if let Some(parent) = bones[i].parent {
                bones[parent].children.push(i);
            }
        }

        let armature = Self {
            name: desc.name.clone(),
            prepared: desc.prepared,
            bones,
            root,
        };

        // With one parent per bone, anything the root cannot reach sits on a cycle
        let order = armature.depth_first();
        if order.len() != armature.bones.len() {
            let mut reached = vec![false; armature.bones.len()];
            for &i in &order {
                reached[i] = true;
            }
            if let Some(i) = reached.iter().position(|r| !r) {
                return Err(ExportError::Unreachable(armature.bones[i].name.clone()));
            }
        }

        Ok(armature)
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, index: usize) -> &Bone {
        &self.bones[index]
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn root_index(&self) -> usize {
        self.root
    }

    pub fn root(&self) -> &Bone {
        &self.bones[self.root]
    }

    pub fn find(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name == name)
    }

    /// Bone indices in canonical order: depth first from the root, children in stored order
    pub fn depth_first(&self) -> Vec<usize> {
        self.depth_first_with_depth()
            .into_iter()
            .map(|(index, _)| index)
            .collect()
    }

    /// Canonical order paired with each bone's nesting depth
    pub fn depth_first_with_depth(&self) -> Vec<(usize, usize)> {
        let mut order = Vec::with_capacity(self.bones.len());
        let mut stack = vec![(self.root, 0)];
        while let Some((index, depth)) = stack.pop() {
            order.push((index, depth));
            stack.extend(
                self.bones[index]
                    .children
                    .iter()
                    .rev()
                    .map(|&child| (child, depth + 1)),
            );
        }
        order
    }

    pub fn bone_index_table(&self) -> BoneIndexTable {
        BoneIndexTable::build(self)
    }

    /// Reject armatures the import step has not marked
    pub fn require_prepared(&self) -> Result<(), ExportError> {
        if self.prepared {
            Ok(())
        } else {
            Err(ExportError::NotPrepared {
                kind: "armature",
                name: self.name.clone(),
            })
        }
    }
}

/// Bone name → canonical index, built once per export
#[derive(Debug, Clone)]
pub struct BoneIndexTable {
    /// Armature bone indices in canonical order
    order: Vec<usize>,
    names: Vec<String>,
    lookup: HashMap<String, u32>,
}

impl BoneIndexTable {
    pub fn build(armature: &Armature) -> Self {
        let order = armature.depth_first();
        let names: Vec<String> = order
            .iter()
            .map(|&i| armature.bone(i).name.clone())
            .collect();
        let lookup = names
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index as u32))
            .collect();
        Self {
            order,
            names,
            lookup,
        }
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.lookup.get(name).copied()
    }

    /// Armature bone indices in table order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Skinned mesh as supplied by the host
#[derive(Debug, Clone, Deserialize)]
pub struct Mesh {
    #[serde(default = "default_mesh_name")]
    pub name: String,
    #[serde(default)]
    pub prepared: bool,
    pub vertices: Vec<Vertex>,
    /// Polygons as vertex index lists; each must be a triangle
    #[serde(default)]
    pub faces: Vec<Vec<u32>>,
}

fn default_mesh_name() -> String {
    "Mesh".to_string()
}

impl Mesh {
    pub fn require_prepared(&self) -> Result<(), ExportError> {
        if self.prepared {
            Ok(())
        } else {
            Err(ExportError::NotPrepared {
                kind: "mesh",
                name: self.name.clone(),
            })
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    /// Bone influences by vertex group name
    #[serde(default)]
    pub groups: Vec<GroupWeight>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupWeight {
    pub group: String,
    pub weight: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn armature(bones: serde_json::Value) -> Result<Armature, ExportError> {
        let desc: ArmatureDesc =
            serde_json::from_value(json!({ "prepared": true, "bones": bones })).unwrap();
        Armature::from_desc(&desc)
    }

    fn bone(name: &str, parent: Option<&str>) -> serde_json::Value {
        json!({ "name": name, "parent": parent, "head": [0, 0, 0], "tail": [0, 0, 1] })
    }

    #[test]
    fn test_depth_first_order() {
        // Document order deliberately differs from hierarchy order
        let arm = armature(json!([
            bone("root", None),
            bone("b", Some("root")),
            bone("a1", Some("a")),
            bone("a", Some("root")),
            bone("b1", Some("b")),
            bone("a2", Some("a")),
        ]))
        .unwrap();

        let names: Vec<&str> = arm
            .depth_first()
            .into_iter()
            .map(|i| arm.bone(i).name.as_str())
            .collect();
        assert_eq!(names, vec!["root", "b", "b1", "a", "a1", "a2"]);

        let depths: Vec<usize> = arm
            .depth_first_with_depth()
            .into_iter()
            .map(|(_, d)| d)
            .collect();
        assert_eq!(depths, vec![0, 1, 2, 1, 2, 2]);

        // Stable across calls
        assert_eq!(arm.depth_first(), arm.depth_first());
    }

    #[test]
    fn test_index_table() {
        let arm = armature(json!([
            bone("root", None),
            bone("child", Some("root")),
            bone("grandchild", Some("child")),
        ]))
        .unwrap();
        let table = arm.bone_index_table();
        assert_eq!(table.len(), 3);
        assert_eq!(table.index_of("root"), Some(0));
        assert_eq!(table.index_of("grandchild"), Some(2));
        assert_eq!(table.index_of("missing"), None);
        assert_eq!(table.names(), &["root", "child", "grandchild"]);
    }

    #[test]
    fn test_root_may_be_listed_later() {
        let arm = armature(json!([bone("child", Some("root")), bone("root", None)])).unwrap();
        assert_eq!(arm.root().name, "root");
        assert_eq!(arm.bone_count(), 2);
    }

    #[test]
    fn test_rejects_missing_root() {
        assert_eq!(
            armature(json!([])),
            Err(ExportError::MissingRoot("Armature".to_string()))
        );
        // Every bone has a parent: the chain is cyclic and there is no root
        assert!(matches!(
            armature(json!([bone("a", Some("b")), bone("b", Some("a"))])),
            Err(ExportError::MissingRoot(_))
        ));
    }

    #[test]
    fn test_rejects_multiple_roots() {
        assert_eq!(
            armature(json!([bone("a", None), bone("b", None)])),
            Err(ExportError::MultipleRoots {
                first: "a".to_string(),
                second: "b".to_string()
            })
        );
    }

    #[test]
    fn test_rejects_bad_parents() {
        assert_eq!(
            armature(json!([bone("root", None), bone("a", Some("nope"))])),
            Err(ExportError::UnknownParent {
                bone: "a".to_string(),
                parent: "nope".to_string()
            })
        );
        assert_eq!(
            armature(json!([bone("root", None), bone("root", None)])),
            Err(ExportError::DuplicateBone("root".to_string()))
        );
    }

    #[test]
    fn test_rejects_cycles() {
        let result = armature(json!([
            bone("root", None),
            bone("a", Some("b")),
            bone("b", Some("a")),
        ]));
        assert_eq!(result, Err(ExportError::Unreachable("a".to_string())));

        let result = armature(json!([bone("root", None), bone("self", Some("self"))]));
        assert_eq!(result, Err(ExportError::Unreachable("self".to_string())));
    }

    #[test]
    fn test_pose_defaults() {
        let arm = armature(json!([
            { "name": "root", "head": [0, 0, 0], "tail": [0, 0, 1] },
            { "name": "posed", "parent": "root", "head": [0, 0, 1], "tail": [0, 0, 2],
              "pose": { "head": [0, 0, 1], "tail": [0, 1, 1] } },
        ]))
        .unwrap();

        let root = arm.root();
        assert_eq!(root.pose, Pose::rest(root.head, root.tail));

        // Identity rotation without unposed data: unposed equals posed
        let posed = arm.find("posed").unwrap();
        assert_eq!(posed.pose.unposed_tail, Vec3::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn test_rotated_pose_needs_unposed_transform() {
        let result = armature(json!([
            { "name": "root", "head": [0, 0, 0], "tail": [0, 0, 1],
              "pose": { "rotation": [0.7071068, 0, 0, 0.7071068],
                        "head": [0, 0, 0], "tail": [0, -1, 0] } },
        ]));
        assert_eq!(
            result,
            Err(ExportError::MissingUnposedTransform("root".to_string()))
        );
    }

    #[test]
    fn test_parse_document() {
        let doc = RigDocument::parse(
            r#"{
                "armature": { "name": "Rig", "prepared": true,
                    "bones": [ { "name": "mixamorig:Hips", "head": [0, 0, 100], "tail": [0, 0, 110] } ] },
                "mesh": { "prepared": true,
                    "vertices": [ { "position": [1, 2, 3], "normal": [0, 0, 1],
                                    "groups": [ { "group": "mixamorig:Hips", "weight": 1.0 } ] } ],
                    "faces": [] }
            }"#,
        )
        .unwrap();

        assert_eq!(doc.armature.name, "Rig");
        assert_eq!(doc.armature.bones[0].head, Vec3::new(0.0, 0.0, 100.0));
        let mesh = doc.require_mesh().unwrap();
        assert_eq!(mesh.name, "Mesh");
        assert_eq!(mesh.vertices[0].groups[0].group, "mixamorig:Hips");

        let doc = RigDocument::parse(r#"{ "armature": { "bones": [] } }"#).unwrap();
        assert!(!doc.armature.prepared);
        assert!(doc.require_mesh().is_err());
    }

    #[test]
    fn test_prepared_marker() {
        let desc: ArmatureDesc =
            serde_json::from_value(json!({ "bones": [bone("root", None)] })).unwrap();
        let arm = Armature::from_desc(&desc).unwrap();
        assert!(matches!(
            arm.require_prepared(),
            Err(ExportError::NotPrepared { kind: "armature", .. })
        ));
    }
}
