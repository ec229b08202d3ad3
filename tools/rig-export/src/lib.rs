//! rig-export library
//!
//! Converts a prepared rig document (armature plus skinned mesh) into the `.skel`
//! and `.skin` text formats, for use by the CLI and by other tools.

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod rig;
pub mod skeleton;
pub mod skin;

// Re-export the text formats from rig-common
pub use rig_common::{BallJoint, SkinFile, SkinWeight, SKEL_EXT, SKIN_EXT};

pub use config::{EulerOrder, ExportConfig};
pub use error::ExportError;
pub use rig::{Armature, BoneIndexTable, Mesh, RigDocument};

// Re-export conversion entry points
pub use pipeline::{check_rig, convert_rig, export_rig, list_bones, RigOutputs};
pub use skeleton::{convert_skeleton_to_memory, export_skeleton, ConvertedSkeleton};
pub use skin::{convert_skin_to_memory, export_skin, ConvertedSkin};
