//! Export configuration (rig-export.toml)
//!
//! Every field is optional; missing fields fall back to the values that match
//! Mixamo rigs exported from a centimetre-scale scene.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::convert::AxisConverter;
use crate::error::ExportError;

/// Euler convention used for the `pose` line of each joint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EulerOrder {
    /// X, then Y, then Z about the fixed axes (the authoring tool's "XYZ")
    #[default]
    XyzExtrinsic,
    /// X, then Y, then Z about the rotating axes (matches `Rx * Ry * Rz`)
    XyzIntrinsic,
}

impl EulerOrder {
    pub fn to_glam(self) -> glam::EulerRot {
        match self {
            EulerOrder::XyzExtrinsic => glam::EulerRot::XYZEx,
            EulerOrder::XyzIntrinsic => glam::EulerRot::XYZ,
        }
    }
}

/// Export settings shared by the skeleton and skin exporters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Uniform scale applied after the axis remap
    #[serde(default = "default_scale")]
    pub scale: f32,

    /// Translation applied after scaling (target space)
    #[serde(default = "default_shift")]
    pub shift: [f32; 3],

    /// Number of leading characters stripped from every bone name.
    /// Mixamo prefixes bones with `mixamorig:` (10 characters).
    #[serde(default = "default_name_prefix_len")]
    pub name_prefix_len: usize,

    /// Half width of each joint's bounding box on X and Z
    #[serde(default = "default_box_half_width")]
    pub box_half_width: f32,

    #[serde(default)]
    pub euler_order: EulerOrder,
}

fn default_scale() -> f32 {
    0.01
}

fn default_shift() -> [f32; 3] {
    [0.0, 0.0, -1.0]
}

fn default_name_prefix_len() -> usize {
    10
}

fn default_box_half_width() -> f32 {
    0.01
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            shift: default_shift(),
            name_prefix_len: default_name_prefix_len(),
            box_half_width: default_box_half_width(),
            euler_order: EulerOrder::default(),
        }
    }
}

impl ExportConfig {
    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Parse and validate config from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse rig-export config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ExportError::InvalidConfig(format!(
                "scale must be a positive number, got {}",
                self.scale
            )));
        }
        if self.shift.iter().any(|v| !v.is_finite()) {
            return Err(ExportError::InvalidConfig(format!(
                "shift must be finite, got {:?}",
                self.shift
            )));
        }
        if !self.box_half_width.is_finite() || self.box_half_width < 0.0 {
            return Err(ExportError::InvalidConfig(format!(
                "box_half_width must be zero or positive, got {}",
                self.box_half_width
            )));
        }
        Ok(())
    }

    pub fn converter(&self) -> AxisConverter {
        AxisConverter::new(self.scale, glam::Vec3::from_array(self.shift))
    }

    /// Emitted name for a source bone name
    pub fn joint_name<'a>(&self, bone_name: &'a str) -> &'a str {
        match bone_name.char_indices().nth(self.name_prefix_len) {
            Some((byte_offset, _)) => &bone_name[byte_offset..],
            None => {
                tracing::warn!(
                    "Bone name '{}' is not longer than the {}-character prefix, keeping it whole",
                    bone_name,
                    self.name_prefix_len
                );
                bone_name
            }
        }
    }
}
