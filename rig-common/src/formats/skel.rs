//! Skeleton hierarchy format (.skel)
//!
//! # Layout
//! ```text
//! balljoint <name> {
//!     offset x y z
//!     boxmin x y z
//!     boxmax x y z
//!     orient m00 m01 m02 m10 m11 m12 m20 m21 m22
//!     pose rx ry rz
//!     balljoint <child> { ... }
//! }
//! ```
//!
//! `orient` is a row-major 3×3 rotation and `pose` holds Euler angles in radians.
//! The optional `rotxlimit` / `rotylimit` / `rotzlimit` lines carry `min max` joint
//! limits; the exporter never writes them but the reader accepts them.

use nom::{
    combinator::{cut, map},
    error::context,
    multi::many_till,
};

use super::read::{Res, floats, keyword, run, skip_line, token};
use super::{FormatError, TextBlock, format_float, format_floats};

/// Keyword opening a joint block
pub const BALLJOINT_KEYWORD: &str = "balljoint";

/// A joint node and all of its descendants
#[derive(Debug, Clone, PartialEq)]
pub struct BallJoint {
    pub name: String,
    /// Pivot position relative to the parent joint
    pub offset: [f32; 3],
    pub box_min: [f32; 3],
    pub box_max: [f32; 3],
    /// Row-major 3×3 orientation
    pub orient: [f32; 9],
    /// Euler angles (radians)
    pub pose: [f32; 3],
    /// Optional (min, max) rotation limits per axis
    pub rot_limits: [Option<[f32; 2]>; 3],
    pub children: Vec<BallJoint>,
}

impl Default for BallJoint {
    fn default() -> Self {
        Self {
            name: String::new(),
            offset: [0.0; 3],
            box_min: [-0.1; 3],
            box_max: [0.1; 3],
            orient: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            pose: [0.0; 3],
            rot_limits: [None; 3],
            children: Vec::new(),
        }
    }
}

impl BallJoint {
    /// Build the text block for this joint and its subtree
    pub fn to_block(&self) -> TextBlock {
        let mut body = TextBlock::new();
        body.line(format!("offset {}", format_floats(&self.offset)));
        body.line(format!("boxmin {}", format_floats(&self.box_min)));
        body.line(format!("boxmax {}", format_floats(&self.box_max)));
        for (axis, limit) in ["x", "y", "z"].iter().zip(&self.rot_limits) {
            if let Some([min, max]) = limit {
                body.line(format!(
                    "rot{}limit {} {}",
                    axis,
                    format_float(*min),
                    format_float(*max)
                ));
            }
        }
        body.line(format!("orient {}", format_floats(&self.orient)));
        body.line(format!("pose {}", format_floats(&self.pose)));
        for child in &self.children {
            body.append(child.to_block());
        }

        let mut block = TextBlock::new();
        block
            .line(format!("{} {} {{", BALLJOINT_KEYWORD, self.name))
            .nest(body)
            .line("}");
        block
    }

    /// Render the whole file
    pub fn to_skel_string(&self) -> String {
        self.to_block().render()
    }

    /// Parse a `.skel` file, starting at its first `balljoint`
    pub fn parse(src: &str) -> Result<Self, FormatError> {
        run(src, skel_file)
    }

    /// Joint names in nesting (depth-first) order
    pub fn depth_first_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut stack = vec![self];
        while let Some(joint) = stack.pop() {
            names.push(joint.name.as_str());
            stack.extend(joint.children.iter().rev());
        }
        names
    }

    /// Total number of joints in this subtree
    pub fn joint_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.joint_count()).sum::<usize>()
    }
}

/// One line inside a joint block
enum JointItem {
    Offset([f32; 3]),
    BoxMin([f32; 3]),
    BoxMax([f32; 3]),
    Orient([f32; 9]),
    Pose([f32; 3]),
    Limit(usize, [f32; 2]),
    Child(BallJoint),
    Unknown,
}

/// Skip anything before the first `balljoint`, then read that joint
fn skel_file(input: &str) -> Res<'_, BallJoint> {
    let (input, _) = context(
        BALLJOINT_KEYWORD,
        many_till(token, keyword(BALLJOINT_KEYWORD)),
    )(input)?;
    cut(joint)(input)
}

/// `<name> { item* }` after the `balljoint` keyword
fn joint(input: &str) -> Res<'_, BallJoint> {
    let (input, name) = context("joint name", token)(input)?;
    let (input, _) = keyword("{")(input)?;
    let (input, (items, _)) = many_till(joint_item, keyword("}"))(input)?;

    let mut joint = BallJoint {
        name: name.to_string(),
        ..Default::default()
    };
    for item in items {
        match item {
            JointItem::Offset(v) => joint.offset = v,
            JointItem::BoxMin(v) => joint.box_min = v,
            JointItem::BoxMax(v) => joint.box_max = v,
            JointItem::Orient(m) => joint.orient = m,
            JointItem::Pose(v) => joint.pose = v,
            JointItem::Limit(axis, limit) => joint.rot_limits[axis] = Some(limit),
            JointItem::Child(child) => joint.children.push(child),
            JointItem::Unknown => {}
        }
    }
    Ok((input, joint))
}

fn joint_item(input: &str) -> Res<'_, JointItem> {
    let (input, key) = context("}", token)(input)?;
    match key {
        "offset" => cut(map(floats::<3>, JointItem::Offset))(input),
        "boxmin" => cut(map(floats::<3>, JointItem::BoxMin))(input),
        "boxmax" => cut(map(floats::<3>, JointItem::BoxMax))(input),
        "orient" => cut(map(floats::<9>, JointItem::Orient))(input),
        "pose" => cut(map(floats::<3>, JointItem::Pose))(input),
        "rotxlimit" => cut(map(floats::<2>, |l| JointItem::Limit(0, l)))(input),
        "rotylimit" => cut(map(floats::<2>, |l| JointItem::Limit(1, l)))(input),
        "rotzlimit" => cut(map(floats::<2>, |l| JointItem::Limit(2, l)))(input),
        BALLJOINT_KEYWORD => cut(map(joint, JointItem::Child))(input),
        _ => map(skip_line, |_| JointItem::Unknown)(input),
    }
}
