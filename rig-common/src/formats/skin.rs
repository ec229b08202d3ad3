//! Skinned mesh format (.skin)
//!
//! # Layout
//! ```text
//! positions N { x y z ... }
//! normals N { x y z ... }
//! skinweights N { count (bone weight)*count ... }
//! triangles N { i0 i1 i2 ... }
//! bindings N { matrix { c0 c1 c2 t } ... }
//! ```
//!
//! Each binding matrix is a 3×4 affine transform written as four lines of three floats:
//! the three basis columns followed by the translation column. In memory it is stored
//! as 12 floats in column-major order:
//! [col0.x, col0.y, col0.z, col1.x, col1.y, col1.z, col2.x, col2.y, col2.z, tx, ty, tz]

use nom::{
    combinator::{cut, map},
    multi::many0,
};

use super::read::{Res, counted, exactly, floats, index, keyword, number, run, skip_line, token};
use super::{FormatError, TextBlock, format_float, format_floats};

/// 3×4 identity binding matrix (column-major)
pub const IDENTITY_BINDING: [f32; 12] = [
    1.0, 0.0, 0.0, // col0
    0.0, 1.0, 0.0, // col1
    0.0, 0.0, 1.0, // col2
    0.0, 0.0, 0.0, // translation
];

/// One bone influence on a vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinWeight {
    /// Index into the skeleton's depth-first joint order
    pub bone: u32,
    pub weight: f32,
}

/// Complete contents of a `.skin` file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinFile {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Per-vertex influences, in the same order as `positions`
    pub skin_weights: Vec<Vec<SkinWeight>>,
    pub triangles: Vec<[u32; 3]>,
    /// One 3×4 column-major matrix per bone
    pub bindings: Vec<[f32; 12]>,
}

impl SkinFile {
    pub fn positions_block(&self) -> TextBlock {
        vec3_block("positions", &self.positions)
    }

    pub fn normals_block(&self) -> TextBlock {
        vec3_block("normals", &self.normals)
    }

    pub fn skin_weights_block(&self) -> TextBlock {
        let mut body = TextBlock::new();
        for weights in &self.skin_weights {
            let mut line = weights.len().to_string();
            for w in weights {
                line.push_str(&format!(" {} {}", w.bone, format_float(w.weight)));
            }
            body.line(line);
        }
        counted_block("skinweights", self.skin_weights.len(), body)
    }

    pub fn triangles_block(&self) -> TextBlock {
        let mut body = TextBlock::new();
        for [a, b, c] in &self.triangles {
            body.line(format!("{} {} {}", a, b, c));
        }
        counted_block("triangles", self.triangles.len(), body)
    }

    pub fn bindings_block(&self) -> TextBlock {
        let mut body = TextBlock::new();
        for matrix in &self.bindings {
            let mut columns = TextBlock::new();
            for column in matrix.chunks_exact(3) {
                columns.line(format_floats(column));
            }
            body.line("matrix {").nest(columns).line("}");
        }
        counted_block("bindings", self.bindings.len(), body)
    }

    /// All five blocks in file order
    pub fn to_block(&self) -> TextBlock {
        let mut block = self.positions_block();
        block
            .append(self.normals_block())
            .append(self.skin_weights_block())
            .append(self.triangles_block())
            .append(self.bindings_block());
        block
    }

    /// Render the whole file
    pub fn to_skin_string(&self) -> String {
        self.to_block().render()
    }

    /// Parse a `.skin` file. Blocks may appear in any order; unknown keys skip a line.
    pub fn parse(src: &str) -> Result<Self, FormatError> {
        let sections = run(src, many0(section))?;

        let mut skin = SkinFile::default();
        for section in sections {
            match section {
                Section::Positions(v) => skin.positions = v,
                Section::Normals(v) => skin.normals = v,
                Section::SkinWeights(v) => skin.skin_weights = v,
                Section::Triangles(v) => skin.triangles = v,
                Section::Bindings(v) => skin.bindings = v,
                Section::Unknown => {}
            }
        }
        Ok(skin)
    }

    /// Check internal consistency, and bone references against `bone_count` if known
    pub fn validate(&self, bone_count: Option<usize>) -> Result<(), FormatError> {
        let vertex_count = self.positions.len();

        if self.normals.len() != vertex_count {
            return Err(FormatError::Invalid(format!(
                "{} normals for {} positions",
                self.normals.len(),
                vertex_count
            )));
        }
        if self.skin_weights.len() != vertex_count {
            return Err(FormatError::Invalid(format!(
                "{} skinweights for {} positions",
                self.skin_weights.len(),
                vertex_count
            )));
        }

        for (i, tri) in self.triangles.iter().enumerate() {
            if let Some(index) = tri.iter().find(|&&v| v as usize >= vertex_count) {
                return Err(FormatError::Invalid(format!(
                    "triangle {} references vertex {} (vertex count {})",
                    i, index, vertex_count
                )));
            }
        }

        let bone_count = bone_count.unwrap_or(self.bindings.len());
        if self.bindings.len() != bone_count {
            return Err(FormatError::Invalid(format!(
                "{} bindings for {} bones",
                self.bindings.len(),
                bone_count
            )));
        }
        for (i, weights) in self.skin_weights.iter().enumerate() {
            if let Some(w) = weights.iter().find(|w| w.bone as usize >= bone_count) {
                return Err(FormatError::Invalid(format!(
                    "vertex {} references bone {} (bone count {})",
                    i, w.bone, bone_count
                )));
            }
        }

        Ok(())
    }
}

fn counted_block(keyword: &str, count: usize, body: TextBlock) -> TextBlock {
    let mut block = TextBlock::new();
    block
        .line(format!("{} {} {{", keyword, count))
        .nest(body)
        .line("}");
    block
}

fn vec3_block(keyword: &str, values: &[[f32; 3]]) -> TextBlock {
    let mut body = TextBlock::new();
    for v in values {
        body.line(format_floats(v));
    }
    counted_block(keyword, values.len(), body)
}

/// One top-level block of a `.skin` file
enum Section {
    Positions(Vec<[f32; 3]>),
    Normals(Vec<[f32; 3]>),
    SkinWeights(Vec<Vec<SkinWeight>>),
    Triangles(Vec<[u32; 3]>),
    Bindings(Vec<[f32; 12]>),
    Unknown,
}

fn section(input: &str) -> Res<'_, Section> {
    let (input, key) = token(input)?;
    match key {
        "positions" => cut(map(counted(floats::<3>), Section::Positions))(input),
        "normals" => cut(map(counted(floats::<3>), Section::Normals))(input),
        "skinweights" => cut(map(counted(vertex_weights), Section::SkinWeights))(input),
        "triangles" => cut(map(counted(triangle), Section::Triangles))(input),
        "bindings" => cut(map(counted(matrix), Section::Bindings))(input),
        _ => map(skip_line, |_| Section::Unknown)(input),
    }
}

/// `count (bone weight)*count`
fn vertex_weights(input: &str) -> Res<'_, Vec<SkinWeight>> {
    let (input, count) = index(input)?;
    exactly(count as usize, skin_weight)(input)
}

fn skin_weight(input: &str) -> Res<'_, SkinWeight> {
    let (input, bone) = index(input)?;
    let (input, weight) = number(input)?;
    Ok((input, SkinWeight { bone, weight }))
}

fn triangle(input: &str) -> Res<'_, [u32; 3]> {
    let (input, a) = index(input)?;
    let (input, b) = index(input)?;
    let (input, c) = index(input)?;
    Ok((input, [a, b, c]))
}

/// `matrix { 12 floats }`
fn matrix(input: &str) -> Res<'_, [f32; 12]> {
    let (input, _) = keyword("matrix")(input)?;
    let (input, _) = keyword("{")(input)?;
    let (input, m) = floats::<12>(input)?;
    let (input, _) = keyword("}")(input)?;
    Ok((input, m))
}
