//! Line writer shared by both text formats

use super::{FLOAT_PRECISION, LINE_ENDING};

/// Format a float with exactly [`FLOAT_PRECISION`] fractional digits.
///
/// Values that round to zero are always written unsigned, so `-0.0` and `-1e-9`
/// both become `0.00000`.
pub fn format_float(value: f32) -> String {
    let text = format!("{:.*}", FLOAT_PRECISION, value);
    match text.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => text,
    }
}

/// Format a run of floats separated by single spaces
pub fn format_floats(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| format_float(*v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ordered lines of text, each tagged with its nesting depth.
///
/// Blocks compose by value: a child block is built on its own and then nested
/// into its parent, which shifts all of its lines one level deeper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    lines: Vec<(usize, String)>,
}

impl TextBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line at depth 0 of this block
    pub fn line(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push((0, text.into()));
        self
    }

    /// Append every line of `child` one level deeper than this block
    pub fn nest(&mut self, child: TextBlock) -> &mut Self {
        self.lines
            .extend(child.lines.into_iter().map(|(depth, text)| (depth + 1, text)));
        self
    }

    /// Append every line of `other` at its current depth
    pub fn append(&mut self, other: TextBlock) -> &mut Self {
        self.lines.extend(other.lines);
        self
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render with one tab per depth level and CRLF after every line
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (depth, text) in &self.lines {
            for _ in 0..*depth {
                out.push('\t');
            }
            out.push_str(text);
            out.push_str(LINE_ENDING);
        }
        out
    }
}
