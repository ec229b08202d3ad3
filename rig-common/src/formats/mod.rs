//! Text asset formats
//!
//! Both formats are line oriented, tab indented by nesting depth and use CRLF line
//! endings. Every float is written with exactly [`FLOAT_PRECISION`] fractional digits.

mod read;
mod skel;
mod skin;
mod text;

pub use skel::*;
pub use skin::*;
pub use text::*;

/// File extension for skeleton hierarchy files
pub const SKEL_EXT: &str = "skel";

/// File extension for skinned mesh files
pub const SKIN_EXT: &str = "skin";

/// Number of fractional digits written for every float
pub const FLOAT_PRECISION: usize = 5;

/// Line terminator used by both formats
pub const LINE_ENDING: &str = "\r\n";

/// Error raised while reading a `.skel` or `.skin` file
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    /// Input ended in the middle of a block
    #[error("unexpected end of input (expected {0})")]
    UnexpectedEof(&'static str),

    /// A specific token was required
    #[error("line {line}: expected '{expected}', found '{found}'")]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },

    /// A token could not be parsed as a number
    #[error("line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },

    /// Parsed data is internally inconsistent
    #[error("invalid data: {0}")]
    Invalid(String),
}
