//! Shared types and utilities for the `.skel` / `.skin` text formats
//!
//! This crate provides format definitions shared between:
//! - `rig-export` (asset pipeline, writes the files)
//! - engines and tools that load the files back
//!
//! # Modules
//!
//! - [`formats`] - Text block writer, nom readers and the two file formats

pub mod formats;

// Re-export commonly used format items
pub use formats::{
    // Skeleton
    BallJoint,
    // Constants
    FLOAT_PRECISION,
    // Errors
    FormatError,
    LINE_ENDING,
    SKEL_EXT,
    SKIN_EXT,
    // Skin
    SkinFile,
    SkinWeight,
    // Text plumbing
    TextBlock,
    format_float,
};
