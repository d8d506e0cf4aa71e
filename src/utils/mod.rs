//! Utility modules.

pub mod text;

pub use text::{ELLIPSIS, preview_line, truncate_snippet};
