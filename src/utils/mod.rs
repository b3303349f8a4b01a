//! Shared utility functions.
//!
//! - `filename`: sanitising and validating user-supplied file names
//! - `text`: character-safe context windows around matches

mod filename;
mod text;

pub use filename::{file_stem, is_plain_filename, sanitize_filename};
pub use text::context_window;
