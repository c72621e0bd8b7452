//! Per-job extraction options.
//!
//! [`JobOptions`] carries everything the extraction service needs for one
//! download: source, destination, target format and playlist context. It is
//! assembled with [`OptionsBuilder`], which never fails and fills unset fields
//! with defaults (current directory, MP3 at 192).

mod builder;
mod sanitize;
mod types;

pub use builder::OptionsBuilder;
pub use sanitize::{sanitize_title, UNTITLED};
pub use types::JobOptions;
