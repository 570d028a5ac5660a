//! Configuration loading, merging, and projection
//!
//! Handles layered YAML sources (script defaults, grid, machine, namelist,
//! user overrides) with fixed precedence, deletion-by-null overlay semantics,
//! and a dotted-path namespace view for templating.

pub mod interp;
pub mod loader;
pub mod merge;
pub mod namespace;

pub use interp::interpolate;
pub use loader::{get_key, load_document, load_section};
pub use merge::{merge, merge_opt};
pub use namespace::ConfigNamespace;
