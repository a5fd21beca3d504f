//! Path-addressed access to JSON trees.
//!
//! Paths travel on the wire as dot-separated strings (`debates.2.ballot`)
//! and are parsed once into typed [`PathSegment`]s. The accessors never
//! mutate their input unless the caller hands over ownership.

mod accessor;
mod segment;

pub use accessor::{clone_tree, get_path, get_path_mut, update_path, update_path_owned};
pub use segment::{PatchTarget, Path, PathSegment, ROOT_PATH};
