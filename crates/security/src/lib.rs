//! Security module for Steward: keeps file tools inside the workspace.
//!
//! Provides:
//! - **Path confinement**: resolve a model-supplied path against the
//!   workspace root and reject anything that escapes it

pub mod path;

pub use path::{PathValidationError, resolve_in_workspace};
