//! Data models for the upload service
//!
//! Each sub-module represents a specific feature area.

mod challenge;
mod upload;

pub use challenge::*;
pub use upload::*;
