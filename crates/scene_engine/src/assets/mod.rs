//! Asset access
//!
//! Resources are loaded outside the per-tick paths (object initialization or
//! explicit load calls) and referenced by handle afterwards.

pub mod resource_manager;

pub use resource_manager::{ResourceError, ResourceLoader, ResourceManager, TextureInfo};
