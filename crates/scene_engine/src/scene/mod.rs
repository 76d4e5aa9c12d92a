//! Scene graph and game object lifecycle
//!
//! ## Ownership
//!
//! ```text
//! GameObjectManager
//!   └── World (slot map arena)
//!         ├── GameObject ── ComponentSet (Transform, Camera, Sprite, ...)
//!         │     └── parent / children: ObjectId handles
//!         ├── RenderQueue (one RenderJob per visible object)
//!         └── ResourceLoader
//! ```
//!
//! Only the manager frees objects. Components flag objects for destruction and
//! the manager tears them down at the end of the tick, after every update for
//! that tick has run.
//!
//! ## Tick
//!
//! 1. Variable update of every live object not flagged for destruction, in
//!    insertion order.
//! 2. Fixed updates, one pass per whole fixed step accumulated.
//! 3. Shutdown, unload and free of every flagged object.

pub mod game_object;
pub mod level;
pub mod object_manager;
pub mod world;

#[cfg(test)]
mod tests;

pub use game_object::{GameObject, LifecycleState};
pub use level::{read_level, write_level, Level, LevelContext};
pub use object_manager::GameObjectManager;
pub use world::{World, MAX_HIERARCHY_DEPTH};

use crate::components::ComponentError;
use crate::serialization::ArchiveError;
use thiserror::Error;

/// Scene errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// An object failed to initialize and was not added
    #[error("Failed to initialize object '{name}': {source}")]
    Initialize {
        /// Object name
        name: String,
        /// Component failure
        #[source]
        source: ComponentError,
    },

    /// Level data could not be read or written
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Level-specific setup failure
    #[error("Level '{level}' failed: {reason}")]
    Level {
        /// Level name
        level: String,
        /// Failure description
        reason: String,
    },
}
