//! # Scene Engine
//!
//! A 2D scene-graph engine: game objects carry a fixed set of components,
//! parent/child links compose transforms lazily, and sprites are drawn in a
//! single instanced batch per frame.
//!
//! ## Features
//!
//! - **Scene graph**: Hierarchical 2D transforms, reconciled on demand
//! - **Components**: Transform, Camera, Sprite, Animator and user behaviors
//! - **Deferred destruction**: Objects are flagged, then freed after the tick
//! - **Level files**: Levels written to and rebuilt from RON archives
//! - **Events**: Named events with subscribe/unsubscribe and a frame queue
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! struct MyLevel;
//!
//! impl Level for MyLevel {
//!     fn name(&self) -> &str {
//!         "MyLevel"
//!     }
//!
//!     fn initialize(&mut self, ctx: &mut LevelContext<'_>) -> Result<(), SceneError> {
//!         ctx.manager.add_object(
//!             GameObject::new("Player")
//!                 .with_component(Transform::new())
//!                 .with_component(Sprite::new("assets/player.png")),
//!         )?;
//!         Ok(())
//!     }
//! }
//!
//! struct NullBackend;
//!
//! impl RenderBackend for NullBackend {
//!     fn draw_instanced(&mut self, _batch: &InstanceBatch) -> Result<(), RenderError> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!     engine.start_level(Box::new(MyLevel))?;
//!     engine.tick(&mut NullBackend)?;
//!     engine.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod components;
pub mod config;
pub mod events;
pub mod foundation;
pub mod render;
pub mod scene;
pub mod serialization;

mod engine;

pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{ResourceLoader, ResourceManager},
        components::{
            Animator, Behavior, Camera, Component, ComponentContext, ComponentError, ComponentKind,
            Interpolation, ParticleEmitter, ProjectionMode, Sprite, Transform,
        },
        config::{Config, EngineConfig, FixedUpdatePolicy},
        events::{keys, Event, EventBus, KeyAction, KeyModifiers},
        foundation::{
            collections::ObjectId,
            math::{Mat3, Mat3Ext, Vec2, Vec3, Vec4},
            time::Timer,
        },
        render::{InstanceBatch, RenderBackend, RenderError},
        scene::{GameObject, GameObjectManager, Level, LevelContext, SceneError},
        Engine, EngineError,
    };
}
