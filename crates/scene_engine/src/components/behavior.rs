//! User-defined logic attached as a component
//!
//! ```ignore
//! #[derive(Clone)]
//! struct Spin { speed: f32 }
//!
//! impl Behavior for Spin {
//!     fn name(&self) -> &str { "Spin" }
//!     fn clone_box(&self) -> Box<dyn Behavior> { Box::new(self.clone()) }
//!     fn update(&mut self, dt: f32, ctx: &mut ComponentContext<'_>) {
//!         if let Some(transform) = ctx.siblings_mut().get_mut::<Transform>() {
//!             let angle = transform.local_rotation() + self.speed * dt;
//!             transform.set_local_rotation(angle);
//!         }
//!     }
//! }
//! ```
//!
//! A behavior that changes its object's Transform should be attached before
//! the Transform so the change is composed in the same frame.

use crate::components::{ComponentContext, ComponentError};
use std::fmt;

/// Hooks invoked by the owning object's lifecycle
///
/// Every hook has an empty default. Behaviors are cloned when an archetype is
/// instantiated, so `clone_box` must produce an independent copy.
pub trait Behavior {
    /// Name used in logs and when the owner is serialized
    fn name(&self) -> &str;

    /// Independent copy of this behavior
    fn clone_box(&self) -> Box<dyn Behavior>;

    /// Called once when the owner is attached to the manager
    fn initialize(&mut self, _ctx: &mut ComponentContext<'_>) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Variable-rate update
    fn update(&mut self, _dt: f32, _ctx: &mut ComponentContext<'_>) {}

    /// Fixed-rate update
    fn fixed_update(&mut self, _dt: f32, _ctx: &mut ComponentContext<'_>) {}

    /// First half of teardown
    fn shutdown(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Second half of teardown
    fn unload(&mut self, _ctx: &mut ComponentContext<'_>) {}
}

impl Clone for Box<dyn Behavior> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl fmt::Debug for dyn Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior").field("name", &self.name()).finish()
    }
}
