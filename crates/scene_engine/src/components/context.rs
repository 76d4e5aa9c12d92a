//! Per-call view handed to component hooks

use crate::assets::ResourceLoader;
use crate::components::{Siblings, Transform};
use crate::foundation::collections::{ObjectId, RenderJobId};
use crate::foundation::math::Mat3;
use crate::render::UvRect;
use crate::scene::World;

/// What a component can reach while one of its hooks runs
///
/// The owner's own components are not in the world during dispatch; they are
/// reached through [`ComponentContext::siblings`].
pub struct ComponentContext<'a> {
    owner: ObjectId,
    world: &'a mut World,
    siblings: Siblings<'a>,
}

impl<'a> ComponentContext<'a> {
    /// Create a context for a hook of `owner`
    pub fn new(owner: ObjectId, world: &'a mut World, siblings: Siblings<'a>) -> Self {
        Self {
            owner,
            world,
            siblings,
        }
    }

    /// Object the component is attached to
    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    /// Parent of the owner, if it is still alive
    pub fn parent(&self) -> Option<ObjectId> {
        self.world
            .object(self.owner)
            .and_then(|object| object.parent())
            .filter(|parent| self.world.contains(*parent))
    }

    /// Other components of the owner
    pub fn siblings(&self) -> &Siblings<'a> {
        &self.siblings
    }

    /// Other components of the owner, mutably
    pub fn siblings_mut(&mut self) -> &mut Siblings<'a> {
        &mut self.siblings
    }

    /// The object arena
    pub fn world(&self) -> &World {
        &*self.world
    }

    /// The object arena, mutably
    pub fn world_mut(&mut self) -> &mut World {
        &mut *self.world
    }

    /// Texture loader
    pub fn resources_mut(&mut self) -> &mut dyn ResourceLoader {
        self.world.resources_mut()
    }

    /// Global matrix of the owner's parent, reconciling the parent chain first
    pub fn resolve_parent_global(&mut self) -> Option<Mat3> {
        let parent = self.parent()?;
        self.world.resolve_global(parent)
    }

    /// Global matrix of the owner, from its Transform and the parent chain
    pub fn resolve_owner_global(&mut self) -> Option<Mat3> {
        let parent_global = self.resolve_parent_global();
        let transform = self.siblings.get_mut::<Transform>()?;
        transform.reconstruct_transformation();
        Some(transform.global_transformation_with(parent_global.as_ref()))
    }

    /// Global matrix of any object
    ///
    /// Unlike [`World::resolve_global`], chains that run through the owner
    /// are composed with the owner's Transform even though it is out of the
    /// world for this hook.
    pub fn resolve_global(&mut self, id: ObjectId) -> Option<Mat3> {
        if id == self.owner {
            return self.resolve_owner_global();
        }
        if self.world.is_ancestor(self.owner, id) {
            let owner_global = self.resolve_owner_global();
            return self.world.resolve_global_anchored(id, self.owner, owner_global);
        }
        self.world.resolve_global(id)
    }

    /// Render job of the owner
    pub fn render_job(&self) -> Option<RenderJobId> {
        self.world.object(self.owner).and_then(|object| object.render_job())
    }

    /// Publish the owner's global matrix to its render job
    pub fn set_render_transformation(&mut self, transformation: Mat3) -> bool {
        match self.render_job() {
            Some(job) => self.world.render_queue_mut().set_transformation(job, transformation),
            None => false,
        }
    }

    /// Publish the owner's atlas rectangle to its render job
    pub fn set_render_uv_rect(&mut self, uv_rect: UvRect) -> bool {
        match self.render_job() {
            Some(job) => self.world.render_queue_mut().set_uv_rect(job, uv_rect),
            None => false,
        }
    }

    /// Retire the owner's render job and detach it from the owner
    pub fn retire_render_job(&mut self) {
        let job = self
            .world
            .object_mut(self.owner)
            .and_then(|object| object.take_render_job());
        if let Some(job) = job {
            self.world.render_queue_mut().retire(job);
        }
    }

    /// Flag the owner for destruction at the end of the tick
    pub fn destroy_owner(&mut self) {
        self.destroy(self.owner);
    }

    /// Flag any object for destruction at the end of the tick
    pub fn destroy(&mut self, id: ObjectId) -> bool {
        match self.world.object_mut(id) {
            Some(object) => {
                object.destroy();
                true
            }
            None => false,
        }
    }
}
