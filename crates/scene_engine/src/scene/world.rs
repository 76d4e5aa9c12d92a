//! Object arena
//!
//! The [`World`] owns every game object (live ones and archetypes) in a
//! generation-checked slot map, together with the render queue the objects
//! publish into and the resource loader their components load through.
//!
//! Lifecycle hooks run through [`World::for_each_component`]: the object's
//! components are moved out of the arena for the duration of the call, so a
//! component can mutate any other object (or read its siblings) without
//! aliasing itself.

use crate::assets::ResourceLoader;
use crate::components::{
    transform, Component, ComponentContext, ComponentError, ComponentKind, Siblings, Sprite, Transform,
};
use crate::foundation::collections::{HandleMap, ObjectId};
use crate::foundation::math::{Mat3, Vec2};
use crate::render::RenderQueue;
use crate::scene::game_object::{GameObject, LifecycleState};
use std::convert::Infallible;

/// Deepest parent chain walked before a hierarchy is treated as cyclic
pub const MAX_HIERARCHY_DEPTH: usize = 64;

/// Arena of game objects plus the shared render queue and resource loader
pub struct World {
    objects: HandleMap<ObjectId, GameObject>,
    render_queue: RenderQueue,
    resources: Box<dyn ResourceLoader>,
    dispatching: Vec<ObjectId>,
}

impl World {
    /// Create an empty world loading resources through `resources`
    pub fn new(resources: Box<dyn ResourceLoader>) -> Self {
        Self {
            objects: HandleMap::with_key(),
            render_queue: RenderQueue::new(),
            resources,
            dispatching: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, object: GameObject) -> ObjectId {
        self.objects.insert(object)
    }

    /// Free an object: unlink it from its parent and retire any render job it
    /// still holds. Children keep their (now stale) parent handle.
    pub(crate) fn remove(&mut self, id: ObjectId) -> Option<GameObject> {
        let mut object = self.objects.remove(id)?;

        if let Some(parent) = object.parent().and_then(|parent| self.objects.get_mut(parent)) {
            parent.remove_child(id);
        }
        for &child in object.children() {
            if let Some(child) = self.objects.get_mut(child) {
                if child.parent() == Some(id) {
                    child.set_parent(None);
                }
            }
        }
        if let Some(job) = object.take_render_job() {
            self.render_queue.retire(job);
        }
        Some(object)
    }

    /// Whether `id` refers to an object in the arena
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Look up an object
    pub fn object(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    /// Look up an object mutably
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(id)
    }

    /// Number of objects in the arena, archetypes included
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Render jobs of every visible object
    pub fn render_queue(&self) -> &RenderQueue {
        &self.render_queue
    }

    /// Render jobs, mutably
    pub fn render_queue_mut(&mut self) -> &mut RenderQueue {
        &mut self.render_queue
    }

    /// Resource loader
    pub fn resources(&self) -> &dyn ResourceLoader {
        self.resources.as_ref()
    }

    /// Resource loader, mutably
    pub fn resources_mut(&mut self) -> &mut dyn ResourceLoader {
        self.resources.as_mut()
    }

    /// Make `child` a child of `parent`
    ///
    /// The child's previous parent is not detached; call
    /// [`World::remove_child`] first when re-parenting. Links that would
    /// make an object its own ancestor are refused.
    pub fn add_child(&mut self, parent: ObjectId, child: ObjectId) -> bool {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return false;
        }
        if self.is_ancestor(child, parent) {
            log::warn!("Refusing to parent {:?} under its own descendant {:?}", child, parent);
            return false;
        }

        if let Some(object) = self.objects.get_mut(child) {
            if let Some(previous) = object.parent() {
                log::warn!("{:?} already has parent {:?}; overwriting the link", child, previous);
            }
            object.set_parent(Some(parent));
        }
        if let Some(object) = self.objects.get_mut(parent) {
            object.push_child(child);
        }
        true
    }

    /// Undo [`World::add_child`]
    pub fn remove_child(&mut self, parent: ObjectId, child: ObjectId) -> bool {
        let linked = self
            .objects
            .get(child)
            .map_or(false, |object| object.parent() == Some(parent));
        if !linked {
            return false;
        }

        if let Some(object) = self.objects.get_mut(child) {
            object.set_parent(None);
        }
        if let Some(object) = self.objects.get_mut(parent) {
            object.remove_child(child);
        }
        true
    }

    /// Whether `candidate` is an ancestor of `of`
    pub(crate) fn is_ancestor(&self, candidate: ObjectId, of: ObjectId) -> bool {
        let mut current = self.objects.get(of).and_then(GameObject::parent);
        let mut depth = 0;
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            depth += 1;
            if depth > MAX_HIERARCHY_DEPTH {
                return true;
            }
            current = self.objects.get(id).and_then(GameObject::parent);
        }
        false
    }

    /// Global matrix of `id`, reconciling it and all of its ancestors first
    ///
    /// Cameras met on the way have their view refreshed. Returns `None` when
    /// the object is gone or has no Transform, and when the chain runs
    /// through an object whose components are out for dispatch. From inside
    /// a hook use [`ComponentContext::resolve_global`], which composes
    /// through the dispatching owner.
    pub fn resolve_global(&mut self, id: ObjectId) -> Option<Mat3> {
        self.resolve_global_at(id, 0, None)
    }

    /// Like [`World::resolve_global`], with the global matrix of `anchor`
    /// supplied by the caller instead of read from the arena
    pub(crate) fn resolve_global_anchored(
        &mut self,
        id: ObjectId,
        anchor: ObjectId,
        anchor_global: Option<Mat3>,
    ) -> Option<Mat3> {
        self.resolve_global_at(id, 0, Some((anchor, anchor_global)))
    }

    fn blocked_by_dispatch(&self, id: ObjectId) -> bool {
        if self.dispatching.contains(&id) {
            log::warn!("Global transform through {:?} requested while its components are dispatching", id);
            return true;
        }
        false
    }

    fn resolve_global_at(
        &mut self,
        id: ObjectId,
        depth: usize,
        anchor: Option<(ObjectId, Option<Mat3>)>,
    ) -> Option<Mat3> {
        if depth > MAX_HIERARCHY_DEPTH {
            log::warn!("Parent chain of {:?} exceeds {} levels; assuming a cycle", id, MAX_HIERARCHY_DEPTH);
            return None;
        }
        if let Some((anchor_id, anchor_global)) = anchor {
            if anchor_id == id {
                return anchor_global;
            }
        }
        if self.blocked_by_dispatch(id) {
            return None;
        }

        let object = self.objects.get(id)?;
        if !object.components.has(ComponentKind::Transform) {
            return None;
        }
        let parent_global = match object.parent() {
            Some(parent) => {
                let anchored = anchor.map_or(false, |(anchor_id, _)| anchor_id == parent);
                if !anchored && self.blocked_by_dispatch(parent) {
                    return None;
                }
                self.resolve_global_at(parent, depth + 1, anchor)
            }
            None => None,
        };

        let object = self.objects.get_mut(id)?;
        let (transform, camera) = object.components.transform_and_camera_mut();
        let transform = transform?;
        transform.reconstruct_transformation();
        let global = transform.global_transformation_with(parent_global.as_ref());
        if let Some(camera) = camera {
            camera.update_view(&global);
        }
        Some(global)
    }

    /// Global matrix of `id` from the cached local matrices, without
    /// applying pending setter changes
    ///
    /// `None` under the same conditions as [`World::resolve_global`].
    pub fn global_transformation(&self, id: ObjectId) -> Option<Mat3> {
        self.cached_global_at(id, 0)
    }

    fn cached_global_at(&self, id: ObjectId, depth: usize) -> Option<Mat3> {
        if depth > MAX_HIERARCHY_DEPTH || self.blocked_by_dispatch(id) {
            return None;
        }

        let object = self.objects.get(id)?;
        let transform = object.get_component::<Transform>()?;
        let parent_global = match object.parent() {
            Some(parent) if self.blocked_by_dispatch(parent) => return None,
            Some(parent) => self.cached_global_at(parent, depth + 1),
            None => None,
        };
        Some(transform.global_transformation_with(parent_global.as_ref()))
    }

    /// Translation of the global matrix
    pub fn global_translation(&self, id: ObjectId) -> Option<Vec2> {
        self.global_transformation(id).map(|m| transform::decompose_translation(&m))
    }

    /// Rotation of the global matrix (lossy, see [`transform::decompose_rotation`])
    pub fn global_rotation(&self, id: ObjectId) -> Option<f32> {
        self.global_transformation(id).map(|m| transform::decompose_rotation(&m))
    }

    /// Per-axis scale of the global matrix
    pub fn global_scaling(&self, id: ObjectId) -> Option<Vec2> {
        self.global_transformation(id).map(|m| transform::decompose_scaling(&m))
    }

    /// Give a sprite-bearing object a render job if it has none
    pub(crate) fn attach_render_job(&mut self, id: ObjectId) {
        let needs_job = self
            .objects
            .get(id)
            .map_or(false, |object| object.render_job().is_none() && object.get_component::<Sprite>().is_some());
        if needs_job {
            let job = self.render_queue.acquire();
            if let Some(object) = self.objects.get_mut(id) {
                object.set_render_job(job);
            }
        }
    }

    /// Run `hook` on each component of `id` in attachment order
    ///
    /// Stops at the first error. The components are back in place when this
    /// returns, whatever the outcome.
    pub fn for_each_component<F>(&mut self, id: ObjectId, hook: F) -> Result<(), ComponentError>
    where
        F: FnMut(&mut Component, &mut ComponentContext<'_>) -> Result<(), ComponentError>,
    {
        self.dispatch(id, hook)
    }

    /// Run an infallible `hook` on each component of `id` in attachment order
    pub fn visit_components<F>(&mut self, id: ObjectId, mut hook: F)
    where
        F: FnMut(&mut Component, &mut ComponentContext<'_>),
    {
        let result: Result<(), Infallible> = self.dispatch(id, |component, ctx| {
            hook(component, ctx);
            Ok(())
        });
        match result {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    fn dispatch<E, F>(&mut self, id: ObjectId, mut hook: F) -> Result<(), E>
    where
        F: FnMut(&mut Component, &mut ComponentContext<'_>) -> Result<(), E>,
    {
        let mut components = match self.objects.get_mut(id) {
            Some(object) => std::mem::take(&mut object.components),
            None => return Ok(()),
        };
        self.dispatching.push(id);

        let mut result = Ok(());
        let slice = components.as_mut_slice();
        for index in 0..slice.len() {
            let (before, rest) = slice.split_at_mut(index);
            if let Some((current, after)) = rest.split_first_mut() {
                let mut ctx = ComponentContext::new(id, self, Siblings::new(before, after));
                if let Err(error) = hook(current, &mut ctx) {
                    result = Err(error);
                    break;
                }
            }
        }

        self.dispatching.pop();
        if let Some(object) = self.objects.get_mut(id) {
            object.components = components;
        }
        result
    }

    pub(crate) fn initialize_object(&mut self, id: ObjectId) -> Result<(), ComponentError> {
        self.for_each_component(id, |component, ctx| component.initialize(ctx))?;
        if let Some(object) = self.objects.get_mut(id) {
            object.set_lifecycle(LifecycleState::Initialized);
        }
        Ok(())
    }

    pub(crate) fn update_object(&mut self, id: ObjectId, dt: f32) {
        self.visit_components(id, |component, ctx| component.update(dt, ctx));
    }

    pub(crate) fn fixed_update_object(&mut self, id: ObjectId, dt: f32) {
        self.visit_components(id, |component, ctx| component.fixed_update(dt, ctx));
    }

    /// Run shutdown unless it already ran. Returns whether hooks were called.
    pub(crate) fn shutdown_object(&mut self, id: ObjectId) -> bool {
        match self.objects.get(id).map(GameObject::lifecycle) {
            Some(LifecycleState::Created) | Some(LifecycleState::Initialized) => {}
            Some(state) => {
                log::warn!("Skipping shutdown of {:?}: already {:?}", id, state);
                return false;
            }
            None => return false,
        }

        self.visit_components(id, |component, ctx| component.shutdown(ctx));
        if let Some(object) = self.objects.get_mut(id) {
            object.set_lifecycle(LifecycleState::ShutDown);
        }
        true
    }

    /// Run unload once, after shutdown. Returns whether hooks were called.
    pub(crate) fn unload_object(&mut self, id: ObjectId) -> bool {
        match self.objects.get(id).map(GameObject::lifecycle) {
            Some(LifecycleState::ShutDown) => {}
            Some(state) => {
                log::warn!("Skipping unload of {:?}: object is {:?}", id, state);
                return false;
            }
            None => return false,
        }

        self.visit_components(id, |component, ctx| component.unload(ctx));
        if let Some(object) = self.objects.get_mut(id) {
            object.set_lifecycle(LifecycleState::Unloaded);
        }
        true
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("objects", &self.objects.len())
            .field("render_jobs", &self.render_queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ResourceManager;
    use crate::components::Camera;
    use crate::foundation::math::{Mat3Ext, Vec3};
    use approx::assert_relative_eq;

    fn world() -> World {
        World::new(Box::new(ResourceManager::new(64, 64)))
    }

    fn positioned(name: &str, x: f32, y: f32) -> GameObject {
        GameObject::new(name).with_component(Transform::new().with_translation(Vec3::new(x, y, 0.0)))
    }

    #[test]
    fn test_resolve_global_reconciles_ancestors() {
        let mut world = world();
        let parent = world.insert(positioned("Parent", 10.0, 0.0));
        let child = world.insert(positioned("Child", 0.0, 5.0));
        assert!(world.add_child(parent, child));

        let global = world.resolve_global(child).unwrap();
        assert_relative_eq!(global.extract_translation(), Vec2::new(10.0, 5.0), epsilon = 1e-6);

        let parent_transform = world.object(parent).unwrap().get_component::<Transform>().unwrap();
        assert!(!parent_transform.is_dirty());
    }

    #[test]
    fn test_parent_without_transform_is_ignored() {
        let mut world = world();
        let parent = world.insert(GameObject::new("Folder"));
        let child = world.insert(positioned("Child", 1.0, 2.0));
        world.add_child(parent, child);

        let global = world.resolve_global(child).unwrap();
        assert_relative_eq!(global.extract_translation(), Vec2::new(1.0, 2.0), epsilon = 1e-6);
    }

    #[test]
    fn test_cycles_are_refused() {
        let mut world = world();
        let a = world.insert(positioned("A", 0.0, 0.0));
        let b = world.insert(positioned("B", 0.0, 0.0));

        assert!(world.add_child(a, b));
        assert!(!world.add_child(b, a));
        assert!(!world.add_child(a, a));
    }

    #[test]
    fn test_resolve_updates_camera_view() {
        let mut world = world();
        let camera = world.insert(positioned("Camera", 4.0, 0.0).with_component(Camera::default()));

        world.resolve_global(camera);
        let view = *world.object(camera).unwrap().get_component::<Camera>().unwrap().view();
        assert_relative_eq!(view, Mat3::translation_2d(&Vec3::new(-4.0, 0.0, 0.0)), epsilon = 1e-6);
    }

    #[test]
    fn test_removed_parent_leaves_child_unparented() {
        let mut world = world();
        let parent = world.insert(positioned("Parent", 10.0, 0.0));
        let child = world.insert(positioned("Child", 1.0, 0.0));
        world.add_child(parent, child);

        world.remove(parent);
        let global = world.resolve_global(child).unwrap();
        assert_relative_eq!(global.extract_translation(), Vec2::new(1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_visit_components_restores_components() {
        let mut world = world();
        let parent = world.insert(positioned("Parent", 3.0, 0.0).with_component(Camera::default()));
        let child = world.insert(positioned("Child", 1.0, 0.0));
        world.add_child(parent, child);

        let mut seen = Vec::new();
        let mut child_global = Some(Mat3::identity());
        world.visit_components(parent, |component, ctx| {
            seen.push(component.kind());
            child_global = ctx.world_mut().resolve_global(child);
        });

        assert_eq!(seen, vec![ComponentKind::Transform, ComponentKind::Camera]);
        assert_eq!(child_global, None);
        assert_eq!(world.object(parent).unwrap().components().len(), 2);
        let global = world.resolve_global(child).unwrap();
        assert_relative_eq!(global.extract_translation(), Vec2::new(4.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_remove_child_detaches_both_sides() {
        let mut world = world();
        let parent = world.insert(positioned("Parent", 0.0, 0.0));
        let child = world.insert(positioned("Child", 0.0, 0.0));
        world.add_child(parent, child);

        assert!(world.remove_child(parent, child));
        assert!(world.object(parent).unwrap().children().is_empty());
        assert_eq!(world.object(child).unwrap().parent(), None);
    }
}
