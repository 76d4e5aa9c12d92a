//! Game objects: named component containers linked into a hierarchy

use crate::components::{Behavior, Component, ComponentKind, ComponentSet, ComponentType, Transform};
use crate::foundation::collections::{ObjectId, RenderJobId};

/// Where an object is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, not yet attached to a manager
    Created,
    /// `initialize` has run
    Initialized,
    /// `shutdown` has run
    ShutDown,
    /// `unload` has run; terminal
    Unloaded,
}

/// A named set of components with parent/child links
///
/// Parent and children are arena handles. A handle whose object has been
/// freed simply stops resolving.
#[derive(Debug, Clone)]
pub struct GameObject {
    name: String,
    pub(crate) components: ComponentSet,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    destroyed: bool,
    render_job: Option<RenderJobId>,
    lifecycle: LifecycleState,
}

impl GameObject {
    /// Empty object
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: ComponentSet::new(),
            parent: None,
            children: Vec::new(),
            destroyed: false,
            render_job: None,
            lifecycle: LifecycleState::Created,
        }
    }

    /// Attach a component (builder)
    pub fn with_component(mut self, component: impl Into<Component>) -> Self {
        self.add_component(component.into());
        self
    }

    /// Attach a user behavior (builder)
    pub fn with_behavior<B: Behavior + 'static>(self, behavior: B) -> Self {
        let boxed: Box<dyn Behavior> = Box::new(behavior);
        self.with_component(boxed)
    }

    /// Attach a component. Lookups return the first component of a kind.
    pub fn add_component(&mut self, component: Component) {
        self.components.add(component);
    }

    /// Object name; not unique
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the object
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// First component of type `T`
    pub fn get_component<T: ComponentType>(&self) -> Option<&T> {
        self.components.get::<T>()
    }

    /// First component of type `T`, mutably
    pub fn get_component_mut<T: ComponentType>(&mut self) -> Option<&mut T> {
        self.components.get_mut::<T>()
    }

    /// First component of `kind`
    pub fn component(&self, kind: ComponentKind) -> Option<&Component> {
        self.components.by_kind(kind)
    }

    /// All components in attachment order
    pub fn components(&self) -> &ComponentSet {
        &self.components
    }

    /// Parent handle
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Child handles
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// Flag the object for destruction at the end of the current tick
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    /// Whether the object is flagged for destruction
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Render job fed by this object
    pub fn render_job(&self) -> Option<RenderJobId> {
        self.render_job
    }

    /// Lifecycle position
    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    pub(crate) fn set_lifecycle(&mut self, lifecycle: LifecycleState) {
        self.lifecycle = lifecycle;
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ObjectId>) {
        self.parent = parent;
    }

    pub(crate) fn push_child(&mut self, child: ObjectId) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: ObjectId) {
        self.children.retain(|id| *id != child);
    }

    pub(crate) fn set_render_job(&mut self, job: RenderJobId) {
        self.render_job = Some(job);
    }

    pub(crate) fn take_render_job(&mut self) -> Option<RenderJobId> {
        self.render_job.take()
    }

    /// Independent copy for instantiating an archetype
    ///
    /// Component values are duplicated, loaded textures are shared by handle.
    /// Links, the render job, the destroy flag and the lifecycle are reset,
    /// and the Transform is marked dirty so the copy recomposes on its first
    /// update.
    pub fn clone_archetype(&self) -> Self {
        let mut copy = self.clone();
        copy.parent = None;
        copy.children.clear();
        copy.destroyed = false;
        copy.render_job = None;
        copy.lifecycle = LifecycleState::Created;
        if let Some(transform) = copy.components.get_mut::<Transform>() {
            transform.mark_dirty();
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Camera, Sprite};
    use crate::foundation::math::Vec3;

    #[test]
    fn test_component_lookup() {
        let object = GameObject::new("Player")
            .with_component(Transform::new())
            .with_component(Sprite::new("player.png"));

        assert!(object.get_component::<Transform>().is_some());
        assert!(object.get_component::<Camera>().is_none());
        assert_eq!(object.component(ComponentKind::Sprite).map(Component::kind), Some(ComponentKind::Sprite));
    }

    #[test]
    fn test_destroy_only_sets_flag() {
        let mut object = GameObject::new("Bullet").with_component(Transform::new());
        object.destroy();

        assert!(object.is_destroyed());
        assert_eq!(object.lifecycle(), LifecycleState::Created);
        assert!(object.get_component::<Transform>().is_some());
    }

    #[test]
    fn test_clone_archetype_is_independent() {
        let archetype = GameObject::new("Enemy")
            .with_component(Transform::new().with_translation(Vec3::new(1.0, 2.0, 0.0)));

        let mut copy = archetype.clone_archetype();
        copy.get_component_mut::<Transform>()
            .unwrap()
            .set_local_translation(Vec3::new(9.0, 9.0, 0.0));

        assert_eq!(
            archetype.get_component::<Transform>().unwrap().local_translation(),
            Vec3::new(1.0, 2.0, 0.0)
        );
        assert!(copy.get_component::<Transform>().unwrap().is_dirty());
        assert_eq!(copy.lifecycle(), LifecycleState::Created);
    }
}
