//! Components attached to game objects
//!
//! The set of component kinds is closed: every component is one variant of
//! [`Component`]. User logic plugs in through the [`Behavior`] trait object
//! carried by [`Component::Behavior`].
//!
//! ## Dispatch
//!
//! While an object's lifecycle runs, its components are taken out of the
//! arena. Each component in turn receives a [`ComponentContext`] holding the
//! rest of the world plus a [`Siblings`] view over the components attached
//! before and after it:
//!
//! ```text
//! [ Transform | Camera | Sprite | Animator ]
//!   before ──┘    ▲      └── after
//!              current
//! ```
//!
//! Components run in attachment order, so a component that reads a sibling's
//! state sees this frame's value only if the sibling was attached first.

pub mod animator;
pub mod behavior;
pub mod camera;
pub mod context;
pub mod particle_emitter;
pub mod sprite;
pub mod transform;

pub use animator::Animator;
pub use behavior::Behavior;
pub use camera::{Camera, ProjectionMode};
pub use context::ComponentContext;
pub use particle_emitter::{Interpolation, ParticleEmitter};
pub use sprite::Sprite;
pub use transform::Transform;

use crate::assets::ResourceError;
use crate::serialization::{ArchiveError, ArchiveWriter, Scope};
use thiserror::Error;

/// Errors raised by component lifecycle hooks
#[derive(Debug, Error)]
pub enum ComponentError {
    /// A resource required by the component failed to load
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Stored component data could not be read
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// User behavior failed to initialize
    #[error("Behavior '{name}' failed: {reason}")]
    Behavior {
        /// Behavior name
        name: String,
        /// Failure description
        reason: String,
    },
}

/// Tag identifying a component kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Local/global pose
    Transform,
    /// View and projection
    Camera,
    /// Textured quad
    Sprite,
    /// Sprite sheet animation
    Animator,
    /// Burst particle effect
    ParticleEmitter,
    /// User logic
    Behavior,
}

impl ComponentKind {
    /// Every kind, in declaration order
    pub const ALL: [ComponentKind; 6] = [
        ComponentKind::Transform,
        ComponentKind::Camera,
        ComponentKind::Sprite,
        ComponentKind::Animator,
        ComponentKind::ParticleEmitter,
        ComponentKind::Behavior,
    ];

    /// Name used as the component's scope name when serialized
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transform => "Transform",
            Self::Camera => "Camera",
            Self::Sprite => "Sprite",
            Self::Animator => "Animator",
            Self::ParticleEmitter => "ParticleEmitter",
            Self::Behavior => "Behavior",
        }
    }

    /// Parse a serialized kind name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// A component attached to a game object
#[derive(Debug, Clone)]
pub enum Component {
    /// See [`Transform`]
    Transform(Transform),
    /// See [`Camera`]
    Camera(Camera),
    /// See [`Sprite`]
    Sprite(Sprite),
    /// See [`Animator`]
    Animator(Animator),
    /// See [`ParticleEmitter`]
    ParticleEmitter(ParticleEmitter),
    /// User logic, see [`Behavior`]
    Behavior(Box<dyn Behavior>),
}

impl Component {
    /// Kind tag of this component
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Transform(_) => ComponentKind::Transform,
            Self::Camera(_) => ComponentKind::Camera,
            Self::Sprite(_) => ComponentKind::Sprite,
            Self::Animator(_) => ComponentKind::Animator,
            Self::ParticleEmitter(_) => ComponentKind::ParticleEmitter,
            Self::Behavior(_) => ComponentKind::Behavior,
        }
    }

    /// Called once after the owner is attached to the manager
    pub fn initialize(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), ComponentError> {
        match self {
            Self::Transform(transform) => {
                transform.reconstruct_transformation();
                Ok(())
            }
            Self::Sprite(sprite) => sprite.initialize(ctx),
            Self::ParticleEmitter(emitter) => emitter.initialize(ctx),
            Self::Behavior(behavior) => behavior.initialize(ctx),
            Self::Camera(_) | Self::Animator(_) => Ok(()),
        }
    }

    /// Variable-rate update
    pub fn update(&mut self, dt: f32, ctx: &mut ComponentContext<'_>) {
        match self {
            Self::Transform(transform) => transform.update(ctx),
            Self::Sprite(sprite) => sprite.update(ctx),
            Self::Animator(animator) => animator.update(dt, ctx),
            Self::ParticleEmitter(emitter) => emitter.update(dt, ctx),
            Self::Behavior(behavior) => behavior.update(dt, ctx),
            Self::Camera(_) => {}
        }
    }

    /// Fixed-rate update
    pub fn fixed_update(&mut self, dt: f32, ctx: &mut ComponentContext<'_>) {
        if let Self::Behavior(behavior) = self {
            behavior.fixed_update(dt, ctx);
        }
    }

    /// First half of teardown
    pub fn shutdown(&mut self, ctx: &mut ComponentContext<'_>) {
        match self {
            Self::Sprite(sprite) => sprite.shutdown(ctx),
            Self::ParticleEmitter(emitter) => emitter.shutdown(ctx),
            Self::Behavior(behavior) => behavior.shutdown(ctx),
            Self::Transform(_) | Self::Camera(_) | Self::Animator(_) => {}
        }
    }

    /// Second half of teardown
    pub fn unload(&mut self, ctx: &mut ComponentContext<'_>) {
        if let Self::Behavior(behavior) = self {
            behavior.unload(ctx);
        }
    }

    /// Write the component's fields into the current archive scope
    pub fn serialize(&self, writer: &mut ArchiveWriter) {
        match self {
            Self::Transform(transform) => transform.serialize(writer),
            Self::Camera(camera) => camera.serialize(writer),
            Self::Sprite(sprite) => sprite.serialize(writer),
            Self::Animator(animator) => animator.serialize(writer),
            Self::ParticleEmitter(emitter) => emitter.serialize(writer),
            Self::Behavior(behavior) => writer.write_variable("behaviorName", behavior.name()),
        }
    }

    /// Rebuild a component of `kind` from its archive scope
    ///
    /// Behaviors carry arbitrary user state and cannot be rebuilt; `None` is
    /// returned for them.
    pub fn deserialize(kind: ComponentKind, scope: &Scope) -> Result<Option<Self>, ArchiveError> {
        let component = match kind {
            ComponentKind::Transform => Self::Transform(Transform::deserialize(scope)?),
            ComponentKind::Camera => Self::Camera(Camera::deserialize(scope)?),
            ComponentKind::Sprite => Self::Sprite(Sprite::deserialize(scope)?),
            ComponentKind::Animator => Self::Animator(Animator::deserialize(scope)?),
            ComponentKind::ParticleEmitter => Self::ParticleEmitter(ParticleEmitter::deserialize(scope)?),
            ComponentKind::Behavior => return Ok(None),
        };
        Ok(Some(component))
    }
}

/// Typed access to one variant of [`Component`]
pub trait ComponentType: Sized {
    /// Kind tag of the variant
    const KIND: ComponentKind;

    /// Borrow the payload if `component` is this variant
    fn from_component(component: &Component) -> Option<&Self>;

    /// Mutably borrow the payload if `component` is this variant
    fn from_component_mut(component: &mut Component) -> Option<&mut Self>;

    /// Wrap the payload in its variant
    fn into_component(self) -> Component;
}

macro_rules! impl_component_type {
    ($ty:ty, $variant:ident) => {
        impl ComponentType for $ty {
            const KIND: ComponentKind = ComponentKind::$variant;

            fn from_component(component: &Component) -> Option<&Self> {
                match component {
                    Component::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
                match component {
                    Component::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn into_component(self) -> Component {
                Component::$variant(self)
            }
        }

        impl From<$ty> for Component {
            fn from(value: $ty) -> Self {
                Component::$variant(value)
            }
        }
    };
}

impl_component_type!(Transform, Transform);
impl_component_type!(Camera, Camera);
impl_component_type!(Sprite, Sprite);
impl_component_type!(Animator, Animator);
impl_component_type!(ParticleEmitter, ParticleEmitter);
impl_component_type!(Box<dyn Behavior>, Behavior);

/// Ordered components of one object
///
/// Lookup returns the first component of the requested kind; attaching a
/// second component of the same kind is allowed but logged.
#[derive(Debug, Clone, Default)]
pub struct ComponentSet {
    components: Vec<Component>,
}

impl ComponentSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a component at the end
    pub fn add(&mut self, component: Component) {
        let kind = component.kind();
        if kind != ComponentKind::Behavior && self.has(kind) {
            log::warn!("Duplicate {} component attached; lookups return the first", kind.name());
        }
        self.components.push(component);
    }

    /// First component of type `T`
    pub fn get<T: ComponentType>(&self) -> Option<&T> {
        self.components.iter().find_map(T::from_component)
    }

    /// First component of type `T`, mutably
    pub fn get_mut<T: ComponentType>(&mut self) -> Option<&mut T> {
        self.components.iter_mut().find_map(T::from_component_mut)
    }

    /// First component of the given kind
    pub fn by_kind(&self, kind: ComponentKind) -> Option<&Component> {
        self.components.iter().find(|component| component.kind() == kind)
    }

    /// Whether a component of the given kind is attached
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.by_kind(kind).is_some()
    }

    /// Transform and Camera borrowed together
    pub fn transform_and_camera_mut(&mut self) -> (Option<&mut Transform>, Option<&mut Camera>) {
        let mut transform = None;
        let mut camera = None;
        for component in self.components.iter_mut() {
            match component {
                Component::Transform(t) if transform.is_none() => transform = Some(t),
                Component::Camera(c) if camera.is_none() => camera = Some(c),
                _ => {}
            }
        }
        (transform, camera)
    }

    /// Components in attachment order
    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    /// Number of attached components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no components are attached
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Component] {
        &mut self.components
    }
}

/// The components of the dispatching object other than the current one
pub struct Siblings<'a> {
    before: &'a mut [Component],
    after: &'a mut [Component],
}

impl<'a> Siblings<'a> {
    /// View over the components on either side of the current one
    pub fn new(before: &'a mut [Component], after: &'a mut [Component]) -> Self {
        Self { before, after }
    }

    /// An empty view
    pub fn empty() -> Self {
        Self {
            before: &mut [],
            after: &mut [],
        }
    }

    /// First sibling of type `T`
    pub fn get<T: ComponentType>(&self) -> Option<&T> {
        self.before
            .iter()
            .chain(self.after.iter())
            .find_map(T::from_component)
    }

    /// First sibling of type `T`, mutably
    pub fn get_mut<T: ComponentType>(&mut self) -> Option<&mut T> {
        self.before
            .iter_mut()
            .chain(self.after.iter_mut())
            .find_map(T::from_component_mut)
    }

    /// Whether a sibling of the given kind exists
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.before
            .iter()
            .chain(self.after.iter())
            .any(|component| component.kind() == kind)
    }
}
