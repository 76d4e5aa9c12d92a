//! Game Object Manager
//!
//! Owns every live object and archetype and drives the per-frame tick. The
//! live list is never edited while it is being walked: objects flagged for
//! destruction are collected and torn down once all updates of the tick have
//! run.

use crate::assets::ResourceLoader;
use crate::components::Camera;
use crate::config::{EngineConfig, FixedUpdatePolicy};
use crate::foundation::collections::ObjectId;
use crate::foundation::math::{Mat3, Vec2};
use crate::foundation::time::FixedTimestep;
use crate::render::{InstanceBatch, RenderBackend, RenderError};
use crate::scene::game_object::GameObject;
use crate::scene::world::World;
use crate::scene::SceneError;

/// Default fixed step: 60 Hz
pub const DEFAULT_FIXED_TIMESTEP: f64 = 1.0 / 60.0;

/// Owner of all game objects
#[derive(Debug)]
pub struct GameObjectManager {
    world: World,
    live: Vec<ObjectId>,
    archetypes: Vec<ObjectId>,
    pending_destroy: Vec<ObjectId>,
    timestep: FixedTimestep,
    policy: FixedUpdatePolicy,
    main_camera: Option<ObjectId>,
}

impl GameObjectManager {
    /// Create a manager with a 60 Hz fixed step
    pub fn new(resources: Box<dyn ResourceLoader>) -> Self {
        Self {
            world: World::new(resources),
            live: Vec::new(),
            archetypes: Vec::new(),
            pending_destroy: Vec::new(),
            timestep: FixedTimestep::new(DEFAULT_FIXED_TIMESTEP),
            policy: FixedUpdatePolicy::default(),
            main_camera: None,
        }
    }

    /// Create a manager using the timing settings of `config`
    pub fn from_config(config: &EngineConfig, resources: Box<dyn ResourceLoader>) -> Self {
        Self::new(resources)
            .with_fixed_timestep(config.fixed_timestep)
            .with_fixed_update_policy(config.fixed_update_policy)
    }

    /// Set the fixed step length in seconds
    pub fn with_fixed_timestep(mut self, step: f64) -> Self {
        self.timestep = FixedTimestep::new(step);
        self
    }

    /// Set how flagged objects interact with fixed updates
    pub fn with_fixed_update_policy(mut self, policy: FixedUpdatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fixed step length in seconds
    pub fn fixed_timestep(&self) -> f64 {
        self.timestep.step()
    }

    /// Active fixed update policy
    pub fn fixed_update_policy(&self) -> FixedUpdatePolicy {
        self.policy
    }

    /// The object arena
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The object arena, mutably
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Initialize `object` and make it live
    ///
    /// Objects carrying a Sprite get a render job first. The object only joins
    /// the live list once every component initialized; on failure it is freed
    /// and the error returned.
    pub fn add_object(&mut self, object: GameObject) -> Result<ObjectId, SceneError> {
        let id = self.world.insert(object);
        self.world.attach_render_job(id);
        self.initialize_or_discard(id)?;

        self.live.push(id);
        log::debug!("Added object {:?} '{}'", id, self.name_of(id));
        Ok(id)
    }

    /// Initialize `object` and store it as a template for
    /// [`GameObjectManager::create_from_archetype`]
    ///
    /// Archetypes are never updated and never drawn.
    pub fn add_archetype(&mut self, object: GameObject) -> Result<ObjectId, SceneError> {
        let id = self.world.insert(object);
        self.initialize_or_discard(id)?;

        self.archetypes.push(id);
        log::debug!("Added archetype {:?} '{}'", id, self.name_of(id));
        Ok(id)
    }

    fn initialize_or_discard(&mut self, id: ObjectId) -> Result<(), SceneError> {
        if let Err(source) = self.world.initialize_object(id) {
            let name = self.name_of(id).to_string();
            self.world.remove(id);
            log::error!("Object '{}' failed to initialize: {}", name, source);
            return Err(SceneError::Initialize { name, source });
        }
        Ok(())
    }

    fn name_of(&self, id: ObjectId) -> &str {
        self.world.object(id).map_or("<freed>", GameObject::name)
    }

    /// First live object named `name`, in insertion order
    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.live
            .iter()
            .copied()
            .find(|id| self.world.object(*id).map_or(false, |object| object.name() == name))
    }

    /// Independent copy of the first archetype named `name`, ready for
    /// [`GameObjectManager::add_object`]
    pub fn create_from_archetype(&self, name: &str) -> Option<GameObject> {
        let archetype = self
            .archetypes
            .iter()
            .filter_map(|id| self.world.object(*id))
            .find(|object| object.name() == name);

        match archetype {
            Some(archetype) => {
                log::trace!("Cloning archetype '{}'", name);
                Some(archetype.clone_archetype())
            }
            None => {
                log::warn!("No archetype named '{}'", name);
                None
            }
        }
    }

    /// Look up a live object or archetype
    pub fn object(&self, id: ObjectId) -> Option<&GameObject> {
        self.world.object(id)
    }

    /// Look up a live object or archetype mutably
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.world.object_mut(id)
    }

    /// Live objects in insertion order
    pub fn objects(&self) -> &[ObjectId] {
        &self.live
    }

    /// Archetypes in insertion order
    pub fn archetypes(&self) -> &[ObjectId] {
        &self.archetypes
    }

    /// Link `child` under `parent`; see [`World::add_child`]
    pub fn add_child(&mut self, parent: ObjectId, child: ObjectId) -> bool {
        self.world.add_child(parent, child)
    }

    /// Flag an object for destruction at the end of the current tick
    pub fn destroy(&mut self, id: ObjectId) -> bool {
        match self.world.object_mut(id) {
            Some(object) => {
                object.destroy();
                true
            }
            None => false,
        }
    }

    /// Global matrix of an object from cached local matrices
    pub fn global_transformation(&self, id: ObjectId) -> Option<Mat3> {
        self.world.global_transformation(id)
    }

    /// Global translation of an object
    pub fn global_translation(&self, id: ObjectId) -> Option<Vec2> {
        self.world.global_translation(id)
    }

    /// Use the Camera on `id` for rendering. Fails if `id` has no Camera.
    pub fn set_main_camera(&mut self, id: ObjectId) -> bool {
        let has_camera = self
            .world
            .object(id)
            .map_or(false, |object| object.get_component::<Camera>().is_some());
        if has_camera {
            self.main_camera = Some(id);
        } else {
            log::warn!("Object {:?} has no Camera; main camera unchanged", id);
        }
        has_camera
    }

    /// Object whose Camera is used for rendering
    pub fn main_camera(&self) -> Option<ObjectId> {
        self.main_camera
    }

    /// Run one tick with `dt` seconds of frame time
    pub fn update(&mut self, dt: f64) {
        let frame_dt = dt as f32;

        for index in 0..self.live.len() {
            let id = self.live[index];
            if self.is_flagged(id) {
                self.queue_destroy(id);
                continue;
            }
            self.world.update_object(id, frame_dt);
        }

        self.timestep.accumulate(dt);
        let step = self.timestep.step() as f32;
        while self.timestep.consume_step() {
            for index in 0..self.live.len() {
                let id = self.live[index];
                if self.policy == FixedUpdatePolicy::SkipDestroyed && self.is_flagged(id) {
                    continue;
                }
                self.world.fixed_update_object(id, step);
            }
        }

        // Objects flagged after their own variable update
        for index in 0..self.live.len() {
            let id = self.live[index];
            if self.is_flagged(id) {
                self.queue_destroy(id);
            }
        }

        let pending = std::mem::take(&mut self.pending_destroy);
        for id in pending {
            self.destroy_now(id);
        }
    }

    fn is_flagged(&self, id: ObjectId) -> bool {
        self.world.object(id).map_or(false, GameObject::is_destroyed)
    }

    fn queue_destroy(&mut self, id: ObjectId) {
        if !self.pending_destroy.contains(&id) {
            self.pending_destroy.push(id);
        }
    }

    /// Shut down and free a live object immediately, outside the tick
    pub(crate) fn discard(&mut self, id: ObjectId) {
        self.pending_destroy.retain(|pending| *pending != id);
        self.destroy_now(id);
    }

    fn destroy_now(&mut self, id: ObjectId) {
        self.live.retain(|live| *live != id);
        if self.main_camera == Some(id) {
            self.main_camera = None;
        }

        self.world.shutdown_object(id);
        self.world.unload_object(id);
        if let Some(object) = self.world.remove(id) {
            log::debug!("Destroyed object {:?} '{}'", id, object.name());
        }
    }

    /// Collect every render job into this frame's batch
    pub fn build_batch(&mut self) -> InstanceBatch {
        let camera_matrix = self
            .main_camera
            .and_then(|id| self.world.object(id))
            .and_then(|object| object.get_component::<Camera>())
            .map_or_else(Mat3::identity, Camera::camera_matrix);
        self.world.render_queue_mut().build_batch(camera_matrix)
    }

    /// Hand this frame's batch to the renderer backend
    pub fn render(&mut self, backend: &mut dyn RenderBackend) -> Result<(), RenderError> {
        let batch = self.build_batch();
        log::trace!("Drawing {} instances", batch.instance_count());
        backend.draw_instanced(&batch)
    }

    /// Shut down every live object and archetype
    pub fn shutdown(&mut self) {
        for index in 0..self.live.len() {
            let id = self.live[index];
            self.world.shutdown_object(id);
        }
        for index in 0..self.archetypes.len() {
            let id = self.archetypes[index];
            self.world.shutdown_object(id);
        }
    }

    /// Unload and free every live object and archetype
    pub fn unload(&mut self) {
        let live = std::mem::take(&mut self.live);
        let archetypes = std::mem::take(&mut self.archetypes);
        for id in live.into_iter().chain(archetypes) {
            self.world.unload_object(id);
            self.world.remove(id);
        }

        self.pending_destroy.clear();
        self.main_camera = None;
        self.timestep.reset();
        log::debug!("Unloaded all objects");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ResourceManager;
    use crate::components::{Sprite, Transform};
    use crate::foundation::math::Vec3;
    use crate::scene::LifecycleState;

    fn manager() -> GameObjectManager {
        let mut resources = ResourceManager::new(256, 256);
        resources.register_texture_size("player.png", 64, 64);
        GameObjectManager::new(Box::new(resources))
    }

    #[test]
    fn test_add_object_initializes_before_live() {
        let mut manager = manager();
        let id = manager
            .add_object(GameObject::new("Player").with_component(Transform::new()))
            .unwrap();

        assert_eq!(manager.objects(), &[id]);
        assert_eq!(manager.object(id).unwrap().lifecycle(), LifecycleState::Initialized);
    }

    #[test]
    fn test_failed_initialize_is_not_added() {
        let mut manager = manager();
        let result = manager.add_object(GameObject::new("Broken").with_component(Sprite::new("missing.png")));

        assert!(matches!(result, Err(SceneError::Initialize { .. })));
        assert!(manager.objects().is_empty());
        assert!(manager.world().is_empty());
    }

    #[test]
    fn test_sprite_objects_get_render_jobs() {
        let mut manager = manager();
        let sprite = manager
            .add_object(GameObject::new("Player").with_component(Transform::new()).with_component(Sprite::new("player.png")))
            .unwrap();
        let plain = manager
            .add_object(GameObject::new("Empty").with_component(Transform::new()))
            .unwrap();

        assert!(manager.object(sprite).unwrap().render_job().is_some());
        assert!(manager.object(plain).unwrap().render_job().is_none());
        assert_eq!(manager.world().render_queue().len(), 1);
    }

    #[test]
    fn test_archetypes_are_not_updated_or_drawn() {
        let mut manager = manager();
        let archetype = manager
            .add_archetype(
                GameObject::new("Enemy")
                    .with_component(Transform::new().with_translation(Vec3::new(1.0, 0.0, 0.0)))
                    .with_component(Sprite::new("player.png")),
            )
            .unwrap();

        manager.update(0.1);
        assert!(manager.objects().is_empty());
        assert!(manager.object(archetype).unwrap().render_job().is_none());
        assert!(manager.build_batch().is_empty());
    }

    #[test]
    fn test_render_uses_main_camera() {
        let mut manager = manager();
        let camera = manager
            .add_object(
                GameObject::new("Camera")
                    .with_component(Transform::new())
                    .with_component(Camera::orthographic(200.0, 100.0, -5.0, 5.0)),
            )
            .unwrap();
        let not_a_camera = manager
            .add_object(GameObject::new("Player").with_component(Transform::new()))
            .unwrap();

        assert!(!manager.set_main_camera(not_a_camera));
        assert!(manager.set_main_camera(camera));

        manager.update(0.0);
        let batch = manager.build_batch();
        assert_eq!(batch.camera_matrix()[(0, 0)], 0.01);
        assert_eq!(batch.camera_matrix()[(1, 1)], 0.02);
    }

    #[test]
    fn test_unload_frees_everything() {
        let mut manager = manager();
        manager
            .add_object(GameObject::new("Player").with_component(Transform::new()))
            .unwrap();
        manager
            .add_archetype(GameObject::new("Enemy").with_component(Transform::new()))
            .unwrap();

        manager.shutdown();
        manager.unload();

        assert!(manager.objects().is_empty());
        assert!(manager.archetypes().is_empty());
        assert!(manager.world().is_empty());
    }
}
