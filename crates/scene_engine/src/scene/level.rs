//! Levels and level files
//!
//! A [`Level`] populates the manager and drives level-wide logic. Level state
//! can be written to and rebuilt from an archive:
//!
//! ```text
//! <level name> (
//!     numGameObjects = N
//!     <object name> (
//!         numComponents = M
//!         parentIndex = i          // only for parented objects
//!         Transform ( localTranslation, localRotation, localScaling )
//!         Sprite ( texturePath )
//!         ...
//!     )
//!     ...
//! )
//! ```

use crate::components::{Component, ComponentKind};
use crate::events::EventBus;
use crate::foundation::collections::ObjectId;
use crate::scene::game_object::GameObject;
use crate::scene::object_manager::GameObjectManager;
use crate::scene::SceneError;
use crate::serialization::{ArchiveError, ArchiveResult, ArchiveWriter, Scope};

/// What a level can reach during its hooks
pub struct LevelContext<'a> {
    /// Objects of the running level
    pub manager: &'a mut GameObjectManager,
    /// Event subscriptions
    pub events: &'a mut EventBus,
    restart_requested: &'a mut bool,
}

impl<'a> LevelContext<'a> {
    /// Create a context
    pub fn new(manager: &'a mut GameObjectManager, events: &'a mut EventBus, restart_requested: &'a mut bool) -> Self {
        Self {
            manager,
            events,
            restart_requested,
        }
    }

    /// Tear the level down and rebuild it at the start of the next frame
    pub fn request_restart(&mut self) {
        *self.restart_requested = true;
    }
}

/// A playable level
pub trait Level {
    /// Level name, also the name of its archive scope
    fn name(&self) -> &str;

    /// Acquire level-wide resources; runs once before the first initialize
    fn load(&mut self, _ctx: &mut LevelContext<'_>) -> Result<(), SceneError> {
        Ok(())
    }

    /// Populate the manager; runs on start and on every restart
    fn initialize(&mut self, ctx: &mut LevelContext<'_>) -> Result<(), SceneError>;

    /// Per-frame level logic, before the manager tick
    fn update(&mut self, _dt: f64, _ctx: &mut LevelContext<'_>) {}

    /// Undo initialize (event subscriptions and the like)
    fn shutdown(&mut self, _ctx: &mut LevelContext<'_>) {}

    /// Release what load acquired
    fn unload(&mut self, _ctx: &mut LevelContext<'_>) {}

    /// Write the level and its live objects
    fn serialize(&self, manager: &GameObjectManager, writer: &mut ArchiveWriter) -> ArchiveResult<()> {
        write_level(self.name(), manager, writer)
    }
}

/// Write `level_name` and every live object of `manager` into `writer`
pub fn write_level(level_name: &str, manager: &GameObjectManager, writer: &mut ArchiveWriter) -> ArchiveResult<()> {
    let objects: Vec<(ObjectId, &GameObject)> = manager
        .objects()
        .iter()
        .filter_map(|id| manager.object(*id).map(|object| (*id, object)))
        .collect();

    writer.start_scope(level_name);
    writer.write_variable("numGameObjects", objects.len());

    for (_, object) in &objects {
        writer.start_scope(object.name());
        writer.write_variable("numComponents", object.components().len());
        let parent_index = object
            .parent()
            .and_then(|parent| objects.iter().position(|(live, _)| *live == parent));
        if let Some(index) = parent_index {
            writer.write_variable("parentIndex", index);
        }

        for component in object.components().iter() {
            writer.start_scope(component.kind().name());
            component.serialize(writer);
            writer.end_scope()?;
        }
        writer.end_scope()?;
    }

    writer.end_scope()
}

/// Rebuild the objects of `level_name` from `root` and add them to `manager`
///
/// Every object is parsed before any is added. Objects are then added in
/// stored order and linked to their parents; if one fails to initialize, the
/// ones already added are freed again and the manager is left as it was.
/// Behavior components cannot be rebuilt and are skipped with a warning.
pub fn read_level(root: &Scope, level_name: &str, manager: &mut GameObjectManager) -> Result<Vec<ObjectId>, SceneError> {
    let level = root.scope(level_name)?;
    let count: usize = level.read_variable("numGameObjects")?;
    if count != level.scopes.len() {
        return Err(ArchiveError::Format(format!(
            "level '{}' declares {} objects but stores {}",
            level_name,
            count,
            level.scopes.len()
        ))
        .into());
    }

    let mut objects = Vec::with_capacity(count);
    let mut parents = Vec::new();
    for (index, object_scope) in level.scopes.iter().enumerate() {
        objects.push(read_object(object_scope)?);
        if object_scope.value("parentIndex").is_some() {
            let parent: usize = object_scope.read_variable("parentIndex")?;
            parents.push((parent, index));
        }
    }

    let mut added = Vec::with_capacity(count);
    for object in objects {
        match manager.add_object(object) {
            Ok(id) => added.push(id),
            Err(error) => {
                log::error!("Level '{}': rolling back {} added objects", level_name, added.len());
                for id in added.into_iter().rev() {
                    manager.discard(id);
                }
                return Err(error);
            }
        }
    }

    for (parent, child) in parents {
        match (added.get(parent), added.get(child)) {
            (Some(parent), Some(child)) => {
                manager.add_child(*parent, *child);
            }
            _ => log::warn!("Level '{}': parent index {} out of range", level_name, parent),
        }
    }

    log::info!("Read level '{}' with {} objects", level_name, added.len());
    Ok(added)
}

fn read_object(scope: &Scope) -> Result<GameObject, ArchiveError> {
    let mut object = GameObject::new(scope.name.as_str());

    for component_scope in &scope.scopes {
        let Some(kind) = ComponentKind::from_name(&component_scope.name) else {
            log::warn!("Object '{}': unknown component '{}'", scope.name, component_scope.name);
            continue;
        };

        match Component::deserialize(kind, component_scope)? {
            Some(component) => object.add_component(component),
            None => log::warn!("Object '{}': {} component cannot be rebuilt; skipped", scope.name, kind.name()),
        }
    }
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ResourceManager;
    use crate::components::{Behavior, Transform};
    use crate::foundation::math::Vec3;

    #[derive(Clone)]
    struct Idle;

    impl Behavior for Idle {
        fn name(&self) -> &str {
            "Idle"
        }

        fn clone_box(&self) -> Box<dyn Behavior> {
            Box::new(self.clone())
        }
    }

    fn manager() -> GameObjectManager {
        GameObjectManager::new(Box::new(ResourceManager::new(64, 64)))
    }

    #[test]
    fn test_level_scope_layout() {
        let mut manager = manager();
        manager
            .add_object(GameObject::new("Player").with_component(Transform::new()))
            .unwrap();

        let mut writer = ArchiveWriter::new();
        write_level("TestLevel", &manager, &mut writer).unwrap();
        let root = writer.finish().unwrap();

        let level = root.scope("TestLevel").unwrap();
        assert_eq!(level.read_variable::<usize>("numGameObjects").unwrap(), 1);
        let player = level.scope("Player").unwrap();
        assert!(player.scope("Transform").unwrap().value("localTranslation").is_some());
    }

    #[test]
    fn test_behaviors_are_skipped_on_read() {
        let mut source = manager();
        source
            .add_object(
                GameObject::new("Player")
                    .with_behavior(Idle)
                    .with_component(Transform::new()),
            )
            .unwrap();

        let mut writer = ArchiveWriter::new();
        write_level("TestLevel", &source, &mut writer).unwrap();
        let root = writer.finish().unwrap();

        let mut target = manager();
        let ids = read_level(&root, "TestLevel", &mut target).unwrap();
        let object = target.object(ids[0]).unwrap();
        assert_eq!(object.components().len(), 1);
        assert!(object.component(ComponentKind::Behavior).is_none());
    }

    #[test]
    fn test_hierarchy_is_restored() {
        let mut source = manager();
        let parent = source
            .add_object(GameObject::new("Player").with_component(Transform::new().with_translation(Vec3::new(3.0, 0.0, 0.0))))
            .unwrap();
        let child = source
            .add_object(GameObject::new("Particles").with_component(Transform::new()))
            .unwrap();
        source.add_child(parent, child);

        let mut writer = ArchiveWriter::new();
        write_level("TestLevel", &source, &mut writer).unwrap();
        let root = writer.finish().unwrap();

        let mut target = manager();
        let ids = read_level(&root, "TestLevel", &mut target).unwrap();
        assert_eq!(target.object(ids[1]).unwrap().parent(), Some(ids[0]));
        assert_eq!(target.object(ids[0]).unwrap().children(), &[ids[1]]);
    }

    #[test]
    fn test_flagged_objects_are_still_counted() {
        let mut source = manager();
        source
            .add_object(GameObject::new("Player").with_component(Transform::new()))
            .unwrap();
        let doomed = source
            .add_object(GameObject::new("Doomed").with_component(Transform::new()))
            .unwrap();
        source.destroy(doomed);

        let mut writer = ArchiveWriter::new();
        write_level("TestLevel", &source, &mut writer).unwrap();
        let root = writer.finish().unwrap();

        let level = root.scope("TestLevel").unwrap();
        assert_eq!(level.read_variable::<usize>("numGameObjects").unwrap(), level.scopes.len());

        let mut target = manager();
        assert_eq!(read_level(&root, "TestLevel", &mut target).unwrap().len(), 2);
    }

    #[test]
    fn test_count_mismatch_is_an_error() {
        let mut writer = ArchiveWriter::new();
        writer.start_scope("TestLevel");
        writer.write_variable("numGameObjects", 2usize);
        writer.end_scope().unwrap();
        let root = writer.finish().unwrap();

        let mut target = manager();
        assert!(matches!(
            read_level(&root, "TestLevel", &mut target),
            Err(SceneError::Archive(ArchiveError::Format(_)))
        ));
    }
}
