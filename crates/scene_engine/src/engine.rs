//! Core engine implementation
//!
//! The engine owns the object manager, the event bus and the running level.
//! Nothing is global: systems that need one of them receive it explicitly.
//!
//! ## Frame
//!
//! ```text
//! restart (if requested) → events.dispatch → level.update → manager.update → manager.render
//! ```

use crate::assets::{ResourceLoader, ResourceManager};
use crate::config::{ConfigError, EngineConfig};
use crate::events::EventBus;
use crate::foundation::time::Timer;
use crate::render::{RenderBackend, RenderError};
use crate::scene::{GameObjectManager, Level, LevelContext, SceneError};
use crate::serialization::{ArchiveError, ArchiveWriter};
use thiserror::Error;

/// Main engine struct
///
/// Coordinates the object manager, the event bus and the current level, and
/// feeds the renderer backend once per frame.
pub struct Engine {
    manager: GameObjectManager,
    events: EventBus,
    level: Option<Box<dyn Level>>,
    config: EngineConfig,
    timer: Timer,
    restart_requested: bool,
}

impl Engine {
    /// Create an engine with the bundled texture loader
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let resources = ResourceManager::new(config.atlas.width, config.atlas.height);
        Self::with_resources(config, Box::new(resources))
    }

    /// Create an engine loading resources through `resources`
    pub fn with_resources(config: EngineConfig, resources: Box<dyn ResourceLoader>) -> Result<Self, EngineError> {
        config.validate()?;
        log::info!(
            "Initializing engine (fixed step {:.4}s, {:?})",
            config.fixed_timestep,
            config.fixed_update_policy
        );

        Ok(Self {
            manager: GameObjectManager::from_config(&config, resources),
            events: EventBus::new(),
            level: None,
            config,
            timer: Timer::new(),
            restart_requested: false,
        })
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Object manager
    pub fn manager(&self) -> &GameObjectManager {
        &self.manager
    }

    /// Object manager, mutably
    pub fn manager_mut(&mut self) -> &mut GameObjectManager {
        &mut self.manager
    }

    /// Event bus
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Event bus, mutably
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Name of the running level
    pub fn level_name(&self) -> Option<&str> {
        self.level.as_deref().map(Level::name)
    }

    fn with_level<R>(&mut self, hook: impl FnOnce(&mut dyn Level, &mut LevelContext<'_>) -> R) -> Option<R> {
        let level = self.level.as_mut()?;
        let mut ctx = LevelContext::new(&mut self.manager, &mut self.events, &mut self.restart_requested);
        Some(hook(level.as_mut(), &mut ctx))
    }

    /// Stop the running level (if any), then load and initialize `level`
    pub fn start_level(&mut self, level: Box<dyn Level>) -> Result<(), EngineError> {
        self.stop_level();

        log::info!("Starting level '{}'", level.name());
        self.level = Some(level);
        self.with_level(|level, ctx| level.load(ctx)).transpose()?;
        self.with_level(|level, ctx| level.initialize(ctx)).transpose()?;
        Ok(())
    }

    /// Tear the running level down and rebuild it at the start of the next frame
    pub fn request_restart(&mut self) {
        self.restart_requested = true;
    }

    fn restart_level(&mut self) -> Result<(), EngineError> {
        self.restart_requested = false;
        if let Some(name) = self.level_name() {
            log::info!("Restarting level '{}'", name);
        }

        self.with_level(|level, ctx| level.shutdown(ctx));
        self.manager.shutdown();
        self.manager.unload();
        self.events.clear();
        self.with_level(|level, ctx| level.initialize(ctx)).transpose()?;
        Ok(())
    }

    /// Run one frame of `dt` seconds and draw it with `backend`
    pub fn frame(&mut self, dt: f64, backend: &mut dyn RenderBackend) -> Result<(), EngineError> {
        if self.restart_requested {
            self.restart_level()?;
        }

        self.events.dispatch();
        self.with_level(|level, ctx| level.update(dt, ctx));
        self.manager.update(dt);
        self.manager.render(backend)?;
        Ok(())
    }

    /// Run one frame timed by the wall clock
    pub fn tick(&mut self, backend: &mut dyn RenderBackend) -> Result<(), EngineError> {
        self.timer.update();
        self.frame(self.timer.delta_time(), backend)
    }

    /// Write the running level and its live objects to `path`
    pub fn save_level(&self, path: &str) -> Result<(), EngineError> {
        let level = self.level.as_deref().ok_or(EngineError::NoLevel)?;
        let mut writer = ArchiveWriter::new();
        level.serialize(&self.manager, &mut writer)?;
        writer.finish()?.save_to_file(path)?;
        log::info!("Saved level '{}' to {}", level.name(), path);
        Ok(())
    }

    fn stop_level(&mut self) {
        if self.level.is_none() {
            return;
        }

        self.with_level(|level, ctx| level.shutdown(ctx));
        self.manager.shutdown();
        self.manager.unload();
        self.with_level(|level, ctx| level.unload(ctx));
        self.events.clear();
        self.level = None;
    }

    /// Stop the running level and free every object
    pub fn shutdown(&mut self) {
        self.stop_level();
        log::info!("Engine shutdown complete");
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("level", &self.level_name())
            .field("manager", &self.manager)
            .field("events", &self.events)
            .finish()
    }
}

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Level or object setup failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// The renderer backend rejected the frame
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Level data could not be written
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// An operation needed a running level
    #[error("No level is running")]
    NoLevel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Transform;
    use crate::events::{keys, Event, KeyAction, KeyModifiers};
    use crate::foundation::collections::SubscriptionId;
    use crate::render::InstanceBatch;
    use crate::scene::GameObject;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct CountingBackend {
        frames: usize,
        last_instances: usize,
    }

    impl RenderBackend for CountingBackend {
        fn draw_instanced(&mut self, batch: &InstanceBatch) -> Result<(), RenderError> {
            self.frames += 1;
            self.last_instances = batch.instance_count();
            Ok(())
        }
    }

    struct ResettableLevel {
        initializations: Rc<Cell<usize>>,
        restart: Rc<Cell<bool>>,
        calls: Rc<RefCell<Vec<&'static str>>>,
        subscription: Option<SubscriptionId>,
    }

    impl Level for ResettableLevel {
        fn name(&self) -> &str {
            "TestLevel"
        }

        fn load(&mut self, _ctx: &mut LevelContext<'_>) -> Result<(), SceneError> {
            self.calls.borrow_mut().push("load");
            Ok(())
        }

        fn initialize(&mut self, ctx: &mut LevelContext<'_>) -> Result<(), SceneError> {
            self.calls.borrow_mut().push("initialize");
            self.initializations.set(self.initializations.get() + 1);
            ctx.manager.add_object(GameObject::new("Player").with_component(Transform::new()))?;

            let restart = Rc::clone(&self.restart);
            self.subscription = Some(ctx.events.subscribe(Event::KEY, move |event: &Event| {
                if event.is_key_press(keys::F5) {
                    restart.set(true);
                    return true;
                }
                false
            }));
            Ok(())
        }

        fn update(&mut self, _dt: f64, ctx: &mut LevelContext<'_>) {
            if self.restart.replace(false) {
                ctx.request_restart();
            }
        }

        fn shutdown(&mut self, ctx: &mut LevelContext<'_>) {
            self.calls.borrow_mut().push("shutdown");
            if let Some(id) = self.subscription.take() {
                ctx.events.unsubscribe(id);
            }
        }

        fn unload(&mut self, _ctx: &mut LevelContext<'_>) {
            self.calls.borrow_mut().push("unload");
        }
    }

    fn level() -> (ResettableLevel, Rc<Cell<usize>>, Rc<RefCell<Vec<&'static str>>>) {
        let initializations = Rc::new(Cell::new(0));
        let calls = Rc::new(RefCell::new(Vec::new()));
        let level = ResettableLevel {
            initializations: Rc::clone(&initializations),
            restart: Rc::new(Cell::new(false)),
            calls: Rc::clone(&calls),
            subscription: None,
        };
        (level, initializations, calls)
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig::default().with_fixed_timestep(-1.0);
        assert!(matches!(Engine::new(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_frame_renders_once() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let (level, _, _) = level();
        engine.start_level(Box::new(level)).unwrap();

        let mut backend = CountingBackend::default();
        engine.frame(1.0 / 60.0, &mut backend).unwrap();
        engine.frame(1.0 / 60.0, &mut backend).unwrap();

        assert_eq!(backend.frames, 2);
        // Player has no Sprite, so nothing to draw
        assert_eq!(backend.last_instances, 0);
        assert_eq!(engine.level_name(), Some("TestLevel"));
    }

    #[test]
    fn test_key_event_restarts_level() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let (level, initializations, calls) = level();
        engine.start_level(Box::new(level)).unwrap();
        let mut backend = CountingBackend::default();

        engine.events_mut().send(Event::Key {
            key: keys::F5,
            action: KeyAction::Press,
            modifiers: KeyModifiers::empty(),
        });
        // Event handled and restart requested during this frame
        engine.frame(0.0, &mut backend).unwrap();
        assert_eq!(initializations.get(), 1);

        // Restart applied at the start of the next one
        engine.frame(0.0, &mut backend).unwrap();
        assert_eq!(initializations.get(), 2);
        assert_eq!(engine.manager().objects().len(), 1);
        assert_eq!(engine.events().subscriber_count(Event::KEY), 1);
        assert_eq!(*calls.borrow(), vec!["load", "initialize", "shutdown", "initialize"]);
    }

    #[test]
    fn test_shutdown_unloads_level() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let (level, _, calls) = level();
        engine.start_level(Box::new(level)).unwrap();

        engine.shutdown();

        assert_eq!(*calls.borrow(), vec!["load", "initialize", "shutdown", "unload"]);
        assert!(engine.manager().world().is_empty());
        assert_eq!(engine.level_name(), None);
    }

    #[test]
    fn test_save_level_requires_level() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let path = std::env::temp_dir().join("scene_engine_no_level.ron");
        assert!(matches!(
            engine.save_level(&path.to_string_lossy()),
            Err(EngineError::NoLevel)
        ));
    }
}
