//! Sandbox level: a camera, a spinning player trailing a particle effect, an
//! animated satellite in orbit and enemies spawned from an archetype

use crate::behaviors::{Lifetime, Orbit, Spin};
use scene_engine::foundation::collections::SubscriptionId;
use scene_engine::prelude::*;
use std::cell::Cell;
use std::rc::Rc;

const ENEMY_SPAWN_INTERVAL: f64 = 0.5;

pub struct SandboxLevel {
    view_width: f32,
    view_height: f32,
    near_plane: f32,
    far_plane: f32,
    camera: Option<ObjectId>,
    subscriptions: Vec<SubscriptionId>,
    pending_resize: Rc<Cell<Option<(u32, u32)>>>,
    restart: Rc<Cell<bool>>,
    spawn_timer: f64,
    spawned: u32,
}

impl SandboxLevel {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            view_width: config.window.width as f32,
            view_height: config.window.height as f32,
            near_plane: config.camera.near_plane,
            far_plane: config.camera.far_plane,
            camera: None,
            subscriptions: Vec::new(),
            pending_resize: Rc::new(Cell::new(None)),
            restart: Rc::new(Cell::new(false)),
            spawn_timer: 0.0,
            spawned: 0,
        }
    }

    fn subscribe_events(&mut self, events: &mut EventBus) {
        let pending_resize = Rc::clone(&self.pending_resize);
        let resize = events.subscribe(Event::WINDOW_RESIZE, move |event: &Event| {
            if let Event::WindowResize { width, height } = *event {
                pending_resize.set(Some((width, height)));
            }
            false
        });

        let restart = Rc::clone(&self.restart);
        let key = events.subscribe(Event::KEY, move |event: &Event| {
            if event.is_key_press(keys::F5) {
                restart.set(true);
                return true;
            }
            if event.is_key_press(keys::ESCAPE) {
                log::info!("Escape pressed");
            }
            false
        });

        self.subscriptions = vec![resize, key];
    }

    fn apply_resize(&mut self, manager: &mut GameObjectManager) {
        let Some((width, height)) = self.pending_resize.take() else {
            return;
        };
        self.view_width = width as f32;
        self.view_height = height as f32;

        let Some(object) = self.camera.and_then(|id| manager.object_mut(id)) else {
            log::warn!("Resize ignored: no camera");
            return;
        };
        if let Some(camera) = object.get_component_mut::<Camera>() {
            camera.update_projection(
                ProjectionMode::Orthographic,
                self.view_width,
                self.view_height,
                self.near_plane,
                self.far_plane,
            );
            log::info!("Camera resized to {}x{}", width, height);
        }
    }

    fn spawn_enemy(&mut self, manager: &mut GameObjectManager) -> Result<(), SceneError> {
        let Some(mut enemy) = manager.create_from_archetype("Enemy") else {
            log::warn!("Enemy archetype missing");
            return Ok(());
        };

        let lane = (self.spawned % 5) as f32 - 2.0;
        if let Some(transform) = enemy.get_component_mut::<Transform>() {
            transform.set_local_translation(Vec3::new(self.view_width * 0.5, lane * 100.0, 0.0));
        }
        self.spawned += 1;
        manager.add_object(enemy)?;
        Ok(())
    }
}

impl Level for SandboxLevel {
    fn name(&self) -> &str {
        "SandboxLevel"
    }

    fn initialize(&mut self, ctx: &mut LevelContext<'_>) -> Result<(), SceneError> {
        let manager = &mut *ctx.manager;

        let camera = manager.add_object(
            GameObject::new("MainCamera")
                .with_component(Transform::new())
                .with_component(Camera::orthographic(
                    self.view_width,
                    self.view_height,
                    self.near_plane,
                    self.far_plane,
                )),
        )?;
        manager.set_main_camera(camera);
        self.camera = Some(camera);

        let player = manager.add_object(
            GameObject::new("Player")
                .with_component(Transform::new().with_scaling(Vec3::new(64.0, 64.0, 1.0)))
                .with_component(Sprite::new("assets/player.png"))
                .with_behavior(Spin { speed: 1.5 }),
        )?;

        // Anchored to the player's rear; particles are left behind in world space
        let exhaust = manager.add_object(
            GameObject::new("Exhaust")
                .with_component(Transform::new().with_translation(Vec3::new(0.0, -0.75, 0.0)))
                .with_component(
                    ParticleEmitter::new("assets/particles.png")
                        .with_burst(3, 0.05)
                        .with_lifetime(0.4, 0.9)
                        .with_max_particles(60)
                        .with_velocity(90.0, -std::f32::consts::FRAC_PI_2, 0.6)
                        .with_sizes(12.0, 2.0)
                        .with_colors(Vec4::new(1.0, 0.8, 0.2, 1.0), Vec4::new(0.8, 0.1, 0.0, 0.0))
                        .with_interpolation(Interpolation::Linear, Interpolation::EaseOut),
                ),
        )?;
        manager.add_child(player, exhaust);

        manager.add_object(
            GameObject::new("Satellite")
                .with_component(Transform::new().with_scaling(Vec3::new(32.0, 32.0, 1.0)))
                .with_component(Sprite::new("assets/satellite.png"))
                .with_component(Animator::new(4, 1, 0.1))
                .with_behavior(Orbit::new(Vec3::zeros(), 250.0, 0.8)),
        )?;

        manager.add_archetype(
            GameObject::new("Enemy")
                .with_component(Transform::new().with_scaling(Vec3::new(48.0, 48.0, 1.0)))
                .with_component(Sprite::new("assets/enemy.png"))
                .with_behavior(Lifetime {
                    remaining: 3.0,
                    velocity: Vec3::new(-400.0, 0.0, 0.0),
                }),
        )?;

        self.subscribe_events(ctx.events);
        self.spawn_timer = 0.0;
        self.restart.set(false);
        log::info!("{} initialized with {} objects", self.name(), manager.objects().len());
        Ok(())
    }

    fn update(&mut self, dt: f64, ctx: &mut LevelContext<'_>) {
        if self.restart.replace(false) {
            ctx.request_restart();
            return;
        }

        self.apply_resize(ctx.manager);

        self.spawn_timer += dt;
        while self.spawn_timer >= ENEMY_SPAWN_INTERVAL {
            self.spawn_timer -= ENEMY_SPAWN_INTERVAL;
            if let Err(e) = self.spawn_enemy(ctx.manager) {
                log::error!("Failed to spawn enemy: {}", e);
            }
        }
    }

    fn shutdown(&mut self, ctx: &mut LevelContext<'_>) {
        for id in self.subscriptions.drain(..) {
            ctx.events.unsubscribe(id);
        }
        self.camera = None;
    }
}
