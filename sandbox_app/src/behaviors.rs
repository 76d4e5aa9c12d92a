//! Gameplay behaviors used by the sandbox level

use scene_engine::prelude::*;

/// Rotates the owner at a constant angular speed
#[derive(Debug, Clone)]
pub struct Spin {
    pub speed: f32,
}

impl Behavior for Spin {
    fn name(&self) -> &str {
        "Spin"
    }

    fn clone_box(&self) -> Box<dyn Behavior> {
        Box::new(self.clone())
    }

    fn update(&mut self, dt: f32, ctx: &mut ComponentContext<'_>) {
        if let Some(transform) = ctx.siblings_mut().get_mut::<Transform>() {
            let rotation = transform.local_rotation() + self.speed * dt;
            transform.set_local_rotation(rotation % std::f32::consts::TAU);
        }
    }
}

/// Moves the owner on a circle around `center`
///
/// Runs on the fixed step so the path does not depend on frame rate.
#[derive(Debug, Clone)]
pub struct Orbit {
    pub center: Vec3,
    pub radius: f32,
    pub speed: f32,
    angle: f32,
}

impl Orbit {
    pub fn new(center: Vec3, radius: f32, speed: f32) -> Self {
        Self {
            center,
            radius,
            speed,
            angle: 0.0,
        }
    }
}

impl Behavior for Orbit {
    fn name(&self) -> &str {
        "Orbit"
    }

    fn clone_box(&self) -> Box<dyn Behavior> {
        Box::new(self.clone())
    }

    fn fixed_update(&mut self, dt: f32, ctx: &mut ComponentContext<'_>) {
        self.angle = (self.angle + self.speed * dt) % std::f32::consts::TAU;
        let offset = Vec3::new(self.angle.cos(), self.angle.sin(), 0.0) * self.radius;
        if let Some(transform) = ctx.siblings_mut().get_mut::<Transform>() {
            transform.set_local_translation(self.center + offset);
        }
    }
}

/// Drifts the owner and flags it for destruction once its time is up
#[derive(Debug, Clone)]
pub struct Lifetime {
    pub remaining: f32,
    pub velocity: Vec3,
}

impl Behavior for Lifetime {
    fn name(&self) -> &str {
        "Lifetime"
    }

    fn clone_box(&self) -> Box<dyn Behavior> {
        Box::new(self.clone())
    }

    fn update(&mut self, dt: f32, ctx: &mut ComponentContext<'_>) {
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            log::debug!("{:?} expired", ctx.owner());
            ctx.destroy_owner();
            return;
        }

        if let Some(transform) = ctx.siblings_mut().get_mut::<Transform>() {
            let translation = transform.local_translation() + self.velocity * dt;
            transform.set_local_translation(translation);
        }
    }
}
