//! Particle emitter component
//!
//! Spawns short-lived textured quads in bursts at the owner's global
//! position. Once spawned, a particle lives in world space: it keeps its
//! velocity and is not dragged along when the owner moves. Over its lifetime
//! a particle's color and size move from the start to the end values along
//! the configured [`Interpolation`] curves.
//!
//! Every live particle owns one render job. Jobs are acquired on spawn and
//! retired on expiry and when the owner shuts down.

use crate::components::{ComponentContext, ComponentError};
use crate::foundation::collections::{RenderJobId, TextureHandle};
use crate::foundation::math::{Mat3, Mat3Ext, Vec2, Vec3, Vec4};
use crate::render::{RenderQueue, UvRect};
use crate::serialization::{ArchiveError, ArchiveResult, ArchiveWriter, Scope};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Easing curve mapping a particle's life fraction to a blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Constant rate
    #[default]
    Linear,
    /// Slow start
    EaseIn,
    /// Slow end
    EaseOut,
    /// Slow start and end
    SmoothStep,
}

impl Interpolation {
    /// Blend factor for `t` in [0, 1]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => t * (2.0 - t),
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
        }
    }

    /// Serialized name
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::EaseIn => "EaseIn",
            Self::EaseOut => "EaseOut",
            Self::SmoothStep => "SmoothStep",
        }
    }

    /// Parse a serialized name
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Linear, Self::EaseIn, Self::EaseOut, Self::SmoothStep]
            .into_iter()
            .find(|curve| curve.name() == name)
    }
}

/// One live particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// World position
    pub position: Vec2,
    /// World units per second
    pub velocity: Vec2,
    /// Seconds since spawn
    pub age: f32,
    /// Seconds the particle lives
    pub lifetime: f32,
    job: RenderJobId,
}

impl Particle {
    /// Fraction of the lifetime already spent, in [0, 1]
    pub fn progress(&self) -> f32 {
        if self.lifetime <= 0.0 {
            return 1.0;
        }
        (self.age / self.lifetime).clamp(0.0, 1.0)
    }

    /// Render job the particle is drawn with
    pub fn job(&self) -> RenderJobId {
        self.job
    }
}

/// Burst emitter of textured particles
#[derive(Debug)]
pub struct ParticleEmitter {
    /// Texture every particle samples
    pub texture_path: String,
    /// RGBA at spawn
    pub start_color: Vec4,
    /// RGBA at expiry
    pub end_color: Vec4,
    /// Quad size at spawn, in world units
    pub start_size: f32,
    /// Quad size at expiry, in world units
    pub end_size: f32,
    /// Curve from start to end color
    pub color_interpolation: Interpolation,
    /// Curve from start to end size
    pub size_interpolation: Interpolation,
    /// Cap on simultaneously live particles
    pub max_particles: usize,
    /// Particles per burst
    pub spawn_count: usize,
    /// Shortest particle lifetime in seconds
    pub min_lifetime: f32,
    /// Longest particle lifetime in seconds
    pub max_lifetime: f32,
    /// Seconds between bursts
    pub spawn_wait: f32,
    /// Initial particle speed
    pub speed: f32,
    /// Emission angle in radians, in the owner's frame
    pub direction: f32,
    /// Full width of the random cone around `direction`, in radians
    pub spread: f32,
    /// Keep bursting; otherwise emit a single burst
    pub looping: bool,
    seed: u64,
    texture: Option<TextureHandle>,
    region: UvRect,
    particles: Vec<Particle>,
    spawn_timer: f32,
    bursts: u32,
    rng: StdRng,
}

impl Clone for ParticleEmitter {
    /// Copies the configuration only. Live particles and their render jobs
    /// stay with the original; the clone starts empty.
    fn clone(&self) -> Self {
        Self {
            texture_path: self.texture_path.clone(),
            start_color: self.start_color,
            end_color: self.end_color,
            start_size: self.start_size,
            end_size: self.end_size,
            color_interpolation: self.color_interpolation,
            size_interpolation: self.size_interpolation,
            max_particles: self.max_particles,
            spawn_count: self.spawn_count,
            min_lifetime: self.min_lifetime,
            max_lifetime: self.max_lifetime,
            spawn_wait: self.spawn_wait,
            speed: self.speed,
            direction: self.direction,
            spread: self.spread,
            looping: self.looping,
            seed: self.seed,
            texture: self.texture,
            region: self.region,
            particles: Vec::new(),
            spawn_timer: 0.0,
            bursts: 0,
            rng: StdRng::seed_from_u64(self.seed),
        }
    }
}

impl Default for ParticleEmitter {
    fn default() -> Self {
        Self::new("")
    }
}

impl ParticleEmitter {
    /// Looping emitter of white particles that shrink and fade out over one
    /// second, five every tenth of a second
    pub fn new(texture_path: impl Into<String>) -> Self {
        Self {
            texture_path: texture_path.into(),
            start_color: Vec4::repeat(1.0),
            end_color: Vec4::new(1.0, 1.0, 1.0, 0.0),
            start_size: 8.0,
            end_size: 0.0,
            color_interpolation: Interpolation::Linear,
            size_interpolation: Interpolation::Linear,
            max_particles: 100,
            spawn_count: 5,
            min_lifetime: 1.0,
            max_lifetime: 1.0,
            spawn_wait: 0.1,
            speed: 0.0,
            direction: 0.0,
            spread: 0.0,
            looping: true,
            seed: 0,
            texture: None,
            region: UvRect::full(),
            particles: Vec::new(),
            spawn_timer: 0.0,
            bursts: 0,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Start and end RGBA
    pub fn with_colors(mut self, start: Vec4, end: Vec4) -> Self {
        self.start_color = start;
        self.end_color = end;
        self
    }

    /// Start and end quad size
    pub fn with_sizes(mut self, start: f32, end: f32) -> Self {
        self.start_size = start;
        self.end_size = end;
        self
    }

    /// Curves used for color and size
    pub fn with_interpolation(mut self, color: Interpolation, size: Interpolation) -> Self {
        self.color_interpolation = color;
        self.size_interpolation = size;
        self
    }

    /// Lifetime range; the bounds are swapped if given in reverse
    pub fn with_lifetime(mut self, min: f32, max: f32) -> Self {
        self.min_lifetime = min.min(max);
        self.max_lifetime = min.max(max);
        self
    }

    /// `count` particles every `wait` seconds
    pub fn with_burst(mut self, count: usize, wait: f32) -> Self {
        self.spawn_count = count;
        self.spawn_wait = wait;
        self
    }

    /// Cap on live particles
    pub fn with_max_particles(mut self, max_particles: usize) -> Self {
        self.max_particles = max_particles;
        self
    }

    /// Emission speed, angle and cone width
    pub fn with_velocity(mut self, speed: f32, direction: f32, spread: f32) -> Self {
        self.speed = speed;
        self.direction = direction;
        self.spread = spread;
        self
    }

    /// Whether bursts repeat
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Seed of the random lifetimes and angles
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Live particles, oldest first
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of live particles
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// A non-looping emitter whose burst has come and gone
    pub fn is_finished(&self) -> bool {
        !self.looping && self.bursts > 0 && self.particles.is_empty()
    }

    /// Color at life fraction `t`
    pub fn color_at(&self, t: f32) -> Vec4 {
        self.start_color.lerp(&self.end_color, self.color_interpolation.apply(t))
    }

    /// Size at life fraction `t`
    pub fn size_at(&self, t: f32) -> f32 {
        let blend = self.size_interpolation.apply(t);
        self.start_size + (self.end_size - self.start_size) * blend
    }

    pub(crate) fn initialize(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), ComponentError> {
        if self.texture.is_none() && !self.texture_path.is_empty() {
            self.texture = Some(ctx.resources_mut().load_texture(&self.texture_path)?);
        }
        if let Some(info) = self.texture.and_then(|handle| ctx.world().resources().texture(handle)) {
            self.region = info.uv_rect;
        }
        Ok(())
    }

    pub(crate) fn update(&mut self, dt: f32, ctx: &mut ComponentContext<'_>) {
        let origin = ctx.resolve_owner_global().unwrap_or_else(Mat3::identity);
        let queue = ctx.world_mut().render_queue_mut();

        self.particles.retain_mut(|particle| {
            particle.age += dt;
            if particle.age >= particle.lifetime {
                queue.retire(particle.job);
                return false;
            }
            particle.position += particle.velocity * dt;
            true
        });

        self.spawn_timer += dt;
        if self.spawn_timer >= self.spawn_wait && (self.looping || self.bursts == 0) {
            self.spawn_timer = 0.0;
            self.bursts += 1;
            self.spawn_burst(&origin, queue);
        }

        self.publish(queue);
    }

    fn spawn_burst(&mut self, origin: &Mat3, queue: &mut RenderQueue) {
        let available = self.max_particles.saturating_sub(self.particles.len());
        let count = self.spawn_count.min(available);
        if count < self.spawn_count {
            log::trace!("Particle burst capped at {} of {}", count, self.spawn_count);
        }

        let position = origin.extract_translation();
        let half_spread = self.spread.abs() * 0.5;
        let min_lifetime = self.min_lifetime.min(self.max_lifetime);
        let max_lifetime = self.min_lifetime.max(self.max_lifetime);

        for _ in 0..count {
            let angle = self.direction + self.rng.gen_range(-half_spread..=half_spread);
            let heading = origin * Vec3::new(angle.cos(), angle.sin(), 0.0);
            let velocity = Vec2::new(heading.x, heading.y)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vec2::zeros)
                * self.speed;

            let job = queue.acquire();
            queue.set_uv_rect(job, self.region);
            self.particles.push(Particle {
                position,
                velocity,
                age: 0.0,
                lifetime: self.rng.gen_range(min_lifetime..=max_lifetime),
                job,
            });
        }
    }

    fn publish(&self, queue: &mut RenderQueue) {
        for particle in &self.particles {
            let t = particle.progress();
            let size = self.size_at(t);
            let placement = Mat3::translation_2d(&Vec3::new(particle.position.x, particle.position.y, 0.0))
                * Mat3::scaling_2d(&Vec3::new(size, size, 1.0));
            queue.set_transformation(particle.job, placement);
            queue.set_tint(particle.job, self.color_at(t));
        }
    }

    pub(crate) fn shutdown(&mut self, ctx: &mut ComponentContext<'_>) {
        let queue = ctx.world_mut().render_queue_mut();
        for particle in self.particles.drain(..) {
            queue.retire(particle.job);
        }
    }

    /// Write the emitter configuration; live particles are not stored
    pub fn serialize(&self, writer: &mut ArchiveWriter) {
        writer.write_variable("texturePath", self.texture_path.as_str());
        writer.write_variable("startColor", self.start_color.xyz());
        writer.write_variable("startAlpha", self.start_color.w);
        writer.write_variable("endColor", self.end_color.xyz());
        writer.write_variable("endAlpha", self.end_color.w);
        writer.write_variable("startSize", self.start_size);
        writer.write_variable("endSize", self.end_size);
        writer.write_variable("colorInterpolation", self.color_interpolation.name());
        writer.write_variable("sizeInterpolation", self.size_interpolation.name());
        writer.write_variable("maxParticles", self.max_particles);
        writer.write_variable("spawnCount", self.spawn_count);
        writer.write_variable("minLifetime", self.min_lifetime);
        writer.write_variable("maxLifetime", self.max_lifetime);
        writer.write_variable("spawnWait", self.spawn_wait);
        writer.write_variable("speed", self.speed);
        writer.write_variable("direction", self.direction);
        writer.write_variable("spread", self.spread);
        writer.write_variable("looping", self.looping);
        writer.write_variable("seed", self.seed);
    }

    /// Read the emitter configuration; the texture loads when the owner
    /// initializes
    pub fn deserialize(scope: &Scope) -> ArchiveResult<Self> {
        let start_color: Vec3 = scope.read_variable("startColor")?;
        let end_color: Vec3 = scope.read_variable("endColor")?;

        Ok(Self::new(scope.read_variable::<String>("texturePath")?)
            .with_colors(
                start_color.push(scope.read_variable("startAlpha")?),
                end_color.push(scope.read_variable("endAlpha")?),
            )
            .with_sizes(scope.read_variable("startSize")?, scope.read_variable("endSize")?)
            .with_interpolation(
                read_interpolation(scope, "colorInterpolation")?,
                read_interpolation(scope, "sizeInterpolation")?,
            )
            .with_max_particles(scope.read_variable("maxParticles")?)
            .with_burst(scope.read_variable("spawnCount")?, scope.read_variable("spawnWait")?)
            .with_lifetime(scope.read_variable("minLifetime")?, scope.read_variable("maxLifetime")?)
            .with_velocity(
                scope.read_variable("speed")?,
                scope.read_variable("direction")?,
                scope.read_variable("spread")?,
            )
            .with_looping(scope.read_variable("looping")?)
            .with_seed(scope.read_variable("seed")?))
    }
}

fn read_interpolation(scope: &Scope, name: &str) -> ArchiveResult<Interpolation> {
    let value: String = scope.read_variable(name)?;
    Interpolation::from_name(&value)
        .ok_or_else(|| ArchiveError::Format(format!("unknown interpolation '{}' in {}", value, name)))
}
