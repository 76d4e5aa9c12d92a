//! Sprite sheet animation
//!
//! Steps through the frames of a sheet laid out in `columns` x `rows` cells,
//! left to right then top to bottom. Every update the current cell, taken
//! within the sibling Sprite's atlas region, is written to the render job.
//! Attach the Animator after the Sprite so the Sprite's region is loaded
//! first.

use crate::components::{ComponentContext, Sprite};
use crate::foundation::math::Vec2;
use crate::render::UvRect;
use crate::serialization::{ArchiveResult, ArchiveWriter, Scope};

/// Frame stepper for sprite sheets
#[derive(Debug, Clone, PartialEq)]
pub struct Animator {
    columns: u32,
    rows: u32,
    frame_duration: f32,
    looping: bool,
    playing: bool,
    current_frame: u32,
    elapsed: f32,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(1, 1, 0.0)
    }
}

impl Animator {
    /// Animator over a `columns` x `rows` sheet, advancing one frame every
    /// `frame_duration` seconds
    pub fn new(columns: u32, rows: u32, frame_duration: f32) -> Self {
        Self {
            columns: columns.max(1),
            rows: rows.max(1),
            frame_duration,
            looping: true,
            playing: true,
            current_frame: 0,
            elapsed: 0.0,
        }
    }

    /// Whether the animation restarts after the last frame
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Number of frames in the sheet
    pub fn frame_count(&self) -> u32 {
        self.columns * self.rows
    }

    /// Index of the displayed frame
    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    /// Whether frames are advancing
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Restart from the first frame
    pub fn play(&mut self) {
        self.playing = true;
        self.current_frame = 0;
        self.elapsed = 0.0;
    }

    /// Freeze on the current frame
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Advance the animation clock by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        if !self.playing || self.frame_duration <= 0.0 {
            return;
        }

        self.elapsed += dt;
        while self.playing && self.elapsed >= self.frame_duration {
            self.elapsed -= self.frame_duration;
            if self.current_frame + 1 < self.frame_count() {
                self.current_frame += 1;
            } else if self.looping {
                self.current_frame = 0;
            } else {
                self.playing = false;
            }
        }
    }

    /// Cell of the current frame in the sheet's [0, 1] space
    pub fn frame_rect(&self) -> UvRect {
        let column = self.current_frame % self.columns;
        let row = self.current_frame / self.columns;
        let scale = Vec2::new(1.0 / self.columns as f32, 1.0 / self.rows as f32);
        UvRect::new(Vec2::new(column as f32 * scale.x, row as f32 * scale.y), scale)
    }

    pub(crate) fn update(&mut self, dt: f32, ctx: &mut ComponentContext<'_>) {
        self.advance(dt);

        let region = ctx
            .siblings()
            .get::<Sprite>()
            .map_or_else(UvRect::full, Sprite::uv_rect);
        let frame = self.frame_rect();
        ctx.set_render_uv_rect(region.sub_rect(frame.offset, frame.scale));
    }

    /// Write the sheet layout and timing
    pub fn serialize(&self, writer: &mut ArchiveWriter) {
        writer.write_variable("columns", self.columns);
        writer.write_variable("rows", self.rows);
        writer.write_variable("frameDuration", self.frame_duration);
        writer.write_variable("looping", self.looping);
    }

    /// Read the sheet layout and timing
    pub fn deserialize(scope: &Scope) -> ArchiveResult<Self> {
        let animator = Self::new(
            scope.read_variable("columns")?,
            scope.read_variable("rows")?,
            scope.read_variable("frameDuration")?,
        );
        Ok(animator.with_looping(scope.read_variable("looping")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_advance_and_loop() {
        let mut animator = Animator::new(2, 2, 0.1);
        animator.advance(0.25);
        assert_eq!(animator.current_frame(), 2);

        animator.advance(0.2);
        assert_eq!(animator.current_frame(), 0);
        assert!(animator.is_playing());
    }

    #[test]
    fn test_non_looping_stops_on_last_frame() {
        let mut animator = Animator::new(3, 1, 0.5).with_looping(false);
        animator.advance(10.0);
        assert_eq!(animator.current_frame(), 2);
        assert!(!animator.is_playing());
    }

    #[test]
    fn test_frame_rect() {
        let mut animator = Animator::new(4, 2, 1.0);
        animator.advance(5.0);
        assert_eq!(animator.current_frame(), 5);

        let rect = animator.frame_rect();
        assert_eq!(rect.offset, Vec2::new(0.25, 0.5));
        assert_eq!(rect.scale, Vec2::new(0.25, 0.5));
    }
}
