//! Hierarchical transforms through the manager tick

use super::manager;
use crate::components::{Behavior, Camera, ComponentContext, Sprite, Transform};
use crate::foundation::collections::ObjectId;
use crate::foundation::math::{Mat3, Mat3Ext, Vec2, Vec3};
use crate::scene::GameObject;
use approx::assert_relative_eq;
use std::cell::Cell;
use std::rc::Rc;

fn trs(translation: Vec3, rotation: f32, scaling: Vec3) -> Transform {
    Transform::new()
        .with_translation(translation)
        .with_rotation(rotation)
        .with_scaling(scaling)
}

fn matrix_of(transform: &Transform) -> Mat3 {
    Mat3::translation_2d(&transform.local_translation())
        * Mat3::rotation_2d(transform.local_rotation())
        * Mat3::scaling_2d(&transform.local_scaling())
}

#[test]
fn test_three_level_chain_composes_in_order() {
    let mut manager = manager();
    let parent_local = trs(Vec3::new(10.0, 5.0, 0.0), 0.5, Vec3::new(2.0, 2.0, 1.0));
    let child_local = trs(Vec3::new(-3.0, 1.0, 0.0), -0.2, Vec3::new(1.0, 0.5, 1.0));
    let grandchild_local = trs(Vec3::new(0.0, 4.0, 0.0), 1.1, Vec3::new(3.0, 1.0, 1.0));
    let expected = matrix_of(&parent_local) * matrix_of(&child_local) * matrix_of(&grandchild_local);

    // Grandchild first so it updates before its ancestors in the live list
    let grandchild = manager
        .add_object(
            GameObject::new("Grandchild")
                .with_component(grandchild_local)
                .with_component(Sprite::new("player.png")),
        )
        .unwrap();
    let child = manager.add_object(GameObject::new("Child").with_component(child_local)).unwrap();
    let parent = manager.add_object(GameObject::new("Parent").with_component(parent_local)).unwrap();
    assert!(manager.add_child(parent, child));
    assert!(manager.add_child(child, grandchild));

    manager.update(1.0 / 60.0);

    let global = manager.global_transformation(grandchild).unwrap();
    assert_relative_eq!(global, expected, epsilon = 1e-4);

    let job = manager.object(grandchild).unwrap().render_job().unwrap();
    let published = manager.world().render_queue().get(job).unwrap().transformation.unwrap();
    assert_relative_eq!(published, expected, epsilon = 1e-4);
}

#[test]
fn test_child_sees_parent_change_in_same_tick() {
    let mut manager = manager();
    let child = manager
        .add_object(
            GameObject::new("Child")
                .with_component(Transform::new().with_translation(Vec3::new(1.0, 0.0, 0.0)))
                .with_component(Sprite::new("player.png")),
        )
        .unwrap();
    let parent = manager
        .add_object(GameObject::new("Parent").with_component(Transform::new()))
        .unwrap();
    manager.add_child(parent, child);
    manager.update(0.0);

    manager
        .object_mut(parent)
        .unwrap()
        .get_component_mut::<Transform>()
        .unwrap()
        .set_local_translation(Vec3::new(100.0, 0.0, 0.0));
    manager.update(0.0);

    let job = manager.object(child).unwrap().render_job().unwrap();
    let published = manager.world().render_queue().get(job).unwrap().transformation.unwrap();
    assert_relative_eq!(published.extract_translation(), Vec2::new(101.0, 0.0), epsilon = 1e-5);
}

#[test]
fn test_global_decompositions() {
    let mut manager = manager();
    let parent = manager
        .add_object(GameObject::new("Parent").with_component(trs(
            Vec3::new(5.0, 0.0, 0.0),
            0.0,
            Vec3::new(2.0, 2.0, 1.0),
        )))
        .unwrap();
    let child = manager
        .add_object(GameObject::new("Child").with_component(trs(
            Vec3::new(1.0, 1.0, 0.0),
            0.3,
            Vec3::new(1.0, 1.0, 1.0),
        )))
        .unwrap();
    manager.add_child(parent, child);
    manager.update(0.0);

    let world = manager.world();
    assert_relative_eq!(world.global_translation(child).unwrap(), Vec2::new(7.0, 2.0), epsilon = 1e-5);
    assert_relative_eq!(world.global_rotation(child).unwrap(), 0.3, epsilon = 1e-5);
    assert_relative_eq!(world.global_scaling(child).unwrap(), Vec2::new(2.0, 2.0), epsilon = 1e-5);
}

#[test]
fn test_camera_follows_parent() {
    let mut manager = manager();
    let player = manager
        .add_object(GameObject::new("Player").with_component(Transform::new().with_translation(Vec3::new(30.0, 0.0, 0.0))))
        .unwrap();
    let camera = manager
        .add_object(
            GameObject::new("Camera")
                .with_component(Transform::new())
                .with_component(Camera::orthographic(100.0, 100.0, -5.0, 5.0)),
        )
        .unwrap();
    manager.add_child(player, camera);
    manager.set_main_camera(camera);
    manager.update(0.0);

    let batch = manager.build_batch();
    let clip = batch.camera_matrix() * Vec3::new(30.0, 0.0, 1.0);
    assert_relative_eq!(clip, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-5);
}

#[test]
fn test_destroying_parent_does_not_cascade() {
    let mut manager = manager();
    let parent = manager
        .add_object(GameObject::new("Parent").with_component(Transform::new().with_translation(Vec3::new(10.0, 0.0, 0.0))))
        .unwrap();
    let child = manager
        .add_object(GameObject::new("Child").with_component(Transform::new().with_translation(Vec3::new(1.0, 0.0, 0.0))))
        .unwrap();
    manager.add_child(parent, child);

    manager.destroy(parent);
    manager.update(0.0);

    assert!(manager.object(parent).is_none());
    assert!(manager.object(child).is_some());
    assert_relative_eq!(manager.global_translation(child).unwrap(), Vec2::new(1.0, 0.0), epsilon = 1e-6);
}

/// Resolves another object's global translation from inside its own update
#[derive(Clone)]
struct Tracker {
    target: Rc<Cell<Option<ObjectId>>>,
    through_owner: Rc<Cell<Option<Vec2>>>,
    through_world: Rc<Cell<Option<Vec2>>>,
}

impl Behavior for Tracker {
    fn name(&self) -> &str {
        "Tracker"
    }

    fn clone_box(&self) -> Box<dyn Behavior> {
        Box::new(self.clone())
    }

    fn update(&mut self, _dt: f32, ctx: &mut ComponentContext<'_>) {
        let Some(target) = self.target.get() else {
            return;
        };
        self.through_world
            .set(ctx.world_mut().resolve_global(target).map(|m| m.extract_translation()));
        self.through_owner
            .set(ctx.resolve_global(target).map(|m| m.extract_translation()));
    }
}

#[test]
fn test_child_resolved_during_parent_dispatch_includes_parent() {
    let mut manager = manager();
    let tracker = Tracker {
        target: Rc::new(Cell::new(None)),
        through_owner: Rc::new(Cell::new(None)),
        through_world: Rc::new(Cell::new(None)),
    };
    let parent = manager
        .add_object(
            GameObject::new("Parent")
                .with_component(Transform::new().with_translation(Vec3::new(100.0, 0.0, 0.0)))
                .with_behavior(tracker.clone()),
        )
        .unwrap();
    let child = manager
        .add_object(GameObject::new("Child").with_component(Transform::new().with_translation(Vec3::new(1.0, 0.0, 0.0))))
        .unwrap();
    manager.add_child(parent, child);
    tracker.target.set(Some(child));

    manager.update(0.0);

    let through_owner = tracker.through_owner.get().unwrap();
    assert_relative_eq!(through_owner, Vec2::new(101.0, 0.0), epsilon = 1e-5);
    // The arena alone cannot see the parent's Transform mid-dispatch
    assert_eq!(tracker.through_world.get(), None);
}

#[test]
fn test_owner_resolved_from_its_own_hook() {
    let mut manager = manager();
    let tracker = Tracker {
        target: Rc::new(Cell::new(None)),
        through_owner: Rc::new(Cell::new(None)),
        through_world: Rc::new(Cell::new(None)),
    };
    let parent = manager
        .add_object(GameObject::new("Parent").with_component(Transform::new().with_translation(Vec3::new(10.0, 0.0, 0.0))))
        .unwrap();
    let child = manager
        .add_object(
            GameObject::new("Child")
                .with_component(Transform::new().with_translation(Vec3::new(0.0, 2.0, 0.0)))
                .with_behavior(tracker.clone()),
        )
        .unwrap();
    manager.add_child(parent, child);
    tracker.target.set(Some(child));

    manager.update(0.0);

    assert_relative_eq!(tracker.through_owner.get().unwrap(), Vec2::new(10.0, 2.0), epsilon = 1e-5);
    assert_eq!(tracker.through_world.get(), None);
    // Outside dispatch the arena resolves the same chain
    assert_relative_eq!(manager.global_translation(child).unwrap(), Vec2::new(10.0, 2.0), epsilon = 1e-5);
}
