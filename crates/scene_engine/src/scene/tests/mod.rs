//! Scenario tests spanning the manager, world and components

mod hierarchy;

use crate::assets::ResourceManager;
use crate::components::{Behavior, ComponentContext, ComponentError};
use crate::foundation::collections::ObjectId;
use crate::scene::GameObjectManager;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub(super) type CallLog = Rc<RefCell<Vec<&'static str>>>;

pub(super) fn manager() -> GameObjectManager {
    let mut resources = ResourceManager::new(256, 256);
    resources.register_texture_size("player.png", 64, 64);
    resources.register_texture_size("enemy.png", 32, 32);
    GameObjectManager::new(Box::new(resources))
}

/// Records every lifecycle hook it receives
#[derive(Clone)]
pub(super) struct Recorder {
    pub log: CallLog,
    pub destroy_self_on_update: bool,
}

impl Recorder {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Rc::clone(log),
            destroy_self_on_update: false,
        }
    }

    pub fn destroying_self(log: &CallLog) -> Self {
        Self {
            destroy_self_on_update: true,
            ..Self::new(log)
        }
    }
}

impl Behavior for Recorder {
    fn name(&self) -> &str {
        "Recorder"
    }

    fn clone_box(&self) -> Box<dyn Behavior> {
        Box::new(self.clone())
    }

    fn initialize(&mut self, _ctx: &mut ComponentContext<'_>) -> Result<(), ComponentError> {
        self.log.borrow_mut().push("initialize");
        Ok(())
    }

    fn update(&mut self, _dt: f32, ctx: &mut ComponentContext<'_>) {
        self.log.borrow_mut().push("update");
        if self.destroy_self_on_update {
            ctx.destroy_owner();
        }
    }

    fn fixed_update(&mut self, _dt: f32, _ctx: &mut ComponentContext<'_>) {
        self.log.borrow_mut().push("fixed_update");
    }

    fn shutdown(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.log.borrow_mut().push("shutdown");
    }

    fn unload(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.log.borrow_mut().push("unload");
    }
}

/// Flags another object for destruction during its update
#[derive(Clone)]
pub(super) struct Destroyer {
    pub target: Rc<Cell<Option<ObjectId>>>,
}

impl Behavior for Destroyer {
    fn name(&self) -> &str {
        "Destroyer"
    }

    fn clone_box(&self) -> Box<dyn Behavior> {
        Box::new(self.clone())
    }

    fn update(&mut self, _dt: f32, ctx: &mut ComponentContext<'_>) {
        if let Some(target) = self.target.take() {
            ctx.destroy(target);
        }
    }
}
