//! Event bus
//!
//! - Events are a closed, tagged set ([`Event`]); each variant has a name
//!   handlers subscribe to
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Registration system (only notify interested handlers)
//! - Queued delivery: `send` during the frame, `dispatch` once per frame

use crate::foundation::collections::{HandleMap, SubscriptionId};
use bitflags::bitflags;
use std::collections::HashMap;

bitflags! {
    /// Modifier keys held during a key event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u32 {
        /// Either shift key
        const SHIFT = 1 << 0;
        /// Either control key
        const CONTROL = 1 << 1;
        /// Either alt key
        const ALT = 1 << 2;
        /// Either super (logo) key
        const SUPER = 1 << 3;
    }
}

/// Key codes used by the engine (GLFW numbering)
pub mod keys {
    /// Escape
    pub const ESCAPE: u32 = 256;
    /// F5
    pub const F5: u32 = 294;
}

/// What happened to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Key went down
    Press,
    /// Key went up
    Release,
    /// Key held long enough to auto-repeat
    Repeat,
}

/// Events delivered through the bus
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The window framebuffer changed size
    WindowResize {
        /// New width in pixels
        width: u32,
        /// New height in pixels
        height: u32,
    },
    /// Keyboard input
    Key {
        /// Key code, see [`keys`]
        key: u32,
        /// Press, release or repeat
        action: KeyAction,
        /// Modifiers held
        modifiers: KeyModifiers,
    },
}

impl Event {
    /// Subscription name of [`Event::WindowResize`]
    pub const WINDOW_RESIZE: &'static str = "WindowResizeEvent";
    /// Subscription name of [`Event::Key`]
    pub const KEY: &'static str = "KeyEvent";

    /// Name handlers subscribe to for this event
    pub fn name(&self) -> &'static str {
        match self {
            Self::WindowResize { .. } => Self::WINDOW_RESIZE,
            Self::Key { .. } => Self::KEY,
        }
    }

    /// Whether this is a press of `key`
    pub fn is_key_press(&self, key: u32) -> bool {
        matches!(self, Self::Key { key: k, action: KeyAction::Press, .. } if *k == key)
    }
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
/// Returns false to allow forwarding to other handlers
pub trait EventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &Event) -> bool;
}

impl<F> EventHandler for F
where
    F: FnMut(&Event) -> bool,
{
    fn on_event(&mut self, event: &Event) -> bool {
        self(event)
    }
}

struct Subscription {
    id: SubscriptionId,
    handler: Box<dyn EventHandler>,
}

/// Named-subscription event bus with a per-frame queue
#[derive(Default)]
pub struct EventBus {
    queue: Vec<Event>,
    handlers: HashMap<String, Vec<Subscription>>,
    subscriptions: HandleMap<SubscriptionId, String>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events named `event_name`
    ///
    /// Handlers for the same name are called in subscription order.
    pub fn subscribe(&mut self, event_name: &str, handler: impl EventHandler + 'static) -> SubscriptionId {
        let id = self.subscriptions.insert(event_name.to_string());
        self.handlers
            .entry(event_name.to_string())
            .or_default()
            .push(Subscription {
                id,
                handler: Box::new(handler),
            });
        log::trace!("Subscribed {:?} to '{}'", id, event_name);
        id
    }

    /// Remove a subscription. Returns false for unknown or already removed ids.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(event_name) = self.subscriptions.remove(id) else {
            return false;
        };

        if let Some(handlers) = self.handlers.get_mut(&event_name) {
            handlers.retain(|subscription| subscription.id != id);
        }
        log::trace!("Unsubscribed {:?} from '{}'", id, event_name);
        true
    }

    /// Number of handlers registered for `event_name`
    pub fn subscriber_count(&self, event_name: &str) -> usize {
        self.handlers.get(event_name).map_or(0, Vec::len)
    }

    /// Queue an event for the next [`EventBus::dispatch`]
    pub fn send(&mut self, event: Event) {
        self.queue.push(event);
    }

    /// Number of queued events
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Deliver every queued event in send order
    pub fn dispatch(&mut self) {
        let queued = std::mem::take(&mut self.queue);
        for event in queued {
            self.dispatch_event(&event);
        }
    }

    /// Deliver one event now. Returns whether a handler consumed it.
    pub fn dispatch_event(&mut self, event: &Event) -> bool {
        if let Some(handlers) = self.handlers.get_mut(event.name()) {
            for subscription in handlers.iter_mut() {
                if subscription.handler.on_event(event) {
                    // Event consumed, stop forwarding
                    return true;
                }
            }
        }
        false
    }

    /// Drop queued events
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("queued", &self.queue.len())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
