//! Handle types for the generation-checked arenas

pub use slotmap::{Key, SlotMap};

slotmap::new_key_type! {
    /// Handle to a game object stored in the world arena
    pub struct ObjectId;

    /// Handle to a render job stored in the render queue
    pub struct RenderJobId;

    /// Handle to a texture owned by a resource loader
    pub struct TextureHandle;

    /// Handle returned by event bus subscriptions
    pub struct SubscriptionId;
}

/// Handle-based map using slot map for stable references
pub type HandleMap<K, T> = SlotMap<K, T>;
