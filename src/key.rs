//! Cache key management utilities.
//!
//! Keys follow the layout used by the resource services:
//!
//! | Data | Key |
//! |------|-----|
//! | all users | `users` |
//! | one user | `user_1` |
//! | posts of user 1 | `posts_user_1` |
//! | comments of post 7 | `comments_post_7` |
//!
//! Every key is stored under the store prefix (`app_cache_` by default).

use crate::entity::{EntityId, Resource};

/// Prefix applied to every key in the persistent store.
pub const DEFAULT_CACHE_PREFIX: &str = "app_cache_";

/// Builder for cache keys.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Key for the whole collection of a resource type, e.g. `users`.
    pub fn collection<T: Resource>() -> String {
        format!("{}s", T::resource_name())
    }

    /// Key for a single resource, e.g. `user_1`.
    pub fn item<T: Resource>(id: EntityId) -> String {
        format!("{}_{}", T::resource_name(), id)
    }

    /// Key for the children of a parent resource, e.g. `posts_user_1`.
    pub fn children<C: Resource, P: Resource>(parent_id: EntityId) -> String {
        format!("{}s_{}_{}", C::resource_name(), P::resource_name(), parent_id)
    }

    /// Build composite key from multiple parts.
    pub fn build_composite(parts: &[&str]) -> String {
        parts.join("_")
    }

    /// Full key as written to the store.
    pub fn storage_key(prefix: &str, key: &str) -> String {
        format!("{}{}", prefix, key)
    }

    /// Strip the store prefix from a stored key.
    pub fn logical_key<'a>(prefix: &str, storage_key: &'a str) -> Option<&'a str> {
        storage_key.strip_prefix(prefix)
    }
}
