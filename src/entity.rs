//! Core trait for identifiable resources managed by a controller.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Numeric identifier shared by every resource.
pub type EntityId = u64;

/// Trait that every resource handled by crud-kit must implement.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use crud_kit::Resource;
///
/// #[derive(Clone, Debug, Serialize, Deserialize)]
/// pub struct Todo {
///     pub id: u64,
///     pub title: String,
/// }
///
/// #[derive(Clone, Debug, Serialize, Deserialize)]
/// pub struct NewTodo {
///     pub title: String,
/// }
///
/// impl Resource for Todo {
///     type Draft = NewTodo;
///     type Patch = NewTodo;
///
///     fn id(&self) -> u64 {
///         self.id
///     }
///
///     fn resource_name() -> &'static str {
///         "todo"
///     }
/// }
/// ```
pub trait Resource: Send + Sync + Clone + Serialize + DeserializeOwned + 'static {
    /// Fields sent when creating a resource (everything but the id).
    type Draft: Send + Sync + Serialize + 'static;

    /// Fields sent when updating a resource.
    type Patch: Send + Sync + Serialize + 'static;

    /// Unique identifier of this resource.
    fn id(&self) -> EntityId;

    /// Singular name of the resource type, e.g. `"user"`.
    ///
    /// Used for cache keys (`user_{id}`) and log lines.
    fn resource_name() -> &'static str;
}
