//! Operation bindings for the resource controller.
//!
//! A [`CrudRepository`] bundles up to four asynchronous operations for one
//! resource type. Each is optional: leaving one unbound turns the matching
//! controller method into a silent no-op, which is how read-only or
//! create-only resources are expressed.
//!
//! # Binding operations
//!
//! ```ignore
//! use crud_kit::repository::CrudRepository;
//!
//! let repo = CrudRepository::<User>::new()
//!     .with_list(move || { let api = api.clone(); async move { api.users().await } })
//!     .with_delete(move |id| { let api = api2.clone(); async move { api.delete_user(id).await } });
//!
//! assert!(repo.has_list());
//! assert!(!repo.has_create());
//! ```
//!
//! # Mocking for Tests
//!
//! [`InMemoryRepository`] keeps resources in memory and hands out a fully
//! bound repository with [`InMemoryRepository::bindings`]. Failures and
//! latency can be injected to exercise error and ordering paths.

use crate::entity::{EntityId, Resource};
use crate::error::{Error, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Bound `list` operation.
pub type ListFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<T>>> + Send + Sync>;

/// Bound `create` operation.
pub type CreateFn<T> =
    Arc<dyn Fn(<T as Resource>::Draft) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Bound `update` operation.
pub type UpdateFn<T> =
    Arc<dyn Fn(EntityId, <T as Resource>::Patch) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Bound `delete` operation.
pub type DeleteFn = Arc<dyn Fn(EntityId) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Up to four operation bindings for resource type `T`.
pub struct CrudRepository<T: Resource> {
    list: Option<ListFn<T>>,
    create: Option<CreateFn<T>>,
    update: Option<UpdateFn<T>>,
    delete: Option<DeleteFn>,
}

impl<T: Resource> CrudRepository<T> {
    /// Repository with nothing bound.
    pub fn new() -> Self {
        CrudRepository {
            list: None,
            create: None,
            update: None,
            delete: None,
        }
    }

    /// Bind the `list` operation.
    pub fn with_list<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>>> + Send + 'static,
    {
        self.list = Some(Arc::new(move || f().boxed()));
        self
    }

    /// Bind the `create` operation.
    pub fn with_create<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(T::Draft) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.create = Some(Arc::new(move |draft| f(draft).boxed()));
        self
    }

    /// Bind the `update` operation.
    pub fn with_update<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EntityId, T::Patch) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.update = Some(Arc::new(move |id, patch| f(id, patch).boxed()));
        self
    }

    /// Bind the `delete` operation.
    pub fn with_delete<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EntityId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.delete = Some(Arc::new(move |id| f(id).boxed()));
        self
    }

    pub fn has_list(&self) -> bool {
        self.list.is_some()
    }

    pub fn has_create(&self) -> bool {
        self.create.is_some()
    }

    pub fn has_update(&self) -> bool {
        self.update.is_some()
    }

    pub fn has_delete(&self) -> bool {
        self.delete.is_some()
    }

    pub(crate) fn list_op(&self) -> Option<ListFn<T>> {
        self.list.clone()
    }

    pub(crate) fn create_op(&self) -> Option<CreateFn<T>> {
        self.create.clone()
    }

    pub(crate) fn update_op(&self) -> Option<UpdateFn<T>> {
        self.update.clone()
    }

    pub(crate) fn delete_op(&self) -> Option<DeleteFn> {
        self.delete.clone()
    }
}

impl<T: Resource> Clone for CrudRepository<T> {
    fn clone(&self) -> Self {
        CrudRepository {
            list: self.list.clone(),
            create: self.create.clone(),
            update: self.update.clone(),
            delete: self.delete.clone(),
        }
    }
}

impl<T: Resource> Default for CrudRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// In-Memory Test Repository
// ============================================================================

/// Resources that can be built from their create fields and patched in place.
///
/// Needed by [`InMemoryRepository`] to play the server's role.
pub trait Materialize: Resource {
    /// Build the resource the server would return for `draft` under `id`.
    fn from_draft(id: EntityId, draft: Self::Draft) -> Self;

    /// Apply `patch`, returning the updated resource.
    fn apply_patch(&self, patch: Self::Patch) -> Self;
}

struct RepoState<T> {
    items: Vec<T>,
    failure: Option<Error>,
    latency: Option<Duration>,
    calls: usize,
}

/// Simple in-memory repository for testing controllers.
///
/// Clones share the same data, so a test can keep one handle for
/// inspection while the controller owns the bindings.
///
/// # Testing Different Scenarios
///
/// - **Success paths**: seed with [`with_items`](Self::with_items)
/// - **Transport failures**: [`fail_with`](Self::fail_with) makes every call fail
/// - **Ordering**: [`with_latency`](Self::with_latency) delays every call
pub struct InMemoryRepository<T: Materialize> {
    state: Arc<Mutex<RepoState<T>>>,
}

impl<T: Materialize> InMemoryRepository<T> {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Create a repository seeded with `items`, in order.
    pub fn with_items(items: Vec<T>) -> Self {
        InMemoryRepository {
            state: Arc::new(Mutex::new(RepoState {
                items,
                failure: None,
                latency: None,
                calls: 0,
            })),
        }
    }

    /// Delay every operation by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = Some(latency);
        self
    }

    /// Make every following operation fail with `error` (or succeed again with `None`).
    pub fn fail_with(&self, error: Option<Error>) {
        self.lock().failure = error;
    }

    /// Insert or replace a resource by id.
    pub fn insert(&self, value: T) {
        let mut state = self.lock();
        match state.items.iter_mut().find(|item| item.id() == value.id()) {
            Some(slot) => *slot = value,
            None => state.items.push(value),
        }
    }

    /// Snapshot of stored resources.
    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    /// Number of operations invoked so far.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Remove all resources.
    pub fn clear(&self) {
        self.lock().items.clear();
    }

    /// Return the number of resources in the repository.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Return true if the repository contains no resources.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Fully bound repository operating on this in-memory data.
    pub fn bindings(&self) -> CrudRepository<T> {
        let list = self.clone();
        let create = self.clone();
        let update = self.clone();
        let delete = self.clone();

        CrudRepository::new()
            .with_list(move || {
                let repo = list.clone();
                async move { repo.list_items().await }
            })
            .with_create(move |draft| {
                let repo = create.clone();
                async move { repo.create_item(draft).await }
            })
            .with_update(move |id, patch| {
                let repo = update.clone();
                async move { repo.update_item(id, patch).await }
            })
            .with_delete(move |id| {
                let repo = delete.clone();
                async move { repo.delete_item(id).await }
            })
    }

    async fn list_items(&self) -> Result<Vec<T>> {
        self.begin().await?;
        Ok(self.items())
    }

    /// Assign the next free id, like a server would.
    async fn create_item(&self, draft: T::Draft) -> Result<T> {
        self.begin().await?;
        let mut state = self.lock();
        let id = state.items.iter().map(Resource::id).max().unwrap_or(0) + 1;
        let created = T::from_draft(id, draft);
        state.items.push(created.clone());
        Ok(created)
    }

    async fn update_item(&self, id: EntityId, patch: T::Patch) -> Result<T> {
        self.begin().await?;
        let mut state = self.lock();
        let slot = state
            .items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| Error::status(404))?;
        *slot = slot.apply_patch(patch);
        Ok(slot.clone())
    }

    async fn delete_item(&self, id: EntityId) -> Result<()> {
        self.begin().await?;
        let mut state = self.lock();
        let before = state.items.len();
        state.items.retain(|item| item.id() != id);
        if state.items.len() == before {
            return Err(Error::status(404));
        }
        Ok(())
    }

    /// Count the call, wait out the latency and apply the injected failure.
    async fn begin(&self) -> Result<()> {
        let latency = {
            let mut state = self.lock();
            state.calls += 1;
            state.latency
        };
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
        match self.lock().failure.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RepoState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Materialize> Clone for InMemoryRepository<T> {
    fn clone(&self) -> Self {
        InMemoryRepository {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Materialize> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}
