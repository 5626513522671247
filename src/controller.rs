//! List-and-mutate lifecycle for one resource type.
//!
//! A [`ResourceController`] owns the visible collection of a resource along
//! with its loading flag and inline error message. The four operations run
//! the bound [`CrudRepository`] calls, apply the result to the collection and
//! report the outcome through a [`Notifier`].
//!
//! # Failure handling
//!
//! Every failure is normalized with [`Error::user_message`] and the same text
//! is both stored as `error_message` and sent as one error notification. The
//! collection is never touched by a failed operation. `fetch_all` absorbs the
//! failure; the mutations return it so the caller can keep its form open.
//!
//! # Concurrency
//!
//! Operations are not serialized. State changes land in the order the
//! operations resolve, and `is_loading`/`error_message` reflect whichever
//! operation finished last.

use crate::config::Messages;
use crate::entity::{EntityId, Resource};
use crate::error::{Error, Result};
use crate::notification::{NotificationKind, NotifierRef};
use crate::repository::CrudRepository;
use std::sync::Arc;
use tokio::sync::watch;

/// Snapshot of a controller's state.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceState<T> {
    pub items: Vec<T>,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        ResourceState {
            items: Vec::new(),
            is_loading: false,
            error_message: None,
        }
    }
}

/// State controller for resource type `T`.
///
/// # Example
///
/// ```ignore
/// let controller = ResourceController::new(users.bindings(), Arc::new(center.clone()));
///
/// controller.fetch_all().await;
/// let created = controller.create_item(draft).await?;
/// assert_eq!(controller.items().last(), created.as_ref());
/// ```
pub struct ResourceController<T: Resource> {
    repository: CrudRepository<T>,
    state: Arc<watch::Sender<ResourceState<T>>>,
    notifier: NotifierRef,
    messages: Messages,
}

impl<T: Resource> ResourceController<T> {
    /// Controller with an empty collection and messages named after the resource.
    pub fn new(repository: CrudRepository<T>, notifier: NotifierRef) -> Self {
        let (tx, _rx) = watch::channel(ResourceState::default());
        ResourceController {
            repository,
            state: Arc::new(tx),
            notifier,
            messages: Messages::for_resource(T::resource_name()),
        }
    }

    /// Replace the success and failure texts.
    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// Start from an already loaded collection.
    pub fn with_items(self, items: Vec<T>) -> Self {
        self.state.send_modify(|state| state.items = items);
        self
    }

    /// Full state snapshot.
    pub fn state(&self) -> ResourceState<T> {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.state.borrow().items.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn error_message(&self) -> Option<String> {
        self.state.borrow().error_message.clone()
    }

    /// Subscribe to state changes. Drop the receiver to unsubscribe.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.state.subscribe()
    }

    /// Reload the whole collection.
    ///
    /// On failure the previous collection stays visible and the error is
    /// recorded and notified, not returned.
    pub async fn fetch_all(&self) {
        let Some(list) = self.repository.list_op() else {
            debug!("No list operation bound for {}", T::resource_name());
            return;
        };

        self.begin();
        match list().await {
            Ok(items) => {
                debug!("Loaded {} {} item(s)", items.len(), T::resource_name());
                self.state.send_modify(|state| {
                    state.items = items;
                    state.is_loading = false;
                });
            }
            Err(e) => {
                self.fail(&e, &self.messages.fetch_failed);
            }
        }
    }

    /// Create a resource and append it to the collection.
    ///
    /// Returns `Ok(None)` when no create operation is bound.
    ///
    /// # Errors
    ///
    /// Returns the operation's error after recording and notifying it.
    pub async fn create_item(&self, draft: T::Draft) -> Result<Option<T>> {
        let Some(create) = self.repository.create_op() else {
            debug!("No create operation bound for {}", T::resource_name());
            return Ok(None);
        };

        self.begin();
        match create(draft).await {
            Ok(created) => {
                info!("Created {} {}", T::resource_name(), created.id());
                let appended = created.clone();
                let created_id = appended.id();
                self.state.send_modify(|state| {
                    // servers may hand back an id already in the collection
                    state.items.retain(|item| item.id() != created_id);
                    state.items.push(appended);
                    state.is_loading = false;
                });
                self.notifier
                    .notify(&self.messages.create_succeeded, NotificationKind::Success);
                Ok(Some(created))
            }
            Err(e) => {
                self.fail(&e, &self.messages.create_failed);
                Err(e)
            }
        }
    }

    /// Update a resource and replace it in the collection, keeping its position.
    ///
    /// If the collection has no item with `id`, the collection is left as is.
    /// Returns `Ok(None)` when no update operation is bound.
    ///
    /// # Errors
    ///
    /// Returns the operation's error after recording and notifying it.
    pub async fn update_item(&self, id: EntityId, patch: T::Patch) -> Result<Option<T>> {
        let Some(update) = self.repository.update_op() else {
            debug!("No update operation bound for {}", T::resource_name());
            return Ok(None);
        };

        self.begin();
        match update(id, patch).await {
            Ok(updated) => {
                info!("Updated {} {}", T::resource_name(), id);
                let replacement = updated.clone();
                self.state.send_modify(|state| {
                    match state.items.iter_mut().find(|item| item.id() == id) {
                        Some(slot) => *slot = replacement,
                        None => debug!(
                            "Updated {} {} is not in the collection",
                            T::resource_name(),
                            id
                        ),
                    }
                    state.is_loading = false;
                });
                self.notifier
                    .notify(&self.messages.update_succeeded, NotificationKind::Success);
                Ok(Some(updated))
            }
            Err(e) => {
                self.fail(&e, &self.messages.update_failed);
                Err(e)
            }
        }
    }

    /// Delete a resource and remove it from the collection.
    ///
    /// Does nothing when no delete operation is bound.
    ///
    /// # Errors
    ///
    /// Returns the operation's error after recording and notifying it.
    pub async fn delete_item(&self, id: EntityId) -> Result<()> {
        let Some(delete) = self.repository.delete_op() else {
            debug!("No delete operation bound for {}", T::resource_name());
            return Ok(());
        };

        self.begin();
        match delete(id).await {
            Ok(()) => {
                info!("Deleted {} {}", T::resource_name(), id);
                self.state.send_modify(|state| {
                    state.items.retain(|item| item.id() != id);
                    state.is_loading = false;
                });
                self.notifier
                    .notify(&self.messages.delete_succeeded, NotificationKind::Success);
                Ok(())
            }
            Err(e) => {
                self.fail(&e, &self.messages.delete_failed);
                Err(e)
            }
        }
    }

    fn begin(&self) {
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error_message = None;
        });
    }

    /// Record the normalized message and notify it once.
    fn fail(&self, error: &Error, default: &str) {
        let message = error.user_message(default);
        error!(
            "{} operation failed: {} ({})",
            T::resource_name(),
            message,
            error
        );

        let inline = message.clone();
        self.state.send_modify(|state| {
            state.error_message = Some(inline);
            state.is_loading = false;
        });
        self.notifier.notify(&message, NotificationKind::Error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Notifier;
    use crate::repository::{InMemoryRepository, Materialize};
    use serde::{Deserialize, Serialize};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u64,
        name: String,
    }

    impl Resource for Item {
        type Draft = String;
        type Patch = String;

        fn id(&self) -> EntityId {
            self.id
        }

        fn resource_name() -> &'static str {
            "item"
        }
    }

    impl Materialize for Item {
        fn from_draft(id: EntityId, draft: String) -> Self {
            Item { id, name: draft }
        }

        fn apply_patch(&self, patch: String) -> Self {
            Item {
                id: self.id,
                name: patch,
            }
        }
    }

    fn item(id: u64, name: &str) -> Item {
        Item {
            id,
            name: name.to_string(),
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<(String, NotificationKind)>>,
    }

    impl RecordingNotifier {
        fn seen(&self) -> Vec<(String, NotificationKind)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str, kind: NotificationKind) {
            self.seen.lock().unwrap().push((message.to_string(), kind));
        }
    }

    fn setup(items: Vec<Item>) -> (
        ResourceController<Item>,
        InMemoryRepository<Item>,
        Arc<RecordingNotifier>,
    ) {
        let repo = InMemoryRepository::with_items(items);
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = ResourceController::new(repo.bindings(), notifier.clone());
        (controller, repo, notifier)
    }

    #[tokio::test]
    async fn test_fetch_all_replaces_collection() {
        let (controller, repo, notifier) = setup(vec![item(1, "a"), item(2, "b")]);
        let controller = controller.with_items(vec![item(9, "old")]);

        controller.fetch_all().await;

        let state = controller.state();
        assert_eq!(state.items, repo.items());
        assert!(!state.is_loading);
        assert_eq!(state.error_message, None);
        assert!(notifier.seen().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_failure_keeps_previous_items() {
        let (controller, repo, notifier) = setup(vec![item(1, "a")]);
        controller.fetch_all().await;

        repo.fail_with(Some(Error::status(503)));
        controller.fetch_all().await;

        let state = controller.state();
        assert_eq!(state.items, vec![item(1, "a")]);
        assert!(!state.is_loading);
        assert_eq!(state.error_message.as_deref(), Some("Server connection error"));
        assert_eq!(
            notifier.seen(),
            vec![("Server connection error".to_string(), NotificationKind::Error)]
        );
    }

    #[tokio::test]
    async fn test_create_appends_once_at_end() {
        let (controller, _repo, notifier) = setup(vec![item(1, "a"), item(2, "b")]);
        controller.fetch_all().await;

        let created = controller
            .create_item("c".to_string())
            .await
            .expect("create succeeds")
            .expect("create is bound");

        let items = controller.items();
        assert_eq!(items.len(), 3);
        assert_eq!(items.last(), Some(&created));
        assert_eq!(items.iter().filter(|i| i.id == created.id).count(), 1);
        assert_eq!(
            notifier.seen(),
            vec![(
                "Congratulations! The item has been added".to_string(),
                NotificationKind::Success
            )]
        );
    }

    #[tokio::test]
    async fn test_create_with_existing_id_keeps_ids_unique() {
        let repository = CrudRepository::<Item>::new()
            .with_create(|name: String| async move { Ok(Item { id: 1, name }) })
            .with_delete(|_id| async { Ok(()) });
        let controller =
            ResourceController::new(repository, Arc::new(RecordingNotifier::default()))
                .with_items(vec![item(1, "a"), item(2, "b")]);

        controller.create_item("x".to_string()).await.expect("first create");
        controller.create_item("y".to_string()).await.expect("second create");

        assert_eq!(controller.items(), vec![item(2, "b"), item(1, "y")]);

        controller.delete_item(1).await.expect("delete");
        assert_eq!(controller.items(), vec![item(2, "b")]);
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let (controller, _repo, _notifier) =
            setup(vec![item(1, "a"), item(2, "b"), item(3, "c")]);
        controller.fetch_all().await;

        let updated = controller
            .update_item(2, "B".to_string())
            .await
            .expect("update succeeds");

        assert_eq!(updated, Some(item(2, "B")));
        assert_eq!(
            controller.items(),
            vec![item(1, "a"), item(2, "B"), item(3, "c")]
        );
    }

    #[tokio::test]
    async fn test_update_of_unlisted_item_does_not_append() {
        let repo = CrudRepository::<Item>::new()
            .with_update(|id, name| async move { Ok(Item { id, name }) });
        let controller = ResourceController::new(repo, Arc::new(RecordingNotifier::default()))
            .with_items(vec![item(1, "a")]);

        let updated = controller
            .update_item(42, "ghost".to_string())
            .await
            .expect("update succeeds");

        assert_eq!(updated, Some(item(42, "ghost")));
        assert_eq!(controller.items(), vec![item(1, "a")]);
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one() {
        let (controller, _repo, notifier) = setup(vec![item(1, "a"), item(2, "b")]);
        controller.fetch_all().await;

        controller.delete_item(1).await.expect("delete succeeds");

        assert_eq!(controller.items(), vec![item(2, "b")]);
        assert_eq!(
            notifier.seen()[0].0,
            "Congratulations! The item has been deleted"
        );
    }

    #[tokio::test]
    async fn test_unbound_delete_is_noop() {
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = ResourceController::new(
            CrudRepository::<Item>::new().with_list(|| async { Ok(Vec::new()) }),
            notifier.clone(),
        )
        .with_items(vec![item(1, "a"), item(2, "b")]);
        let before = controller.state();

        controller.delete_item(99).await.expect("no error");
        assert_eq!(controller.create_item("x".into()).await, Ok(None));
        assert_eq!(controller.update_item(1, "x".into()).await, Ok(None));

        assert_eq!(controller.state(), before);
        assert!(notifier.seen().is_empty());
    }

    #[tokio::test]
    async fn test_create_while_offline_rejects() {
        let (controller, repo, notifier) = setup(vec![item(1, "a")]);
        controller.fetch_all().await;

        repo.fail_with(Some(Error::network("Network request failed")));
        let err = controller
            .create_item("c".to_string())
            .await
            .expect_err("create rejects");

        assert_eq!(err, Error::network("Network request failed"));
        assert_eq!(controller.items(), vec![item(1, "a")]);
        assert_eq!(
            controller.error_message().as_deref(),
            Some("Network request failed")
        );
        assert_eq!(
            notifier.seen(),
            vec![("Network request failed".to_string(), NotificationKind::Error)]
        );
    }

    #[tokio::test]
    async fn test_failure_without_message_uses_default() {
        let (controller, repo, notifier) = setup(vec![item(1, "a")]);

        repo.fail_with(Some(Error::Other(String::new())));
        controller.delete_item(1).await.expect_err("delete rejects");

        assert_eq!(
            controller.error_message().as_deref(),
            Some("Failed to delete the item")
        );
        assert_eq!(notifier.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_next_operation_clears_error() {
        let (controller, repo, _notifier) = setup(vec![item(1, "a")]);

        repo.fail_with(Some(Error::status(404)));
        controller.fetch_all().await;
        assert!(controller.error_message().is_some());

        repo.fail_with(None);
        controller.fetch_all().await;
        assert_eq!(controller.error_message(), None);
    }

    #[tokio::test]
    async fn test_custom_messages() {
        let (controller, _repo, notifier) = setup(Vec::new());
        let controller = controller.with_messages(Messages {
            create_succeeded: "Saved".to_string(),
            ..Messages::default()
        });

        controller.create_item("x".to_string()).await.expect("create");
        assert_eq!(notifier.seen()[0].0, "Saved");
    }

    #[tokio::test]
    async fn test_subscribers_observe_loading_flag() {
        let (controller, _repo, _notifier) = setup(vec![item(1, "a")]);
        let mut rx = controller.subscribe();

        controller.fetch_all().await;

        assert!(rx.has_changed().expect("sender alive"));
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.items, vec![item(1, "a")]);
        assert!(!state.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_follows_resolution_order() {
        let repo = CrudRepository::<Item>::new()
            .with_create(|name| async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(Item { id: 3, name })
            })
            .with_delete(|_id| async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(())
            });
        let controller = Arc::new(
            ResourceController::new(repo, Arc::new(RecordingNotifier::default()))
                .with_items(vec![item(1, "a"), item(2, "b")]),
        );

        let slow = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.create_item("c".to_string()).await })
        };
        let fast = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.delete_item(1).await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        // Delete has landed, create is still in flight but the flag reflects the delete
        assert_eq!(controller.items(), vec![item(2, "b")]);
        assert!(!controller.is_loading());

        fast.await.expect("join").expect("delete");
        slow.await.expect("join").expect("create");
        assert_eq!(controller.items(), vec![item(2, "b"), item(3, "c")]);
    }
}
