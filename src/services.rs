//! Resource services over the JSON API.
//!
//! Reads go through the [`CacheExpander`] under the canonical cache keys;
//! writes hit the API directly and drop the cached entries they make stale.

use crate::api::{endpoints, ApiClient};
use crate::backend::StorageBackend;
use crate::config::Settings;
use crate::connectivity::ConnectivityMonitor;
use crate::entity::EntityId;
use crate::error::Result;
use crate::expander::{CacheExpander, OperationConfig};
use crate::key::CacheKeyBuilder;
use crate::models::{Comment, Post, User, UserDraft, UserPatch};
use crate::observability::TtlPolicy;
use crate::repository::CrudRepository;
use crate::store::CacheStore;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Cached `GET path`, stored under `key`.
async fn cached_get<B, T>(
    api: &ApiClient,
    cache: &CacheExpander<B>,
    key: &str,
    path: String,
    config: OperationConfig,
) -> Result<T>
where
    B: StorageBackend,
    T: Serialize + DeserializeOwned + Send + 'static,
{
    let api = api.clone();
    cache
        .with_cache(key, move || async move { api.get::<T>(&path).await }, config)
        .await
}

/// Users: cached reads, direct writes.
#[derive(Clone)]
pub struct UserService<B: StorageBackend> {
    api: ApiClient,
    cache: CacheExpander<B>,
}

impl<B: StorageBackend> UserService<B> {
    pub fn new(api: ApiClient, cache: CacheExpander<B>) -> Self {
        UserService { api, cache }
    }

    /// All users, cached under `users`.
    pub async fn get_all(&self, config: OperationConfig) -> Result<Vec<User>> {
        cached_get(
            &self.api,
            &self.cache,
            &CacheKeyBuilder::collection::<User>(),
            endpoints::USERS.to_string(),
            config,
        )
        .await
    }

    /// One user, cached under `user_{id}`.
    pub async fn get_by_id(&self, id: EntityId, config: OperationConfig) -> Result<User> {
        cached_get(
            &self.api,
            &self.cache,
            &CacheKeyBuilder::item::<User>(id),
            endpoints::user(id),
            config,
        )
        .await
    }

    /// Create a user. A successful write drops the cached `users` list.
    pub async fn create(&self, draft: &UserDraft) -> Result<User> {
        let created: User = self.api.post(endpoints::USERS, draft).await?;
        self.invalidate(None);
        Ok(created)
    }

    /// Update a user. A successful write drops `users` and `user_{id}`.
    pub async fn update(&self, id: EntityId, patch: &UserPatch) -> Result<User> {
        let updated: User = self.api.put(&endpoints::user(id), patch).await?;
        self.invalidate(Some(id));
        Ok(updated)
    }

    /// Delete a user. A successful write drops `users` and `user_{id}`.
    pub async fn delete(&self, id: EntityId) -> Result<()> {
        self.api.delete(&endpoints::user(id)).await?;
        self.invalidate(Some(id));
        Ok(())
    }

    fn invalidate(&self, id: Option<EntityId>) {
        let store = self.cache.store();
        store.remove(&CacheKeyBuilder::collection::<User>());
        if let Some(id) = id {
            store.remove(&CacheKeyBuilder::item::<User>(id));
        }
        debug!("Invalidated cached users after write");
    }

    /// All four operations bound for a [`ResourceController`](crate::ResourceController).
    ///
    /// `list` goes through the cache with the default configuration.
    pub fn bindings(&self) -> CrudRepository<User> {
        let list = self.clone();
        let create = self.clone();
        let update = self.clone();
        let delete = self.clone();

        CrudRepository::new()
            .with_list(move || {
                let service = list.clone();
                async move { service.get_all(OperationConfig::default()).await }
            })
            .with_create(move |draft| {
                let service = create.clone();
                async move { service.create(&draft).await }
            })
            .with_update(move |id, patch| {
                let service = update.clone();
                async move { service.update(id, &patch).await }
            })
            .with_delete(move |id| {
                let service = delete.clone();
                async move { service.delete(id).await }
            })
    }
}

/// Posts, read per user.
#[derive(Clone)]
pub struct PostService<B: StorageBackend> {
    api: ApiClient,
    cache: CacheExpander<B>,
}

impl<B: StorageBackend> PostService<B> {
    pub fn new(api: ApiClient, cache: CacheExpander<B>) -> Self {
        PostService { api, cache }
    }

    /// Posts written by `user_id`, cached under `posts_user_{id}`.
    pub async fn get_by_user_id(
        &self,
        user_id: EntityId,
        config: OperationConfig,
    ) -> Result<Vec<Post>> {
        cached_get(
            &self.api,
            &self.cache,
            &CacheKeyBuilder::children::<Post, User>(user_id),
            endpoints::posts_by_user(user_id),
            config,
        )
        .await
    }

    /// Read-only bindings listing the posts of `user_id`.
    pub fn bindings_for_user(&self, user_id: EntityId) -> CrudRepository<Post> {
        let service = self.clone();
        CrudRepository::new().with_list(move || {
            let service = service.clone();
            async move {
                service
                    .get_by_user_id(user_id, OperationConfig::default())
                    .await
            }
        })
    }
}

/// Comments, read per post.
#[derive(Clone)]
pub struct CommentService<B: StorageBackend> {
    api: ApiClient,
    cache: CacheExpander<B>,
}

impl<B: StorageBackend> CommentService<B> {
    pub fn new(api: ApiClient, cache: CacheExpander<B>) -> Self {
        CommentService { api, cache }
    }

    /// Comments on `post_id`, cached under `comments_post_{id}`.
    pub async fn get_by_post_id(
        &self,
        post_id: EntityId,
        config: OperationConfig,
    ) -> Result<Vec<Comment>> {
        cached_get(
            &self.api,
            &self.cache,
            &CacheKeyBuilder::children::<Comment, Post>(post_id),
            endpoints::comments_by_post(post_id),
            config,
        )
        .await
    }

    /// Read-only bindings listing the comments of `post_id`.
    pub fn bindings_for_post(&self, post_id: EntityId) -> CrudRepository<Comment> {
        let service = self.clone();
        CrudRepository::new().with_list(move || {
            let service = service.clone();
            async move {
                service
                    .get_by_post_id(post_id, OperationConfig::default())
                    .await
            }
        })
    }
}

/// The three services over one API client and one cache.
#[derive(Clone)]
pub struct Services<B: StorageBackend> {
    pub users: UserService<B>,
    pub posts: PostService<B>,
    pub comments: CommentService<B>,
}

impl<B: StorageBackend> Services<B> {
    pub fn new(api: ApiClient, cache: CacheExpander<B>) -> Self {
        Services {
            users: UserService::new(api.clone(), cache.clone()),
            posts: PostService::new(api.clone(), cache.clone()),
            comments: CommentService::new(api, cache),
        }
    }

    /// HTTP services over `backend`, using the settings' base URL, key prefix and TTL.
    pub fn from_settings(
        settings: &Settings,
        backend: B,
        connectivity: ConnectivityMonitor,
    ) -> Result<Self> {
        let api = ApiClient::from_settings(settings)?;
        let store = CacheStore::new(backend)
            .with_prefix(&settings.cache_prefix)
            .with_default_ttl(settings.default_ttl());
        let cache = CacheExpander::new(store, connectivity)
            .with_ttl_policy(TtlPolicy::Fixed(settings.default_ttl()));
        Ok(Self::new(api, cache))
    }
}
