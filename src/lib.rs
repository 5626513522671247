//! # crud-kit
//!
//! Offline-first resource caching and CRUD state management for JSON APIs.
//!
//! ## Features
//!
//! - **Stale-While-Revalidate:** Serve fresh cached data at once and refresh it in the background
//! - **Offline Aware:** Cached data, even expired, is served without a fetch while offline
//! - **Degraded Reads:** A failed fetch falls back to whatever is cached
//! - **Generic Controllers:** One list/create/update/delete lifecycle for any [`Resource`]
//! - **Pluggable Storage:** In-memory and file backends behind [`StorageBackend`](backend::StorageBackend)
//! - **Explicit Contexts:** Connectivity and notifications are objects you construct and share
//!
//! ## Quick Start
//!
//! ### Cached reads
//!
//! ```ignore
//! use crud_kit::{
//!     backend::InMemoryBackend, CacheExpander, CacheStore, ConnectivityMonitor, OperationConfig,
//! };
//!
//! let connectivity = ConnectivityMonitor::new();
//! let cache = CacheExpander::new(CacheStore::new(InMemoryBackend::new()), connectivity.clone());
//!
//! // Fresh entry: returned immediately, refreshed in the background
//! let users: Vec<User> = cache
//!     .with_cache("users", || fetch_users(), OperationConfig::default())
//!     .await?;
//!
//! // Pull-to-refresh: always fetch, fall back to the cache on failure
//! let users: Vec<User> = cache
//!     .with_cache("users", || fetch_users(), OperationConfig::default().force_refresh())
//!     .await?;
//! ```
//!
//! ### Resource controllers
//!
//! ```ignore
//! use crud_kit::{api::ApiClient, services::Services, NotificationCenter, ResourceController};
//! use std::sync::Arc;
//!
//! let services = Services::new(ApiClient::from_settings(&settings)?, cache);
//! let notifications = NotificationCenter::new();
//! let users = ResourceController::new(services.users.bindings(), Arc::new(notifications.clone()));
//!
//! users.fetch_all().await;
//! users.create_item(draft).await?;
//! println!("{} users, error: {:?}", users.items().len(), users.error_message());
//! ```

#[macro_use]
extern crate log;

pub mod api;
pub mod backend;
pub mod clock;
pub mod config;
pub mod connectivity;
pub mod controller;
pub mod entity;
pub mod error;
pub mod expander;
pub mod key;
pub mod models;
pub mod notification;
pub mod observability;
pub mod repository;
pub mod serialization;
pub mod services;
pub mod store;
pub mod strategy;

// Re-exports for convenience
pub use config::Settings;
pub use connectivity::ConnectivityMonitor;
pub use controller::{ResourceController, ResourceState};
pub use entity::{EntityId, Resource};
pub use error::{Error, Result};
pub use expander::{CacheExpander, OperationConfig};
pub use notification::{NotificationCenter, NotificationKind, Notifier};
pub use repository::CrudRepository;
pub use store::CacheStore;
pub use strategy::{CacheStrategy, Resolution};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
