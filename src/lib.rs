//! Catalog back end for a small storefront: categories, products, their
//! images, the homepage carousel and the store's contact settings.

use std::sync::Arc;

use actix_web::web;

pub mod auth;
pub mod config;
pub mod contact;
pub mod db;
pub mod error;
pub mod images;
pub mod models;
pub mod routes;
pub mod seed;
pub mod storage;

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::images::ImageHost;
use crate::storage::{Storage, StorageResult};

/// Shared by every worker; cloned per request through `web::Data`.
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub images: Arc<dyn ImageHost>,
    pub auth: AuthConfig,
    pub max_upload_bytes: usize,
}

/// Runs a storage call on the blocking thread pool.
pub async fn blocking<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn Storage) -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    let storage = Arc::clone(&state.storage);
    Ok(web::block(move || call(storage.as_ref())).await??)
}
