//! Object-storage adapter for uploaded certificates.
//!
//! Uses the `object_store` crate so Azure Blob Storage and the in-memory store
//! used by tests share one code path. The contract the rest of the portal
//! relies on is a single call:
//! `put(container, blob_name, bytes, overwrite) -> Result<(), BlobError>`.
//!
//! # Azure
//!
//! Account, access key and container come from [`StorageSettings`]. An
//! `ObjectStore` is built lazily per container and cached. Timeouts from the
//! settings are applied via `ClientOptions`.
//!
//! # Injected stores
//!
//! [`BlobStore::with_object_store`] wraps an existing store; blobs are then
//! keyed `<container>/<blob_name>` inside it.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::path::Path as ObjectPath;
use object_store::{ClientOptions, ObjectStore, PutMode, PutOptions, PutPayload};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::StorageSettings;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob storage is not configured: {0} not set")]
    NotConfigured(&'static str),

    #[error("blob '{0}' already exists")]
    AlreadyExists(String),

    #[error("invalid blob name '{0}'")]
    InvalidName(String),

    #[error("object store error: {0}")]
    Store(#[from] object_store::Error),
}

/// A storage setting the upload pre-flight found missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSetting {
    Container,
    Account,
    AccessKey,
}

impl MissingSetting {
    pub fn env_var(&self) -> &'static str {
        match self {
            MissingSetting::Container => "AZURE_CONTAINER",
            MissingSetting::Account => "AZURE_STORAGE_ACCOUNT",
            MissingSetting::AccessKey => "AZURE_STORAGE_KEY",
        }
    }
}

/// The object key is the name exactly as given. `Path::from` would
/// percent-encode it and fold empty segments, so names it cannot hold
/// verbatim are refused instead.
fn literal_path(name: &str) -> Result<ObjectPath, BlobError> {
    match ObjectPath::parse(name) {
        Ok(path) if !name.is_empty() && path.as_ref() == name => Ok(path),
        _ => Err(BlobError::InvalidName(name.to_string())),
    }
}

enum Backend {
    Azure { containers: Mutex<HashMap<String, Arc<dyn ObjectStore>>> },
    Shared(Arc<dyn ObjectStore>),
}

pub struct BlobStore {
    settings: StorageSettings,
    backend: Backend,
}

impl BlobStore {
    /// Azure-backed adapter. Nothing is contacted until the first `put`.
    pub fn from_settings(settings: StorageSettings) -> Self {
        Self { settings, backend: Backend::Azure { containers: Mutex::new(HashMap::new()) } }
    }

    pub fn with_object_store(settings: StorageSettings, store: Arc<dyn ObjectStore>) -> Self {
        Self { settings, backend: Backend::Shared(store) }
    }

    pub fn settings(&self) -> &StorageSettings { &self.settings }

    /// Check configuration before any network call. Order: container,
    /// account, access key. Returns the container name on success.
    pub fn preflight(&self) -> Result<&str, MissingSetting> {
        let container = self.settings.container.as_deref().ok_or(MissingSetting::Container)?;
        if self.settings.account.is_none() {
            return Err(MissingSetting::Account);
        }
        if self.settings.access_key.is_none() {
            return Err(MissingSetting::AccessKey);
        }
        Ok(container)
    }

    /// Store `bytes` as `blob_name` in `container`. With `overwrite` an
    /// existing blob of that name is replaced.
    pub async fn put(&self, container: &str, blob_name: &str, bytes: Bytes, overwrite: bool) -> Result<(), BlobError> {
        let (store, path) = self.resolve(container, blob_name)?;
        let size = bytes.len();
        let mode = if overwrite { PutMode::Overwrite } else { PutMode::Create };
        match store.put_opts(&path, PutPayload::from(bytes), PutOptions::from(mode)).await {
            Ok(_) => {
                info!(target: "certportal::blob", container = container, blob = blob_name, size = size, "blob stored");
                Ok(())
            }
            Err(object_store::Error::AlreadyExists { .. }) => Err(BlobError::AlreadyExists(blob_name.to_string())),
            Err(e) => Err(BlobError::Store(e)),
        }
    }

    pub async fn get(&self, container: &str, blob_name: &str) -> Result<Bytes, BlobError> {
        let (store, path) = self.resolve(container, blob_name)?;
        Ok(store.get(&path).await?.bytes().await?)
    }

    fn resolve(&self, container: &str, blob_name: &str) -> Result<(Arc<dyn ObjectStore>, ObjectPath), BlobError> {
        let blob_path = literal_path(blob_name)?;
        match &self.backend {
            Backend::Shared(store) => {
                let path = literal_path(&format!("{container}/{blob_name}"))?;
                Ok((store.clone(), path))
            }
            Backend::Azure { containers } => {
                let mut cache = containers.lock();
                if let Some(store) = cache.get(container) {
                    return Ok((store.clone(), blob_path));
                }
                let store = self.build_azure(container)?;
                cache.insert(container.to_string(), store.clone());
                Ok((store, blob_path))
            }
        }
    }

    fn build_azure(&self, container: &str) -> Result<Arc<dyn ObjectStore>, BlobError> {
        let account = self.settings.account.as_deref().ok_or(BlobError::NotConfigured("AZURE_STORAGE_ACCOUNT"))?;
        let key = self.settings.access_key.as_deref().ok_or(BlobError::NotConfigured("AZURE_STORAGE_KEY"))?;
        let client_options = ClientOptions::new()
            .with_timeout(self.settings.request_timeout)
            .with_connect_timeout(self.settings.connect_timeout);
        let store = MicrosoftAzureBuilder::new()
            .with_account(account)
            .with_access_key(key)
            .with_container_name(container)
            .with_client_options(client_options)
            .build()?;
        debug!(target: "certportal::blob", "built Azure client for https://{}.blob.core.windows.net/{}", account, container);
        Ok(Arc::new(store))
    }
}
