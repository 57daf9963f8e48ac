//! The single owner of the durable catalog.
//!
//! Reads take the shared side of a reader/writer gate for the duration of one
//! load. Mutations take the exclusive side through [`CatalogStore::lock`] and
//! keep it until the returned [`CatalogSession`] is saved or dropped, so every
//! load→mutate→save sequence runs alone.

use std::io;
use std::sync::Arc;

use catalog_core::codec::{self, CodecError};
use catalog_core::domain::catalog::Catalog;
use catalog_core::errors::ErrorKind;
use thiserror::Error;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, info};

use crate::medium::CatalogMedium;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog storage `{target}` is unavailable: {source}")]
    Unavailable { target: String, source: io::Error },
    #[error("catalog storage `{target}` holds corrupt data: {source}")]
    Corrupt { target: String, source: CodecError },
    #[error("catalog could not be encoded for `{target}`: {source}")]
    Encode { target: String, source: CodecError },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable { .. } | Self::Encode { .. } => ErrorKind::StorageUnavailable,
            Self::Corrupt { .. } => ErrorKind::CorruptData,
        }
    }
}

pub struct CatalogStore<M> {
    medium: Arc<M>,
    gate: Arc<RwLock<()>>,
}

impl<M> CatalogStore<M>
where
    M: CatalogMedium + 'static,
{
    pub fn new(medium: M) -> Self {
        Self { medium: Arc::new(medium), gate: Arc::new(RwLock::new(())) }
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// A snapshot of the catalog as of the last completed save.
    pub async fn load(&self) -> Result<Catalog, StoreError> {
        let _shared = self.gate.read().await;
        read_catalog(self.medium.as_ref()).await
    }

    /// Enters the critical section and loads the catalog inside it.
    ///
    /// Other sessions and snapshots wait until the returned session is saved
    /// or dropped.
    pub async fn lock(&self) -> Result<CatalogSession<M>, StoreError> {
        let guard = Arc::clone(&self.gate).write_owned().await;
        let catalog = read_catalog(self.medium.as_ref()).await?;
        Ok(CatalogSession { guard, medium: Arc::clone(&self.medium), catalog })
    }

    /// Replaces the whole stored catalog without reading it first.
    pub async fn save(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let guard = Arc::clone(&self.gate).write_owned().await;
        persist(guard, Arc::clone(&self.medium), catalog).await
    }
}

/// Exclusive access to the catalog for one mutation.
pub struct CatalogSession<M> {
    guard: OwnedRwLockWriteGuard<()>,
    medium: Arc<M>,
    catalog: Catalog,
}

impl<M> CatalogSession<M>
where
    M: CatalogMedium + 'static,
{
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub async fn save(self) -> Result<(), StoreError> {
        let Self { guard, medium, catalog } = self;
        persist(guard, medium, &catalog).await
    }
}

async fn read_catalog<M: CatalogMedium>(medium: &M) -> Result<Catalog, StoreError> {
    let bytes = medium
        .read()
        .await
        .map_err(|source| StoreError::Unavailable { target: medium.describe(), source })?;

    let catalog = match bytes {
        Some(bytes) => codec::decode(&bytes)
            .map_err(|source| StoreError::Corrupt { target: medium.describe(), source })?,
        None => Catalog::default(),
    };

    debug!(
        event_name = "catalog.store.loaded",
        medium = %medium.describe(),
        products = catalog.len(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Writes `catalog` on a detached task that owns the write guard.
///
/// Once a write starts it runs to completion and only then releases the
/// gate, even if the caller stops waiting for it.
async fn persist<M>(
    guard: OwnedRwLockWriteGuard<()>,
    medium: Arc<M>,
    catalog: &Catalog,
) -> Result<(), StoreError>
where
    M: CatalogMedium + 'static,
{
    let target = medium.describe();
    let bytes = codec::encode(catalog)
        .map_err(|source| StoreError::Encode { target: target.clone(), source })?;
    let size = bytes.len();
    let products = catalog.len();

    let write = tokio::spawn(async move {
        let result = medium.replace(bytes).await;
        drop(guard);
        result
    });

    let outcome = match write.await {
        Ok(result) => result,
        Err(join_error) => Err(io::Error::other(join_error)),
    };

    match outcome {
        Ok(()) => {
            info!(
                event_name = "catalog.store.saved",
                medium = %target,
                products,
                bytes = size,
                "catalog saved"
            );
            Ok(())
        }
        Err(source) => Err(StoreError::Unavailable { target, source }),
    }
}
