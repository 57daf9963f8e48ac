use async_trait::async_trait;
use thiserror::Error;

use catalog_core::domain::product::{NewProduct, Product, ProductId, ProductPatch};
use catalog_core::errors::{ApplicationError, ErrorKind};
use catalog_core::query::ListQuery;

use crate::store::StoreError;

pub mod product;

pub use product::{CatalogProductRepository, FileProductRepository, InMemoryProductRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("product `{0}` not found")]
    NotFound(ProductId),
    #[error("product `{0}` already exists")]
    AlreadyExists(ProductId),
}

impl RepositoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(error) => error.kind(),
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
        }
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound(id) => Self::NotFound(id),
            RepositoryError::AlreadyExists(id) => Self::AlreadyExists(id),
            RepositoryError::Store(error @ StoreError::Corrupt { .. }) => {
                Self::CorruptData(error.to_string())
            }
            RepositoryError::Store(error) => Self::Persistence(error.to_string()),
        }
    }
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Appends a new record. `image_path` of `None` stores an empty path.
    async fn create(
        &self,
        product: NewProduct,
        image_path: Option<String>,
    ) -> Result<Product, RepositoryError>;

    async fn get(&self, id: &ProductId) -> Result<Product, RepositoryError>;

    async fn list(&self, query: ListQuery) -> Result<Vec<Product>, RepositoryError>;

    /// Merges the fields present in `patch` into the first record with `id`.
    async fn update(&self, id: &ProductId, patch: ProductPatch)
        -> Result<Product, RepositoryError>;

    async fn delete(&self, id: &ProductId) -> Result<Product, RepositoryError>;
}
