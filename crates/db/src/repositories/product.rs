use async_trait::async_trait;
use tracing::info;

use catalog_core::config::DuplicateIdPolicy;
use catalog_core::domain::product::{NewProduct, Product, ProductId, ProductPatch};
use catalog_core::query::{self, ListQuery};

use super::{ProductRepository, RepositoryError};
use crate::medium::{CatalogMedium, FileMedium, InMemoryMedium};
use crate::store::CatalogStore;

pub type FileProductRepository = CatalogProductRepository<FileMedium>;
pub type InMemoryProductRepository = CatalogProductRepository<InMemoryMedium>;

/// Product operations over the whole-catalog store. Every mutation is one
/// critical section: load, change one slot, save.
pub struct CatalogProductRepository<M> {
    store: CatalogStore<M>,
    duplicate_ids: DuplicateIdPolicy,
}

impl<M> CatalogProductRepository<M>
where
    M: CatalogMedium + 'static,
{
    pub fn new(store: CatalogStore<M>) -> Self {
        Self { store, duplicate_ids: DuplicateIdPolicy::default() }
    }

    pub fn with_duplicate_ids(mut self, policy: DuplicateIdPolicy) -> Self {
        self.duplicate_ids = policy;
        self
    }

    pub fn store(&self) -> &CatalogStore<M> {
        &self.store
    }

    pub fn duplicate_ids(&self) -> DuplicateIdPolicy {
        self.duplicate_ids
    }
}

impl Default for InMemoryProductRepository {
    fn default() -> Self {
        Self::new(CatalogStore::new(InMemoryMedium::default()))
    }
}

#[async_trait]
impl<M> ProductRepository for CatalogProductRepository<M>
where
    M: CatalogMedium + 'static,
{
    async fn create(
        &self,
        product: NewProduct,
        image_path: Option<String>,
    ) -> Result<Product, RepositoryError> {
        let mut session = self.store.lock().await?;
        if self.duplicate_ids == DuplicateIdPolicy::Reject
            && session.catalog().contains(&product.product_id)
        {
            return Err(RepositoryError::AlreadyExists(product.product_id));
        }

        let product = product.into_product(image_path);
        session.catalog_mut().push(product.clone());
        session.save().await?;

        info!(
            event_name = "catalog.product.created",
            product_id = %product.product_id,
            has_image = product.has_image(),
            "product created"
        );
        Ok(product)
    }

    async fn get(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        let catalog = self.store.load().await?;
        catalog.find(id).cloned().ok_or_else(|| RepositoryError::NotFound(id.clone()))
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<Product>, RepositoryError> {
        let catalog = self.store.load().await?;
        Ok(query::run(catalog.products(), query))
    }

    async fn update(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product, RepositoryError> {
        let mut session = self.store.lock().await?;
        let catalog = session.catalog();
        let index = catalog.position(id).ok_or_else(|| RepositoryError::NotFound(id.clone()))?;

        if let Some(new_id) = patch.product_id.as_ref().filter(|new_id| *new_id != id) {
            if self.duplicate_ids == DuplicateIdPolicy::Reject && catalog.contains(new_id) {
                return Err(RepositoryError::AlreadyExists(new_id.clone()));
            }
        }

        let mut merged =
            catalog.get(index).cloned().ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        merged.merge(patch);
        session.catalog_mut().replace_at(index, merged.clone());
        session.save().await?;

        info!(
            event_name = "catalog.product.updated",
            product_id = %id,
            stored_as = %merged.product_id,
            "product updated"
        );
        Ok(merged)
    }

    async fn delete(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        let mut session = self.store.lock().await?;
        let index =
            session.catalog().position(id).ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        let removed = session
            .catalog_mut()
            .remove_at(index)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        session.save().await?;

        info!(
            event_name = "catalog.product.deleted",
            product_id = %id,
            "product deleted"
        );
        Ok(removed)
    }
}
