pub mod medium;
pub mod repositories;
pub mod store;

use catalog_core::config::AppConfig;

pub use medium::{CatalogMedium, FileMedium, InMemoryMedium};
pub use repositories::{
    CatalogProductRepository, FileProductRepository, InMemoryProductRepository,
    ProductRepository, RepositoryError,
};
pub use store::{CatalogSession, CatalogStore, StoreError};

/// Opens the file-backed repository described by `config`.
///
/// Nothing touches the disk until the first operation; a missing file is an
/// empty catalog.
pub fn open_catalog(config: &AppConfig) -> FileProductRepository {
    let store = CatalogStore::new(FileMedium::new(&config.storage.catalog_path));
    CatalogProductRepository::new(store).with_duplicate_ids(config.catalog.duplicate_ids)
}
