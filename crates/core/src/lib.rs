pub mod codec;
pub mod config;
pub mod domain;
pub mod errors;
pub mod query;
pub mod validation;

pub use codec::CodecError;
pub use config::{AppConfig, DuplicateIdPolicy};
pub use domain::catalog::Catalog;
pub use domain::product::{ActiveFlag, NewProduct, Product, ProductId, ProductPatch};
pub use errors::{ApplicationError, DomainError, ErrorKind, InterfaceError};
pub use query::{ListQuery, PageRequest, Visibility};
