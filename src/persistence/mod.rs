use crate::catalog::{Catalog, CatalogError};
use polars::prelude::PolarsError;
use serde_json::Error as SerdeJsonError;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("dataframe conversion error: {0}")]
    DataFrame(#[from] PolarsError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("no catalog stored")]
    NotFound,
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Somewhere a catalog can be written after a mutation and read back at
/// startup.
pub trait CatalogStore {
    fn save_catalog(&self, catalog: &Catalog) -> PersistenceResult<()>;
    fn load_catalog(&self) -> PersistenceResult<Option<Catalog>>;
}

/// Refuse to persist a catalog whose rosters and enrollment indices disagree.
pub fn validate_catalog(catalog: &Catalog) -> PersistenceResult<()> {
    catalog.verify_consistency()?;
    Ok(())
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{FlatFileStore, load_catalog_from_json, save_catalog_to_json};
