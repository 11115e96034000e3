pub mod catalog;
pub mod config;
pub mod conflict;
pub mod directory;
pub mod logging;
pub mod meeting;
pub mod persistence;
mod record_validation;
pub mod report;
pub mod roster;

#[cfg(feature = "http_api")]
pub mod http_api;

pub use catalog::{Catalog, CatalogError, EnrollmentOutcome};
pub use config::AppConfig;
pub use conflict::conflicts;
pub use directory::{Admin, EnrollmentIndex, NOT_GRADED, Professor, ProfileUpdate, Student};
pub use meeting::{MeetingPattern, PatternError};
pub use persistence::{
    CatalogStore, FlatFileStore, PersistenceError, load_catalog_from_json, save_catalog_to_json,
};
pub use roster::{CourseRoster, RosterError};

#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteCatalogStore;
