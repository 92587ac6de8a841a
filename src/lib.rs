//! Collection API: generic document-collection CRUD route groups over a pluggable document store.

pub mod config;
pub mod document;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod provision;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::{load_from_dir, resolve, CollectionKind, FullConfig, ResolvedCollection, ResolvedModel, Settings};
pub use document::{Document, DocumentBody};
pub use error::{AppError, ConfigError, StoreError};
pub use provision::{setup, teardown};
pub use response::{Envelope, ListEnvelope};
pub use routes::{app, collection_routes, common_routes, openapi_routes};
pub use state::{AppState, CollectionState};
pub use store::{ensure_database_exists, Collection, DocumentStore, MemoryStore, PgStore};
pub use service::{AttributeRule, AttributeRules};
