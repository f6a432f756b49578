//! Core domain logic for the grocery list manager.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::state::{GroceryState, ItemSections};
pub use model::store::{Item, Store, DEFAULT_SECTIONS, DEFAULT_STORE_NAME, FALLBACK_SECTION};
pub use repo::kv_repo::{
    KvRepository, KvWrite, MemoryKvRepository, RepoError, RepoResult, SqliteKvRepository,
};
pub use repo::state_repo::{JsonStateRepository, LoadReport, StateRepository};
pub use service::grocery_service::{GroceryService, ServiceError, ServiceResult};
pub use service::paste_service::{
    normalize_paste_line, ImportReport, ImportStep, PasteImport, PromptToken, SectionRequest,
};
pub use service::store_service::{SectionDeletion, SectionMove};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
