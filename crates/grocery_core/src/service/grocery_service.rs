//! Service root: owned state, persistence and the shared error type.
//!
//! # Responsibility
//! - Hold `GroceryState` and the repository it is persisted through.
//! - Apply every mutation to a working copy and swap it in after save.
//! - Expose read-only views (active store, visible items).
//!
//! # Invariants
//! - `state` always equals the last successfully persisted state.
//! - `hide_completed` is view state only and never persisted.

use crate::model::state::{GroceryState, ItemSections};
use crate::model::store::{Item, Store};
use crate::repo::kv_repo::RepoError;
use crate::repo::state_repo::{LoadReport, StateRepository};
use crate::service::paste_service::PromptToken;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors reported to the user by grocery operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Name is blank after trim.
    EmptyName,
    /// Section name already used in the active store.
    DuplicateSection(String),
    /// Section is not part of the active store.
    SectionNotFound(String),
    /// The only remaining store cannot be deleted.
    LastStore,
    /// Position does not address an existing entry.
    IndexOutOfRange {
        target: &'static str,
        index: usize,
        len: usize,
    },
    /// Answer does not match the outstanding section prompt.
    StalePrompt(PromptToken),
    /// Paste batch still has unresolved lines.
    ImportIncomplete { remaining: usize },
    /// Persistence failure.
    Repo(RepoError),
}

impl ServiceError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyName => "empty_name",
            Self::DuplicateSection(_) => "duplicate_section",
            Self::SectionNotFound(_) => "section_not_found",
            Self::LastStore => "last_store",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::StalePrompt(_) => "stale_prompt",
            Self::ImportIncomplete { .. } => "import_incomplete",
            Self::Repo(_) => "repo_error",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::DuplicateSection(name) => write!(f, "section `{name}` already exists"),
            Self::SectionNotFound(name) => write!(
                f,
                "section `{name}` not found; choose one of the existing sections"
            ),
            Self::LastStore => write!(f, "cannot delete the last remaining store"),
            Self::IndexOutOfRange { target, index, len } => {
                write!(f, "{target} index {index} out of range (have {len})")
            }
            Self::StalePrompt(token) => write!(f, "no outstanding section prompt {token}"),
            Self::ImportIncomplete { remaining } => {
                write!(f, "paste import has {remaining} unresolved line(s)")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Grocery list facade owning the application state.
pub struct GroceryService<R: StateRepository> {
    repo: R,
    state: GroceryState,
    hide_completed: bool,
}

impl<R: StateRepository> GroceryService<R> {
    /// Loads state and writes back the normalized/migrated form.
    pub fn open(repo: R) -> ServiceResult<(Self, LoadReport)> {
        let (mut state, report) = repo.load_state()?;
        state.active_store_mut().sort_items();
        repo.save_state(&state)?;
        let service = Self {
            repo,
            state,
            hide_completed: false,
        };
        Ok((service, report))
    }

    /// Whole committed state.
    pub fn state(&self) -> &GroceryState {
        &self.state
    }

    /// Repository the state is persisted through.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn stores(&self) -> &[Store] {
        &self.state.stores
    }

    pub fn current_store_index(&self) -> usize {
        self.state.current_store_index
    }

    pub fn active_store(&self) -> &Store {
        self.state.active_store()
    }

    pub fn item_sections(&self) -> &ItemSections {
        &self.state.item_sections
    }

    pub fn hide_completed(&self) -> bool {
        self.hide_completed
    }

    pub fn set_hide_completed(&mut self, hide: bool) {
        self.hide_completed = hide;
    }

    /// Items of the active store in display order, paired with the index
    /// every item operation expects. Completed items are skipped while
    /// `hide_completed` is set.
    pub fn visible_items(&self) -> Vec<(usize, &Item)> {
        self.active_store()
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| !(self.hide_completed && item.completed))
            .collect()
    }

    /// Runs `apply` on a working copy and commits it when it succeeds.
    pub(crate) fn commit<T>(
        &mut self,
        event: &'static str,
        apply: impl FnOnce(&mut GroceryState) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let mut working = self.state.clone();
        let outcome = match apply(&mut working) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    "event={event} module=service status=rejected error_code={}",
                    err.code()
                );
                return Err(err);
            }
        };
        self.commit_state(event, working)?;
        Ok(outcome)
    }

    /// Sorts and persists a fully prepared state, then adopts it.
    pub(crate) fn commit_state(
        &mut self,
        event: &'static str,
        mut working: GroceryState,
    ) -> ServiceResult<()> {
        working.active_store_mut().sort_items();
        if let Err(err) = self.repo.save_state(&working) {
            error!("event={event} module=service status=error error_code=save_failed error={err}");
            return Err(err.into());
        }
        self.state = working;
        info!(
            "event={event} module=service status=ok store_index={} stores={} items={}",
            self.state.current_store_index,
            self.state.stores.len(),
            self.state.active_store().items.len()
        );
        Ok(())
    }

    /// Logs and returns a validation rejection raised before commit.
    pub(crate) fn reject<T>(&self, event: &'static str, err: ServiceError) -> ServiceResult<T> {
        warn!(
            "event={event} module=service status=rejected error_code={}",
            err.code()
        );
        Err(err)
    }
}

/// Checks that `index` addresses one of `len` entries.
pub(crate) fn check_index(target: &'static str, index: usize, len: usize) -> ServiceResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(ServiceError::IndexOutOfRange { target, index, len })
    }
}

/// Trims a user-entered name, returning `None` when nothing is left.
pub(crate) fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{check_index, normalize_name, ServiceError};

    #[test]
    fn normalize_name_trims_and_rejects_blank() {
        assert_eq!(normalize_name("  Dairy "), Some("Dairy".to_string()));
        assert_eq!(normalize_name(" \t"), None);
    }

    #[test]
    fn check_index_reports_bounds() {
        assert!(check_index("item", 0, 1).is_ok());
        let err = check_index("item", 3, 2).expect_err("out of range");
        assert!(matches!(
            err,
            ServiceError::IndexOutOfRange {
                target: "item",
                index: 3,
                len: 2
            }
        ));
        assert_eq!(err.to_string(), "item index 3 out of range (have 2)");
    }
}
