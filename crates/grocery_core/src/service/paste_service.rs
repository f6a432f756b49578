//! Bulk paste import with interactive section prompts.
//!
//! # Responsibility
//! - Turn pasted text into incomplete items for the active store.
//! - Resolve each item's section from the `itemSections` cache, or ask
//!   the caller through an explicit request/response exchange.
//!
//! # Invariants
//! - At most one section request is outstanding; lines are processed in
//!   input order.
//! - The batch touches committed state only in `commit`, once every line
//!   is resolved. Dropping a `PasteImport` discards it.
//! - A cancelled prompt resolves to `FALLBACK_SECTION`; it never aborts
//!   the batch.

use crate::model::state::GroceryState;
use crate::model::store::{Item, FALLBACK_SECTION};
use crate::repo::state_repo::StateRepository;
use crate::service::grocery_service::{GroceryService, ServiceError, ServiceResult};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};

static LIST_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:[-*+•]|\d+[.)])\s*)?(?:\[[ xX]?\]\s*)?").expect("valid list marker regex")
});

/// Identifies one outstanding section request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptToken(u64);

impl Display for PromptToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Section choice the importer is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRequest {
    pub token: PromptToken,
    pub item_name: String,
    /// Active store's sections, including any added earlier in the batch.
    pub choices: Vec<String>,
    /// Cached section that no longer exists in the active store.
    pub stale_section: Option<String>,
}

/// Next thing the importer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStep {
    NeedsSection(SectionRequest),
    /// Every line is resolved; `commit` may be called.
    Ready,
}

/// Summary of a committed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub items_added: usize,
    /// Lines that needed a section prompt.
    pub prompted: usize,
    /// Sections appended to the active store during the batch.
    pub sections_added: Vec<String>,
}

/// One in-flight paste batch.
///
/// Holds the service mutably, so nothing else can change state until the
/// batch is committed or dropped.
pub struct PasteImport<'svc, R: StateRepository> {
    service: &'svc mut GroceryService<R>,
    working: GroceryState,
    lines: VecDeque<String>,
    pending: Option<SectionRequest>,
    next_token: u64,
    report: ImportReport,
}

impl<R: StateRepository> GroceryService<R> {
    /// Starts a paste batch over newline-delimited `text`.
    pub fn begin_paste(&mut self, text: &str) -> PasteImport<'_, R> {
        let lines = text.lines().filter_map(normalize_paste_line).collect();
        let working = self.state().clone();
        PasteImport {
            service: self,
            working,
            lines,
            pending: None,
            next_token: 0,
            report: ImportReport::default(),
        }
    }
}

impl<R: StateRepository> PasteImport<'_, R> {
    /// Lines not yet turned into items, including the one being prompted.
    pub fn remaining(&self) -> usize {
        self.lines.len() + usize::from(self.pending.is_some())
    }

    /// Advances through cached lines until a prompt is needed or all
    /// lines are resolved. Repeats the outstanding request if there is one.
    pub fn next_step(&mut self) -> ImportStep {
        if let Some(pending) = &self.pending {
            return ImportStep::NeedsSection(pending.clone());
        }

        while let Some(name) = self.lines.pop_front() {
            let store = self.working.active_store();
            let cached = self.working.item_sections.get(&name);
            if let Some(section) = cached.filter(|section| store.has_section(section)) {
                let item = Item::new(name, section.clone());
                self.working.active_store_mut().items.push(item);
                self.report.items_added += 1;
                continue;
            }

            let request = SectionRequest {
                token: PromptToken(self.next_token),
                item_name: name,
                choices: store.sections.clone(),
                stale_section: cached.cloned(),
            };
            self.next_token += 1;
            self.pending = Some(request.clone());
            return ImportStep::NeedsSection(request);
        }

        ImportStep::Ready
    }

    /// Answers the outstanding request. `None` or a blank choice means the
    /// user dismissed the prompt.
    pub fn resolve(&mut self, token: PromptToken, choice: Option<&str>) -> ServiceResult<()> {
        let request = match self.pending.take() {
            Some(request) if request.token == token => request,
            other => {
                self.pending = other;
                return Err(ServiceError::StalePrompt(token));
            }
        };

        let section = choice
            .map(str::trim)
            .filter(|choice| !choice.is_empty())
            .unwrap_or(FALLBACK_SECTION)
            .to_string();

        self.working
            .item_sections
            .insert(request.item_name.clone(), section.clone());

        let store = self.working.active_store_mut();
        if !store.has_section(&section) {
            store.sections.push(section.clone());
            self.report.sections_added.push(section.clone());
        }
        store.items.push(Item::new(request.item_name, section));

        self.report.prompted += 1;
        self.report.items_added += 1;
        Ok(())
    }

    /// Drives the batch to completion, asking `choose` for every unknown
    /// item, then commits.
    pub fn run_with(
        mut self,
        mut choose: impl FnMut(&SectionRequest) -> Option<String>,
    ) -> ServiceResult<ImportReport> {
        while let ImportStep::NeedsSection(request) = self.next_step() {
            let choice = choose(&request);
            self.resolve(request.token, choice.as_deref())?;
        }
        self.commit()
    }

    /// Persists the batch as one save.
    ///
    /// # Errors
    /// - `ImportIncomplete` while lines are unresolved.
    pub fn commit(self) -> ServiceResult<ImportReport> {
        let remaining = self.remaining();
        if remaining > 0 {
            return self
                .service
                .reject("paste_import", ServiceError::ImportIncomplete { remaining });
        }
        if self.report.items_added > 0 {
            self.service.commit_state("paste_import", self.working)?;
        }
        info!(
            "event=paste_import module=service status=ok items_added={} prompted={} sections_added={}",
            self.report.items_added,
            self.report.prompted,
            self.report.sections_added.len()
        );
        Ok(self.report)
    }
}

/// Cleans one pasted line into an item name.
///
/// Trims, strips a leading list marker or checkbox (`- [ ] `, `* `, `1. `)
/// and capitalizes the first character. Returns `None` for lines that end
/// up empty.
pub fn normalize_paste_line(line: &str) -> Option<String> {
    let stripped = LIST_MARKER_RE.replace(line.trim(), "");
    let name = stripped.trim();
    let mut chars = name.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

#[cfg(test)]
mod tests {
    use super::normalize_paste_line;

    #[test]
    fn strips_markers_and_capitalizes() {
        assert_eq!(normalize_paste_line("- [ ] milk").as_deref(), Some("Milk"));
        assert_eq!(normalize_paste_line("* [x] eggs").as_deref(), Some("Eggs"));
        assert_eq!(normalize_paste_line("  2. bread  ").as_deref(), Some("Bread"));
        assert_eq!(normalize_paste_line("• apples").as_deref(), Some("Apples"));
        assert_eq!(normalize_paste_line("Ice Cream").as_deref(), Some("Ice Cream"));
    }

    #[test]
    fn blank_and_marker_only_lines_are_skipped() {
        assert_eq!(normalize_paste_line("   "), None);
        assert_eq!(normalize_paste_line("- [ ]"), None);
    }

    #[test]
    fn capitalizes_non_ascii_first_letter() {
        assert_eq!(normalize_paste_line("éclairs").as_deref(), Some("Éclairs"));
    }
}
