//! Ties the list, form, and bulk-operation controllers to one backend client
//! and turns every failure into a banner instead of an error value.

use std::sync::Arc;

use shared::domain::{HumanBeing, HumanBeingId};
use tracing::{info, warn};

use crate::{
    form::{FormController, FormDraft, SubmitOutcome},
    operations::{BulkOrchestrator, OperationId, OperationReport},
    pagination::{ListController, LoadOutcome},
    RecordApi,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

pub struct AdminSession {
    api: Arc<dyn RecordApi>,
    list: ListController,
    form: FormController,
    operations: BulkOrchestrator,
    notice: Option<Notice>,
}

impl AdminSession {
    pub fn new(api: Arc<dyn RecordApi>, page_size: u32) -> Self {
        Self {
            api,
            list: ListController::new(page_size),
            form: FormController::default(),
            operations: BulkOrchestrator::default(),
            notice: None,
        }
    }

    pub fn list(&self) -> &ListController {
        &self.list
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn operations(&self) -> &BulkOrchestrator {
        &self.operations
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    fn note_load(&mut self, outcome: &LoadOutcome) {
        if let LoadOutcome::Failed(message) = outcome {
            self.notice = Some(Notice::error(format!("Error loading human beings: {message}")));
        }
    }

    pub async fn go_to_page(&mut self, page: u32) -> LoadOutcome {
        let outcome = self.list.load(self.api.as_ref(), page).await;
        self.note_load(&outcome);
        outcome
    }

    pub async fn refresh(&mut self) -> LoadOutcome {
        let page = self.list.pagination().page;
        self.go_to_page(page).await
    }

    /// Applies a new search term; a changed term reloads from page 0.
    pub async fn search(&mut self, term: &str) -> Option<LoadOutcome> {
        let ticket = self.list.set_search(term)?;
        let result = self.api.list(&ticket.query).await;
        let outcome = self.list.complete_load(ticket, result);
        self.note_load(&outcome);
        Some(outcome)
    }

    pub fn open_create(&mut self) -> FormDraft {
        self.form.open_create()
    }

    pub async fn fetch(&mut self, id: HumanBeingId) -> Option<HumanBeing> {
        match self.api.get(id).await {
            Ok(record) => Some(record),
            Err(err) => {
                self.notice = Some(Notice::error(format!(
                    "Error loading human being #{id}: {}",
                    err.user_message()
                )));
                None
            }
        }
    }

    /// Fetches the latest copy of the record before editing it.
    pub async fn open_edit(&mut self, id: HumanBeingId) -> Option<FormDraft> {
        let record = self.fetch(id).await?;
        Some(self.form.open_edit(record))
    }

    pub async fn submit(&mut self, draft: &FormDraft) -> SubmitOutcome {
        let updating = self.form.editing().is_some();
        let outcome = self.form.submit(self.api.as_ref(), draft).await;
        match &outcome {
            SubmitOutcome::Saved(record) => {
                let verb = if updating { "updated" } else { "created" };
                self.notice = Some(Notice::success(format!("Human being #{} {verb}", record.id)));
                self.refresh().await;
            }
            SubmitOutcome::Failed(message) => {
                let action = if updating { "updating" } else { "creating" };
                self.notice = Some(Notice::error(format!("Error {action} human being: {message}")));
            }
            SubmitOutcome::Invalid(_) => {}
        }
        outcome
    }

    /// Deletes one record and reloads. When that empties a page past the
    /// first, moves back to what is now the last page.
    pub async fn delete(&mut self, id: HumanBeingId) -> bool {
        if let Err(err) = self.api.delete(id).await {
            self.notice = Some(Notice::error(format!(
                "Error deleting human being: {}",
                err.user_message()
            )));
            return false;
        }
        info!(%id, "record deleted");
        self.notice = Some(Notice::success(format!("Human being #{id} deleted")));
        let outcome = self.reload_after_removal().await;
        self.note_load(&outcome);
        true
    }

    /// Reloads the current page; if records were removed and the page is now
    /// empty past the first, moves back to what is now the last page.
    async fn reload_after_removal(&mut self) -> LoadOutcome {
        let outcome = self.list.reload(self.api.as_ref()).await;
        if outcome != LoadOutcome::Applied {
            return outcome;
        }
        let pagination = self.list.pagination();
        if self.list.records().is_empty() && pagination.page > 0 {
            let last = pagination.total_pages().saturating_sub(1);
            return self.list.load(self.api.as_ref(), last).await;
        }
        outcome
    }

    pub fn set_operation_input(&mut self, id: OperationId, name: &str, value: impl Into<String>) {
        self.operations.set_input(id, name, value);
    }

    /// Runs a bulk operation; returns `None` if it was disabled. Operations
    /// that change records trigger a reload of the current page.
    pub async fn run_operation(&mut self, id: OperationId) -> Option<OperationReport> {
        let report = self.operations.execute(self.api.as_ref(), id).await?;
        self.notice = Some(if report.success {
            Notice::success(report.message.clone())
        } else {
            Notice::error(report.message.clone())
        });
        if report.refresh_requested {
            if let LoadOutcome::Failed(message) = self.reload_after_removal().await {
                warn!(%message, "list reload after bulk operation failed");
            }
        }
        Some(report)
    }

    pub fn records(&self) -> &[HumanBeing] {
        self.list.records()
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
