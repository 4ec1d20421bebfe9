use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use models::application::{self, ApplicationStatus};
use models::application_file;

use crate::application::repository::ApplicationRepository;
use crate::db::application_store::ApplicationWithFiles;
use crate::errors::ServiceError;
use crate::pagination::Page;

/// Application lifecycle rules on top of the repository.
///
/// The state machine is draft -> new -> in_progress -> completed/rejected;
/// only `draft` accepts applicant edits, and submission is one-way.
pub struct ApplicationService<R: ApplicationRepository> {
    repo: Arc<R>,
}

impl<R: ApplicationRepository> ApplicationService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// Create-or-resume for a messaging-platform user. An existing draft is
    /// the session to resume; otherwise a fresh draft is created.
    #[instrument(skip(self))]
    pub async fn create_or_resume_telegram(&self, telegram_id: i64) -> Result<application::Model, ServiceError> {
        if let Some(existing) = self.repo.get_draft_by_telegram_id(telegram_id).await? {
            info!(id = %existing.id, telegram_id, "resumed existing draft session");
            return Ok(existing);
        }
        match self.repo.create_for_telegram_user(telegram_id).await {
            Ok(created) => Ok(created),
            // Lost the race against a concurrent session request for the
            // same user: the partial unique index rejected our insert, so
            // the winner's draft is the session to resume.
            Err(ServiceError::Conflict(_)) => self
                .repo
                .get_draft_by_telegram_id(telegram_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("draft application")),
            Err(e) => Err(e),
        }
    }

    /// Anonymous web session: always a fresh draft.
    pub async fn create_web(&self) -> Result<application::Model, ServiceError> {
        self.repo.create_for_web_user().await
    }

    /// Status of the newest application for this user, whatever that status
    /// is. Used for polling after submission.
    pub async fn latest_status(&self, telegram_id: i64) -> Result<Option<ApplicationStatus>, ServiceError> {
        match self.repo.get_latest_by_telegram_id(telegram_id).await? {
            Some(app) => Ok(Some(app.status_parsed()?)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<application::Model>, ServiceError> {
        self.repo.get(id).await
    }

    pub async fn get_with_files(&self, id: Uuid) -> Result<Option<ApplicationWithFiles>, ServiceError> {
        self.repo.get_with_files(id).await
    }

    pub async fn list(&self, status: Option<ApplicationStatus>, page: Page) -> Result<Vec<ApplicationWithFiles>, ServiceError> {
        self.repo.list(status, page).await
    }

    pub async fn list_all(&self) -> Result<Vec<ApplicationWithFiles>, ServiceError> {
        self.repo.list_all().await
    }

    /// Replace the draft's form data. Editing anything but a draft is an
    /// invalid-state error and leaves the record untouched.
    pub async fn save_progress(&self, id: Uuid, data: Value) -> Result<application::Model, ServiceError> {
        let app = self.require(id).await?;
        self.require_draft(&app)?;
        self.repo.update_progress(app, data).await
    }

    /// One-way draft -> new transition. A second submit lands here with a
    /// non-draft record and fails the same invalid-state check.
    pub async fn submit(&self, id: Uuid) -> Result<application::Model, ServiceError> {
        let app = self.require(id).await?;
        self.require_draft(&app)?;
        self.repo.submit(app).await
    }

    pub async fn update_admin(
        &self,
        id: Uuid,
        status: Option<ApplicationStatus>,
        admin_comment: Option<String>,
    ) -> Result<ApplicationWithFiles, ServiceError> {
        let app = self.require(id).await?;
        self.repo.update_admin_details(app, status, admin_comment).await
    }

    pub async fn link_file(
        &self,
        id: Uuid,
        file_id: &str,
        original_filename: &str,
        form_field_id: &str,
    ) -> Result<application_file::Model, ServiceError> {
        let app = self.require(id).await?;
        self.repo.link_file(app.id, file_id, original_filename, form_field_id).await
    }

    async fn require(&self, id: Uuid) -> Result<application::Model, ServiceError> {
        self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("application"))
    }

    fn require_draft(&self, app: &application::Model) -> Result<(), ServiceError> {
        if app.is_draft() {
            Ok(())
        } else {
            Err(ServiceError::invalid_state(format!(
                "application {} is not editable in status {}",
                app.id, app.status
            )))
        }
    }
}
