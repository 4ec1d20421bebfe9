use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use uuid::Uuid;

use models::application::{self, ApplicationStatus};
use models::application_file;

use crate::db::application_store::{self, ApplicationWithFiles};
use crate::errors::ServiceError;
use crate::pagination::Page;

/// Sole mediator of reads/writes against the application tables.
///
/// Fetch operations report "not found" as `Ok(None)`, never as an error.
/// Write operations commit before returning. Preconditions (draft-only
/// edits, application existence for file links) live one layer up in
/// `ApplicationService`, so they stay testable without a database.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<application::Model>, ServiceError>;
    async fn get_with_files(&self, id: Uuid) -> Result<Option<ApplicationWithFiles>, ServiceError>;
    async fn get_draft_by_telegram_id(&self, telegram_id: i64) -> Result<Option<application::Model>, ServiceError>;
    async fn get_latest_by_telegram_id(&self, telegram_id: i64) -> Result<Option<application::Model>, ServiceError>;
    async fn list(&self, status: Option<ApplicationStatus>, page: Page) -> Result<Vec<ApplicationWithFiles>, ServiceError>;
    async fn list_all(&self) -> Result<Vec<ApplicationWithFiles>, ServiceError>;
    async fn create_for_telegram_user(&self, telegram_id: i64) -> Result<application::Model, ServiceError>;
    async fn create_for_web_user(&self) -> Result<application::Model, ServiceError>;
    async fn update_progress(&self, app: application::Model, data: Value) -> Result<application::Model, ServiceError>;
    async fn update_admin_details(&self, app: application::Model, status: Option<ApplicationStatus>, admin_comment: Option<String>) -> Result<ApplicationWithFiles, ServiceError>;
    async fn submit(&self, app: application::Model) -> Result<application::Model, ServiceError>;
    async fn link_file(&self, application_id: Uuid, file_id: &str, original_filename: &str, form_field_id: &str) -> Result<application_file::Model, ServiceError>;
}

/// SeaORM-backed repository implementation.
pub struct SeaOrmApplicationRepository {
    pub db: DatabaseConnection,
}

#[async_trait]
impl ApplicationRepository for SeaOrmApplicationRepository {
    async fn get(&self, id: Uuid) -> Result<Option<application::Model>, ServiceError> {
        application_store::get_by_uuid(&self.db, id).await
    }

    async fn get_with_files(&self, id: Uuid) -> Result<Option<ApplicationWithFiles>, ServiceError> {
        application_store::get_with_files(&self.db, id).await
    }

    async fn get_draft_by_telegram_id(&self, telegram_id: i64) -> Result<Option<application::Model>, ServiceError> {
        application_store::get_draft_by_telegram_id(&self.db, telegram_id).await
    }

    async fn get_latest_by_telegram_id(&self, telegram_id: i64) -> Result<Option<application::Model>, ServiceError> {
        application_store::get_latest_by_telegram_id(&self.db, telegram_id).await
    }

    async fn list(&self, status: Option<ApplicationStatus>, page: Page) -> Result<Vec<ApplicationWithFiles>, ServiceError> {
        application_store::list(&self.db, status, page).await
    }

    async fn list_all(&self) -> Result<Vec<ApplicationWithFiles>, ServiceError> {
        application_store::list_all_with_files(&self.db).await
    }

    async fn create_for_telegram_user(&self, telegram_id: i64) -> Result<application::Model, ServiceError> {
        application_store::create_for_telegram_user(&self.db, telegram_id).await
    }

    async fn create_for_web_user(&self) -> Result<application::Model, ServiceError> {
        application_store::create_for_web_user(&self.db).await
    }

    async fn update_progress(&self, app: application::Model, data: Value) -> Result<application::Model, ServiceError> {
        application_store::update_progress(&self.db, app, data).await
    }

    async fn update_admin_details(&self, app: application::Model, status: Option<ApplicationStatus>, admin_comment: Option<String>) -> Result<ApplicationWithFiles, ServiceError> {
        application_store::update_admin_details(&self.db, app, status, admin_comment).await
    }

    async fn submit(&self, app: application::Model) -> Result<application::Model, ServiceError> {
        application_store::submit(&self.db, app).await
    }

    async fn link_file(&self, application_id: Uuid, file_id: &str, original_filename: &str, form_field_id: &str) -> Result<application_file::Model, ServiceError> {
        application_store::link_file(&self.db, application_id, file_id, original_filename, form_field_id).await
    }
}
