use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    LoaderTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use models::application::{self, ApplicationStatus};
use models::application_file;

use crate::errors::ServiceError;
use crate::pagination::Page;

/// An application together with its linked files, the shape admin-facing
/// callers and the export/archive endpoints expect.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ApplicationWithFiles {
    pub application: application::Model,
    pub files: Vec<application_file::Model>,
}

fn db_err(e: sea_orm::DbErr) -> ServiceError {
    ServiceError::Db(e.to_string())
}

pub async fn get_by_uuid(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<application::Model>, ServiceError> {
    application::Entity::find_by_id(id).one(db).await.map_err(db_err)
}

pub async fn get_with_files(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<ApplicationWithFiles>, ServiceError> {
    let Some(app) = get_by_uuid(db, id).await? else { return Ok(None) };
    let files = find_files(db, &app).await?;
    Ok(Some(ApplicationWithFiles { application: app, files }))
}

pub async fn get_draft_by_telegram_id(
    db: &DatabaseConnection,
    telegram_id: i64,
) -> Result<Option<application::Model>, ServiceError> {
    application::Entity::find()
        .filter(application::Column::TelegramId.eq(telegram_id))
        .filter(application::Column::Status.eq(ApplicationStatus::Draft.as_str()))
        .one(db)
        .await
        .map_err(db_err)
}

pub async fn get_latest_by_telegram_id(
    db: &DatabaseConnection,
    telegram_id: i64,
) -> Result<Option<application::Model>, ServiceError> {
    application::Entity::find()
        .filter(application::Column::TelegramId.eq(telegram_id))
        .order_by_desc(application::Column::CreatedAt)
        .one(db)
        .await
        .map_err(db_err)
}

/// Page of applications in creation order, files eager-loaded.
pub async fn list(
    db: &DatabaseConnection,
    status: Option<ApplicationStatus>,
    page: Page,
) -> Result<Vec<ApplicationWithFiles>, ServiceError> {
    let (limit, offset) = page.normalize();
    let mut query = application::Entity::find().order_by_asc(application::Column::CreatedAt);
    if let Some(status) = status {
        query = query.filter(application::Column::Status.eq(status.as_str()));
    }
    let apps = query.limit(limit).offset(offset).all(db).await.map_err(db_err)?;
    attach_files(db, apps).await
}

/// Unpaginated feed for the export endpoint.
pub async fn list_all_with_files(
    db: &DatabaseConnection,
) -> Result<Vec<ApplicationWithFiles>, ServiceError> {
    let apps = application::Entity::find()
        .order_by_asc(application::Column::CreatedAt)
        .all(db)
        .await
        .map_err(db_err)?;
    attach_files(db, apps).await
}

async fn attach_files(
    db: &DatabaseConnection,
    apps: Vec<application::Model>,
) -> Result<Vec<ApplicationWithFiles>, ServiceError> {
    let files = apps.load_many(application_file::Entity, db).await.map_err(db_err)?;
    Ok(apps
        .into_iter()
        .zip(files)
        .map(|(application, files)| ApplicationWithFiles { application, files })
        .collect())
}

async fn find_files(
    db: &DatabaseConnection,
    app: &application::Model,
) -> Result<Vec<application_file::Model>, ServiceError> {
    app.find_related(application_file::Entity)
        .order_by_asc(application_file::Column::Id)
        .all(db)
        .await
        .map_err(db_err)
}

pub async fn create_for_telegram_user(
    db: &DatabaseConnection,
    telegram_id: i64,
) -> Result<application::Model, ServiceError> {
    insert_draft(db, Some(telegram_id)).await
}

pub async fn create_for_web_user(
    db: &DatabaseConnection,
) -> Result<application::Model, ServiceError> {
    insert_draft(db, None).await
}

async fn insert_draft(
    db: &DatabaseConnection,
    telegram_id: Option<i64>,
) -> Result<application::Model, ServiceError> {
    let now = Utc::now().into();
    let am = application::ActiveModel {
        id: Set(Uuid::new_v4()),
        telegram_id: Set(telegram_id),
        status: Set(ApplicationStatus::Draft.as_str().to_string()),
        data: Set(json!({})),
        admin_comment: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    // A duplicate draft trips the partial unique index; surface that as a
    // tagged Conflict so the caller can reconcile instead of failing.
    let created = am.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => ServiceError::Conflict(msg),
        _ => db_err(e),
    })?;
    info!(id = %created.id, telegram_id = ?created.telegram_id, "created draft application");
    Ok(created)
}

/// Replace the form-data payload wholesale. The draft precondition is the
/// caller's responsibility.
pub async fn update_progress(
    db: &DatabaseConnection,
    app: application::Model,
    data: Value,
) -> Result<application::Model, ServiceError> {
    let mut am: application::ActiveModel = app.into();
    am.data = Set(data);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(db_err)
}

/// Partial admin update: absent fields are left untouched, not cleared.
/// Files are re-fetched so the returned record matches the eager-loaded
/// shape used everywhere else.
pub async fn update_admin_details(
    db: &DatabaseConnection,
    app: application::Model,
    status: Option<ApplicationStatus>,
    admin_comment: Option<String>,
) -> Result<ApplicationWithFiles, ServiceError> {
    let mut am: application::ActiveModel = app.into();
    if let Some(status) = status {
        am.status = Set(status.as_str().to_string());
    }
    if let Some(comment) = admin_comment {
        am.admin_comment = Set(Some(comment));
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await.map_err(db_err)?;
    info!(id = %updated.id, status = %updated.status, "applied admin update");
    let files = find_files(db, &updated).await?;
    Ok(ApplicationWithFiles { application: updated, files })
}

/// Unconditional `draft -> new` write; the caller verifies the precondition.
pub async fn submit(
    db: &DatabaseConnection,
    app: application::Model,
) -> Result<application::Model, ServiceError> {
    let mut am: application::ActiveModel = app.into();
    am.status = Set(ApplicationStatus::New.as_str().to_string());
    am.updated_at = Set(Utc::now().into());
    let submitted = am.update(db).await.map_err(db_err)?;
    info!(id = %submitted.id, "application submitted");
    Ok(submitted)
}

/// Record a link to an already-uploaded object. Does not verify that the
/// application exists or is still mutable; callers check first.
pub async fn link_file(
    db: &DatabaseConnection,
    application_id: Uuid,
    file_id: &str,
    original_filename: &str,
    form_field_id: &str,
) -> Result<application_file::Model, ServiceError> {
    let am = application_file::ActiveModel {
        id: NotSet,
        application_id: Set(application_id),
        file_id: Set(file_id.to_string()),
        original_filename: Set(original_filename.to_string()),
        form_field_id: Set(form_field_id.to_string()),
        created_at: Set(Utc::now().into()),
    };
    let linked = am.insert(db).await.map_err(db_err)?;
    info!(id = linked.id, application_id = %application_id, file_id = %linked.file_id, "linked file to application");
    Ok(linked)
}
