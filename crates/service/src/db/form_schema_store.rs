use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde_json::Value;
use tracing::info;

use models::form_schema;

use crate::errors::ServiceError;

fn db_err(e: sea_orm::DbErr) -> ServiceError {
    ServiceError::Db(e.to_string())
}

/// The one schema currently served to clients, if any. An empty table is a
/// deployment gap (seeding happens outside this service), not an error here.
pub async fn get_active_schema(
    db: &DatabaseConnection,
) -> Result<Option<form_schema::Model>, ServiceError> {
    form_schema::Entity::find()
        .filter(form_schema::Column::IsActive.eq(true))
        .one(db)
        .await
        .map_err(db_err)
}

/// Create a new schema version and make it the active one.
///
/// Deactivation of every existing row and insertion of the new active row
/// happen in a single transaction, deactivation first, so no reader ever
/// observes two active schemas.
pub async fn create_and_set_active(
    db: &DatabaseConnection,
    version: &str,
    schema_data: Value,
) -> Result<form_schema::Model, ServiceError> {
    let txn = db.begin().await.map_err(db_err)?;

    form_schema::Entity::update_many()
        .col_expr(form_schema::Column::IsActive, Expr::value(false))
        .exec(&txn)
        .await
        .map_err(db_err)?;

    let am = form_schema::ActiveModel {
        id: NotSet,
        version: Set(version.to_string()),
        schema_data: Set(schema_data),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    };
    let created = am.insert(&txn).await.map_err(db_err)?;

    txn.commit().await.map_err(db_err)?;
    info!(id = created.id, version = %created.version, "activated new form schema");
    Ok(created)
}
