use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use service::db::form_schema_store;

use crate::errors::JsonApiError;
use crate::routes::ServerState;

#[derive(Debug, Deserialize, Serialize)]
pub struct FormSchemaUpload {
    pub version: String,
    pub schema_data: Value,
}

#[derive(Debug, Serialize)]
pub struct SchemaActivated {
    pub message: String,
}

#[utoipa::path(
    get, path = "/api/v1/forms/schema/active", tag = "forms",
    responses(
        (status = 200, description = "The active form schema document"),
        (status = 500, description = "No active schema seeded")
    )
)]
pub async fn get_active_schema(
    State(state): State<ServerState>,
) -> Result<Json<Value>, JsonApiError> {
    match form_schema_store::get_active_schema(&state.db).await {
        Ok(Some(schema)) => Ok(Json(schema.schema_data)),
        // An empty table means the deployment seeding step has not run;
        // clients cannot render the form, so this is a server-side failure.
        Ok(None) => Err(JsonApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "No Active Schema",
            Some("no active form schema found in the database".into()),
        )),
        Err(e) => Err(JsonApiError::from_service(e, "Schema Lookup Failed")),
    }
}

#[utoipa::path(
    post, path = "/api/v1/admin/forms/schema", tag = "forms",
    request_body = crate::openapi::FormSchemaUploadDoc,
    responses(
        (status = 201, description = "Schema uploaded and activated"),
        (status = 500, description = "Upload Failed")
    )
)]
pub async fn upload_schema(
    State(state): State<ServerState>,
    Json(input): Json<FormSchemaUpload>,
) -> Result<(StatusCode, Json<SchemaActivated>), JsonApiError> {
    let created = form_schema_store::create_and_set_active(&state.db, &input.version, input.schema_data)
        .await
        .map_err(|e| JsonApiError::from_service(e, "Upload Failed"))?;
    info!(id = created.id, version = %created.version, "form schema activated");
    Ok((
        StatusCode::CREATED,
        Json(SchemaActivated {
            message: format!("Schema version {} has been uploaded and activated.", created.version),
        }),
    ))
}
