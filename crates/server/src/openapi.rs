use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct TelegramSessionRequestDoc {
    pub telegram_id: i64,
}

#[derive(ToSchema)]
pub struct ApplicationUpdateDoc {
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

#[derive(ToSchema)]
pub struct FileLinkRequestDoc {
    pub file_id: String,
    pub original_filename: String,
    pub form_field_id: String,
}

#[derive(ToSchema)]
pub struct ApplicationAdminUpdateDoc {
    pub status: Option<String>,
    pub admin_comment: Option<String>,
}

#[derive(ToSchema)]
pub struct FormSchemaUploadDoc {
    pub version: String,
    #[schema(value_type = Object)]
    pub schema_data: serde_json::Value,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::sessions::create_telegram_session,
        crate::routes::sessions::create_web_session,
        crate::routes::sessions::telegram_session_status,
        crate::routes::applications::get_public,
        crate::routes::applications::get_public_status,
        crate::routes::applications::save_progress,
        crate::routes::applications::submit,
        crate::routes::applications::link_file,
        crate::routes::admin::list,
        crate::routes::admin::get,
        crate::routes::admin::update,
        crate::routes::admin::export,
        crate::routes::admin::download_documents,
        crate::routes::forms::get_active_schema,
        crate::routes::forms::upload_schema,
    ),
    components(
        schemas(
            TelegramSessionRequestDoc,
            ApplicationUpdateDoc,
            FileLinkRequestDoc,
            ApplicationAdminUpdateDoc,
            FormSchemaUploadDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "sessions"),
        (name = "applications"),
        (name = "admin"),
        (name = "forms")
    )
)]
pub struct ApiDoc;
