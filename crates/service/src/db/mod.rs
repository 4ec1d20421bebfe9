pub mod application_store;
pub mod form_schema_store;
