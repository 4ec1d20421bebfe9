pub mod errors;
pub mod db;
pub mod application;
pub mod application_file;
pub mod form_schema;
