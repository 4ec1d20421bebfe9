//! Service layer providing the intake business logic on top of models.
//! - Separates lifecycle rules from data access.
//! - Reuses entity definitions in the `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod pagination;
pub mod db;
pub mod application;
pub mod export;
pub mod files;
pub mod archive;
#[cfg(test)]
pub mod test_support;
