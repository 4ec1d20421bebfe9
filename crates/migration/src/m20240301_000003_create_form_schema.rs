//! Create `form_schema` table.
//! Versioned intake-form documents; exactly one row carries `is_active`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FormSchema::Table)
                    .if_not_exists()
                    .col(integer(FormSchema::Id).primary_key().auto_increment())
                    .col(string_len(FormSchema::Version, 64).not_null())
                    .col(json_binary(FormSchema::SchemaData).not_null())
                    .col(boolean(FormSchema::IsActive).not_null())
                    .col(timestamp_with_time_zone(FormSchema::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(FormSchema::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum FormSchema {
    Table,
    Id,
    Version,
    SchemaData,
    IsActive,
    CreatedAt,
}
