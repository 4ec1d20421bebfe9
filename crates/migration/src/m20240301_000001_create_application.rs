//! Create `application` table.
//! One row per intake application; `data` holds the opaque form payload.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Application::Table)
                    .if_not_exists()
                    .col(uuid(Application::Id).primary_key())
                    .col(ColumnDef::new(Application::TelegramId).big_integer().null())
                    .col(string_len(Application::Status, 16).not_null())
                    .col(json_binary(Application::Data).not_null())
                    .col(ColumnDef::new(Application::AdminComment).text().null())
                    .col(timestamp_with_time_zone(Application::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Application::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Application::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Application {
    Table,
    Id,
    TelegramId,
    Status,
    Data,
    AdminComment,
    CreatedAt,
    UpdatedAt,
}
