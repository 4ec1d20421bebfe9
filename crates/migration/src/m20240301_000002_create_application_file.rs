//! Create `application_file` table linking applications to uploaded objects.
//! `file_id` is the key in the external file storage service; content never
//! lands in this database.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApplicationFile::Table)
                    .if_not_exists()
                    .col(big_integer(ApplicationFile::Id).primary_key().auto_increment())
                    .col(uuid(ApplicationFile::ApplicationId).not_null())
                    .col(string_len(ApplicationFile::FileId, 256).not_null())
                    .col(string_len(ApplicationFile::OriginalFilename, 512).not_null())
                    .col(string_len(ApplicationFile::FormFieldId, 128).not_null())
                    .col(timestamp_with_time_zone(ApplicationFile::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_application_file_application")
                            .from(ApplicationFile::Table, ApplicationFile::ApplicationId)
                            .to(Application::Table, Application::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ApplicationFile::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ApplicationFile {
    Table,
    Id,
    ApplicationId,
    FileId,
    OriginalFilename,
    FormFieldId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Application { Table, Id }
