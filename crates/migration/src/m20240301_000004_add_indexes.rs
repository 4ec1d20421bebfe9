use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Application: index on telegram_id for session lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_application_telegram")
                    .table(Application::Table)
                    .col(Application::TelegramId)
                    .to_owned(),
            )
            .await?;

        // Application: index on created_at for ordered listing
        manager
            .create_index(
                Index::create()
                    .name("idx_application_created_at")
                    .table(Application::Table)
                    .col(Application::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ApplicationFile: index on application_id
        manager
            .create_index(
                Index::create()
                    .name("idx_application_file_application")
                    .table(ApplicationFile::Table)
                    .col(ApplicationFile::ApplicationId)
                    .to_owned(),
            )
            .await?;

        // At most one draft per telegram user. Partial unique indexes are not
        // expressible through the schema builder, so raw SQL it is.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uniq_application_draft_per_user \
                 ON application (telegram_id) WHERE status = 'draft'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS uniq_application_draft_per_user")
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_application_file_application")
                    .table(ApplicationFile::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_application_created_at")
                    .table(Application::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_application_telegram")
                    .table(Application::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Application { Table, TelegramId, CreatedAt }

#[derive(DeriveIden)]
enum ApplicationFile { Table, ApplicationId }
