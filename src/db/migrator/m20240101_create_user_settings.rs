use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserSettings)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Token resolution is a point lookup on the live token value.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_settings_recovery_token")
                    .table(UserSettings)
                    .col(crate::entities::user_settings::Column::RecoveryToken)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_settings_email")
                    .table(UserSettings)
                    .col(crate::entities::user_settings::Column::Email)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserSettings).to_owned())
            .await?;

        Ok(())
    }
}
