use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Provider: email is unique across the catalog
        manager
            .create_index(
                Index::create()
                    .name("uniq_provider_email")
                    .table(Provider::Table)
                    .col(Provider::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Service: lookups by owning provider
        manager
            .create_index(
                Index::create()
                    .name("idx_service_provider")
                    .table(Service::Table)
                    .col(Service::ProviderId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_service_provider").table(Service::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_provider_email").table(Provider::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Provider { Table, Email }

#[derive(DeriveIden)]
enum Service { Table, ProviderId }
