//! Create `operation_log` audit table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OperationLog::Table)
                    .if_not_exists()
                    .col(uuid(OperationLog::Id).primary_key())
                    .col(string_len_null(OperationLog::OperatorEmail, 255))
                    .col(string_len_null(OperationLog::OperatorName, 128))
                    .col(string_len(OperationLog::Action, 32).not_null())
                    .col(string_len(OperationLog::TargetType, 64).not_null())
                    .col(string_len_null(OperationLog::TargetId, 128))
                    .col(string_len_null(OperationLog::Description, 1024))
                    .col(timestamp_with_time_zone(OperationLog::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(OperationLog::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum OperationLog { Table, Id, OperatorEmail, OperatorName, Action, TargetType, TargetId, Description, CreatedAt }
