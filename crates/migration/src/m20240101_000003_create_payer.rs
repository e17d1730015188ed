//! Create `payer` table.
//!
//! `payer_internal_id` is the human-facing id (`payer_yyyyMMdd_NNN`);
//! `payer_id` is the vendor-side payer account number.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payer::Table)
                    .if_not_exists()
                    .col(uuid(Payer::Id).primary_key())
                    .col(string_len(Payer::PayerInternalId, 64).unique_key().not_null())
                    .col(string_len(Payer::PayerName, 255).not_null())
                    .col(string_len(Payer::PayerId, 64).unique_key().not_null())
                    .col(string_len_null(Payer::SigninUrl, 512))
                    .col(string_len_null(Payer::IamUsername, 255))
                    .col(string_len_null(Payer::PasswordHash, 255))
                    .col(string_len_null(Payer::ContactEmail, 255))
                    .col(text_null(Payer::Remarks))
                    .col(timestamp_with_time_zone(Payer::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Payer::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Payer::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Payer {
    Table,
    Id,
    PayerInternalId,
    PayerName,
    PayerId,
    SigninUrl,
    IamUsername,
    PasswordHash,
    ContactEmail,
    Remarks,
    CreatedAt,
    UpdatedAt,
}
