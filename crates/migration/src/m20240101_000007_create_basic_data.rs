//! Create basic-data dictionaries: `cloud_provider`, `partner_bd`, `credit_card`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CloudProvider::Table)
                    .if_not_exists()
                    .col(uuid(CloudProvider::Id).primary_key())
                    .col(string_len(CloudProvider::Name, 128).unique_key().not_null())
                    .col(string_len(CloudProvider::Code, 64).unique_key().not_null())
                    .col(string_len(CloudProvider::Status, 32).not_null().default("Enabled"))
                    .col(text_null(CloudProvider::Description))
                    .col(timestamp_with_time_zone(CloudProvider::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(CloudProvider::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PartnerBd::Table)
                    .if_not_exists()
                    .col(uuid(PartnerBd::Id).primary_key())
                    .col(string_len(PartnerBd::Name, 128).not_null())
                    .col(string_len_null(PartnerBd::Email, 255))
                    .col(string_len_null(PartnerBd::Phone, 64))
                    .col(string_len(PartnerBd::Status, 32).not_null().default("Enabled"))
                    .col(text_null(PartnerBd::Description))
                    .col(timestamp_with_time_zone(PartnerBd::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(PartnerBd::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CreditCard::Table)
                    .if_not_exists()
                    .col(uuid(CreditCard::Id).primary_key())
                    .col(string_len(CreditCard::CardId, 16).unique_key().not_null())
                    .col(string_len(CreditCard::BankName, 128).not_null())
                    .col(string_len_null(CreditCard::HolderName, 128))
                    .col(string_len(CreditCard::FirstFourDigits, 4).not_null())
                    .col(string_len(CreditCard::LastFourDigits, 4).not_null())
                    .col(string_len_null(CreditCard::ExpirationDate, 16))
                    .col(string_len(CreditCard::Status, 32).not_null().default("Enabled"))
                    .col(text_null(CreditCard::Description))
                    .col(timestamp_with_time_zone(CreditCard::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(CreditCard::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CreditCard::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(PartnerBd::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(CloudProvider::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum CloudProvider { Table, Id, Name, Code, Status, Description, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum PartnerBd { Table, Id, Name, Email, Phone, Status, Description, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum CreditCard {
    Table,
    Id,
    CardId,
    BankName,
    HolderName,
    FirstFourDigits,
    LastFourDigits,
    ExpirationDate,
    Status,
    Description,
    CreatedAt,
    UpdatedAt,
}
