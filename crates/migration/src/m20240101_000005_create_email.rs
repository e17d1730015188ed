//! Create `email` table.
//!
//! Secondary mailboxes reference their primary through `parent_email_id`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Email::Table)
                    .if_not_exists()
                    .col(uuid(Email::Id).primary_key())
                    .col(string_len(Email::EmailInternalId, 64).unique_key().not_null())
                    .col(string_len(Email::EmailAddress, 255).unique_key().not_null())
                    .col(string_len_null(Email::PasswordHash, 255))
                    .col(string_len_null(Email::Source, 128))
                    .col(string_len(Email::Category, 32).not_null().default("normal"))
                    .col(uuid_null(Email::ParentEmailId))
                    .col(string_len_null(Email::CreditCardLast4, 8))
                    .col(boolean(Email::IsSpAccount).default(false))
                    .col(uuid_null(Email::PayerId))
                    .col(string_len_null(Email::LinkedAccountName, 255))
                    .col(string_len_null(Email::LinkedAccountUid, 64))
                    .col(boolean(Email::EnableForwarding).default(false))
                    .col(string_len(Email::Status, 32).not_null().default("active"))
                    .col(array(Email::Labels, ColumnType::Text).default(Expr::cust("'{}'")))
                    .col(text_null(Email::Remarks))
                    .col(timestamp_with_time_zone(Email::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Email::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_parent")
                            .from(Email::Table, Email::ParentEmailId)
                            .to(Email::Table, Email::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_payer")
                            .from(Email::Table, Email::PayerId)
                            .to(Payer::Table, Payer::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Email::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Email {
    Table,
    Id,
    EmailInternalId,
    EmailAddress,
    PasswordHash,
    Source,
    Category,
    ParentEmailId,
    CreditCardLast4,
    IsSpAccount,
    PayerId,
    LinkedAccountName,
    LinkedAccountUid,
    EnableForwarding,
    Status,
    Labels,
    Remarks,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Payer { Table, Id }
