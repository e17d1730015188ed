//! Create `account` table: one row per cloud-vendor account (e.g. an AWS UID).
//!
//! The card number is stored encrypted plus a masked copy used for display and
//! credit-card usage counting.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(uuid(Account::Id).primary_key())
                    .col(string_len(Account::AccountInternalId, 64).unique_key().not_null())
                    .col(string_len(Account::Uid, 64).unique_key().not_null())
                    .col(string_len(Account::AccountName, 255).not_null())
                    .col(string_len_null(Account::Vendor, 64))
                    .col(string_len_null(Account::AccountCategory, 64))
                    .col(string_len_null(Account::AccountSource, 128))
                    .col(string_len_null(Account::AccountAttribution, 128))
                    .col(string_len_null(Account::MonitorEmail, 255))
                    .col(string_len_null(Account::MonitorUrl, 512))
                    .col(string_len_null(Account::MfaStatus, 32))
                    .col(boolean(Account::IsMonitoredSp).default(false))
                    .col(string_len_null(Account::MonitorBillGroup, 128))
                    .col(boolean(Account::SendPo).default(false))
                    .col(text_null(Account::BoundCreditCardEncrypted))
                    .col(string_len_null(Account::BoundCreditCardMasked, 32))
                    .col(string_len_null(Account::BoundEmail, 255))
                    .col(double_null(Account::RiskDiscount))
                    .col(double_null(Account::CostDiscount))
                    .col(string_len_null(Account::BdName, 128))
                    .col(text_null(Account::Remarks))
                    .col(boolean(Account::IsSubmitted).default(false))
                    .col(boolean(Account::IsNew).default(true))
                    .col(array(Account::Labels, ColumnType::Text).default(Expr::cust("'{}'")))
                    .col(uuid_null(Account::PayerId))
                    .col(uuid_null(Account::CustomerId))
                    .col(uuid_null(Account::LinkedEmailId))
                    .col(timestamp_with_time_zone(Account::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Account::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_payer")
                            .from(Account::Table, Account::PayerId)
                            .to(Payer::Table, Payer::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_customer")
                            .from(Account::Table, Account::CustomerId)
                            .to(Customer::Table, Customer::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_email")
                            .from(Account::Table, Account::LinkedEmailId)
                            .to(Email::Table, Email::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Account::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Account {
    Table,
    Id,
    AccountInternalId,
    Uid,
    AccountName,
    Vendor,
    AccountCategory,
    AccountSource,
    AccountAttribution,
    MonitorEmail,
    MonitorUrl,
    MfaStatus,
    IsMonitoredSp,
    MonitorBillGroup,
    SendPo,
    BoundCreditCardEncrypted,
    BoundCreditCardMasked,
    BoundEmail,
    RiskDiscount,
    CostDiscount,
    BdName,
    Remarks,
    IsSubmitted,
    IsNew,
    Labels,
    PayerId,
    CustomerId,
    LinkedEmailId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Payer { Table, Id }

#[derive(DeriveIden)]
enum Customer { Table, Id }

#[derive(DeriveIden)]
enum Email { Table, Id }
