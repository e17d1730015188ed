//! Create `customer` and its child `customer_uid` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customer::Table)
                    .if_not_exists()
                    .col(uuid(Customer::Id).primary_key())
                    .col(string_len(Customer::CustomerInternalId, 64).unique_key().not_null())
                    .col(string_len(Customer::CustomerName, 255).not_null())
                    .col(string_len(Customer::Email, 255).not_null())
                    .col(uuid_null(Customer::PayerId))
                    .col(array(Customer::Permissions, ColumnType::Text).default(Expr::cust("'{}'")))
                    .col(double_null(Customer::OriginalBillingPercentage))
                    .col(array(Customer::ProductsUsed, ColumnType::Text).default(Expr::cust("'{}'")))
                    .col(string_len_null(Customer::DeliveryTime, 64))
                    .col(string_len_null(Customer::Company, 255))
                    .col(string_len(Customer::Status, 32).not_null().default("active"))
                    .col(array(Customer::Labels, ColumnType::Text).default(Expr::cust("'{}'")))
                    .col(text_null(Customer::Remarks))
                    .col(timestamp_with_time_zone(Customer::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Customer::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_payer")
                            .from(Customer::Table, Customer::PayerId)
                            .to(Payer::Table, Payer::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CustomerUid::Table)
                    .if_not_exists()
                    .col(uuid(CustomerUid::Id).primary_key())
                    .col(uuid(CustomerUid::CustomerId).not_null())
                    .col(string_len(CustomerUid::Uid, 64).not_null())
                    .col(string_len(CustomerUid::UidType, 64).not_null())
                    .col(boolean(CustomerUid::IsPrimary).default(false))
                    .col(string_len_null(CustomerUid::Description, 255))
                    .col(timestamp_with_time_zone(CustomerUid::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_uid_customer")
                            .from(CustomerUid::Table, CustomerUid::CustomerId)
                            .to(Customer::Table, Customer::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CustomerUid::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Customer::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Customer {
    Table,
    Id,
    CustomerInternalId,
    CustomerName,
    Email,
    PayerId,
    Permissions,
    OriginalBillingPercentage,
    ProductsUsed,
    DeliveryTime,
    Company,
    Status,
    Labels,
    Remarks,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CustomerUid { Table, Id, CustomerId, Uid, UidType, IsPrimary, Description, CreatedAt }

#[derive(DeriveIden)]
enum Payer { Table, Id }
