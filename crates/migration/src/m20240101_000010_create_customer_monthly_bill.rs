//! Create `customer_monthly_bill`: one row per (month, linked account uid).
//!
//! Amounts are nullable; missing payable/profit values are derived on read.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CustomerMonthlyBill::Table)
                    .if_not_exists()
                    .col(uuid(CustomerMonthlyBill::Id).primary_key())
                    .col(string_len(CustomerMonthlyBill::Month, 7).not_null())
                    .col(string_len(CustomerMonthlyBill::CloudVendor, 64).not_null())
                    .col(string_len(CustomerMonthlyBill::CustomerName, 255).not_null())
                    .col(string_len(CustomerMonthlyBill::LinkedAccountUid, 64).not_null())
                    .col(double_null(CustomerMonthlyBill::OriginalBillingPercentage))
                    .col(double_null(CustomerMonthlyBill::TotalBill))
                    .col(double_null(CustomerMonthlyBill::UndiscountedBill))
                    .col(double_null(CustomerMonthlyBill::CostDiscountPercentage))
                    .col(double_null(CustomerMonthlyBill::CustomerPayableBill))
                    .col(double_null(CustomerMonthlyBill::SupplierPayableBill))
                    .col(double_null(CustomerMonthlyBill::Profit))
                    .col(text_null(CustomerMonthlyBill::Remarks))
                    .col(boolean(CustomerMonthlyBill::IsInvoiced).default(false))
                    .col(string_len(CustomerMonthlyBill::InvoiceStatus, 16).not_null().default("DRAFT"))
                    .col(uuid_null(CustomerMonthlyBill::InvoiceId))
                    .col(uuid_null(CustomerMonthlyBill::AccountId))
                    .col(uuid_null(CustomerMonthlyBill::CustomerId))
                    .col(timestamp_with_time_zone(CustomerMonthlyBill::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(CustomerMonthlyBill::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bill_invoice")
                            .from(CustomerMonthlyBill::Table, CustomerMonthlyBill::InvoiceId)
                            .to(Invoice::Table, Invoice::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bill_account")
                            .from(CustomerMonthlyBill::Table, CustomerMonthlyBill::AccountId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bill_customer")
                            .from(CustomerMonthlyBill::Table, CustomerMonthlyBill::CustomerId)
                            .to(Customer::Table, Customer::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CustomerMonthlyBill::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum CustomerMonthlyBill {
    Table,
    Id,
    Month,
    CloudVendor,
    CustomerName,
    LinkedAccountUid,
    OriginalBillingPercentage,
    TotalBill,
    UndiscountedBill,
    CostDiscountPercentage,
    CustomerPayableBill,
    SupplierPayableBill,
    Profit,
    Remarks,
    IsInvoiced,
    InvoiceStatus,
    InvoiceId,
    AccountId,
    CustomerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Invoice { Table, Id }

#[derive(DeriveIden)]
enum Account { Table, Id }

#[derive(DeriveIden)]
enum Customer { Table, Id }
