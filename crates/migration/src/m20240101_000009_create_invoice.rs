//! Create `invoice` and `invoice_line_item`.
//!
//! Totals are stored denormalized and recomputed whenever lines change.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Invoice::Table)
                    .if_not_exists()
                    .col(uuid(Invoice::Id).primary_key())
                    .col(string_len(Invoice::InvoiceNumber, 64).unique_key().not_null())
                    .col(string_len(Invoice::CustomerName, 255).not_null())
                    .col(date(Invoice::InvoiceDate).not_null())
                    .col(date_null(Invoice::DueDate))
                    .col(string_len(Invoice::Currency, 8).not_null().default("CNY"))
                    .col(string_len_null(Invoice::TaxNumber, 64))
                    .col(string_len_null(Invoice::PaymentReference, 64))
                    .col(array(Invoice::Activities, ColumnType::Text).default(Expr::cust("'{}'")))
                    .col(text_null(Invoice::Terms))
                    .col(string_len(Invoice::Status, 16).not_null().default("DRAFT"))
                    .col(double(Invoice::SubtotalExTax).default(0.0))
                    .col(double(Invoice::TaxTotal).default(0.0))
                    .col(double(Invoice::GrandTotal).default(0.0))
                    .col(timestamp_with_time_zone(Invoice::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Invoice::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InvoiceLineItem::Table)
                    .if_not_exists()
                    .col(uuid(InvoiceLineItem::Id).primary_key())
                    .col(uuid(InvoiceLineItem::InvoiceId).not_null())
                    .col(string_len_null(InvoiceLineItem::ProductId, 64))
                    .col(string_len(InvoiceLineItem::Label, 255).not_null())
                    .col(integer(InvoiceLineItem::Quantity).default(1))
                    .col(double(InvoiceLineItem::Price).default(0.0))
                    .col(double(InvoiceLineItem::DiscountPct).default(0.0))
                    .col(double(InvoiceLineItem::TaxPct).default(0.0))
                    .col(double(InvoiceLineItem::AmountExTax).default(0.0))
                    .col(double(InvoiceLineItem::AmountIncTax).default(0.0))
                    .col(integer(InvoiceLineItem::Position).default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_line_item_invoice")
                            .from(InvoiceLineItem::Table, InvoiceLineItem::InvoiceId)
                            .to(Invoice::Table, Invoice::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(InvoiceLineItem::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Invoice::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Invoice {
    Table,
    Id,
    InvoiceNumber,
    CustomerName,
    InvoiceDate,
    DueDate,
    Currency,
    TaxNumber,
    PaymentReference,
    Activities,
    Terms,
    Status,
    SubtotalExTax,
    TaxTotal,
    GrandTotal,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum InvoiceLineItem {
    Table,
    Id,
    InvoiceId,
    ProductId,
    Label,
    Quantity,
    Price,
    DiscountPct,
    TaxPct,
    AmountExTax,
    AmountIncTax,
    Position,
}
