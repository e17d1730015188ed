//! Create `monthly_payment`: amounts received per (month, customer name).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MonthlyPayment::Table)
                    .if_not_exists()
                    .col(uuid(MonthlyPayment::Id).primary_key())
                    .col(string_len(MonthlyPayment::Month, 7).not_null())
                    .col(string_len(MonthlyPayment::CustomerName, 255).not_null())
                    .col(double(MonthlyPayment::ReceivedAmount).default(0.0))
                    .col(string_len_null(MonthlyPayment::PaymentMethod, 64))
                    .col(date_null(MonthlyPayment::LastPaymentDate))
                    .col(text_null(MonthlyPayment::Remarks))
                    .col(timestamp_with_time_zone(MonthlyPayment::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(MonthlyPayment::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MonthlyPayment::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum MonthlyPayment {
    Table,
    Id,
    Month,
    CustomerName,
    ReceivedAmount,
    PaymentMethod,
    LastPaymentDate,
    Remarks,
    CreatedAt,
    UpdatedAt,
}
