use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Bills: one row per (month, uid)
        manager
            .create_index(
                Index::create()
                    .name("uniq_bill_month_uid")
                    .table(CustomerMonthlyBill::Table)
                    .col(CustomerMonthlyBill::Month)
                    .col(CustomerMonthlyBill::LinkedAccountUid)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_bill_month_customer")
                    .table(CustomerMonthlyBill::Table)
                    .col(CustomerMonthlyBill::Month)
                    .col(CustomerMonthlyBill::CustomerName)
                    .to_owned(),
            )
            .await?;

        // Payments: composite unique (month, customer_name)
        manager
            .create_index(
                Index::create()
                    .name("uniq_payment_month_customer")
                    .table(MonthlyPayment::Table)
                    .col(MonthlyPayment::Month)
                    .col(MonthlyPayment::CustomerName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Account: lookups by payer and customer
        manager
            .create_index(
                Index::create()
                    .name("idx_account_payer")
                    .table(Account::Table)
                    .col(Account::PayerId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_account_customer")
                    .table(Account::Table)
                    .col(Account::CustomerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_oplog_created_at")
                    .table(OperationLog::Table)
                    .col(OperationLog::CreatedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_schedule_start")
                    .table(Schedule::Table)
                    .col(Schedule::StartTime)
                    .to_owned(),
            )
            .await?;

        // Mail addresses and customer names/emails are unique regardless of case
        let conn = manager.get_connection();
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS uniq_email_address_lower ON email (lower(email_address))",
        )
        .await?;
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS uniq_customer_name_lower ON customer (lower(customer_name))",
        )
        .await?;
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS uniq_customer_email_lower ON customer (lower(email))",
        )
        .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        conn.execute_unprepared("DROP INDEX IF EXISTS uniq_customer_email_lower").await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS uniq_customer_name_lower").await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS uniq_email_address_lower").await?;
        manager
            .drop_index(Index::drop().name("idx_schedule_start").table(Schedule::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_oplog_created_at").table(OperationLog::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_account_customer").table(Account::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_account_payer").table(Account::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_payment_month_customer").table(MonthlyPayment::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_bill_month_customer").table(CustomerMonthlyBill::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_bill_month_uid").table(CustomerMonthlyBill::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CustomerMonthlyBill { Table, Month, LinkedAccountUid, CustomerName }

#[derive(DeriveIden)]
enum MonthlyPayment { Table, Month, CustomerName }

#[derive(DeriveIden)]
enum Account { Table, PayerId, CustomerId }

#[derive(DeriveIden)]
enum OperationLog { Table, CreatedAt }

#[derive(DeriveIden)]
enum Schedule { Table, StartTime }
