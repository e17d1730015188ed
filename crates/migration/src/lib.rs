//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_user;
mod m20240101_000002_create_user_credentials;
mod m20240101_000003_create_payer;
mod m20240101_000004_create_customer;
mod m20240101_000005_create_email;
mod m20240101_000006_create_account;
mod m20240101_000007_create_basic_data;
mod m20240101_000008_create_operation_log;
mod m20240101_000009_create_invoice;
mod m20240101_000010_create_customer_monthly_bill;
mod m20240101_000011_create_monthly_payment;
mod m20240101_000012_create_knowledge_and_schedule;
mod m20240101_000099_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_user::Migration),
            Box::new(m20240101_000002_create_user_credentials::Migration),
            Box::new(m20240101_000003_create_payer::Migration),
            Box::new(m20240101_000004_create_customer::Migration),
            Box::new(m20240101_000005_create_email::Migration),
            Box::new(m20240101_000006_create_account::Migration),
            Box::new(m20240101_000007_create_basic_data::Migration),
            Box::new(m20240101_000008_create_operation_log::Migration),
            // invoice before bills: bills reference invoice
            Box::new(m20240101_000009_create_invoice::Migration),
            Box::new(m20240101_000010_create_customer_monthly_bill::Migration),
            Box::new(m20240101_000011_create_monthly_payment::Migration),
            Box::new(m20240101_000012_create_knowledge_and_schedule::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000099_add_indexes::Migration),
        ]
    }
}
