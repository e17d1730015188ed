//! SeaORM entities for the back-office schema plus field validation.

pub mod errors;
pub mod db;
pub mod validation;
pub mod user;
pub mod user_credentials;
pub mod payer;
pub mod account;
pub mod customer;
pub mod customer_uid;
pub mod email;
pub mod cloud_provider;
pub mod partner_bd;
pub mod credit_card;
pub mod operation_log;
pub mod customer_monthly_bill;
pub mod invoice;
pub mod invoice_line_item;
pub mod monthly_payment;
pub mod knowledge_article;
pub mod schedule;

#[cfg(test)]
mod tests;
