//! Service layer of the cloud-ops back office.
//! - Business rules live here; persistence goes through the `models` entities.
//! - Free async functions take a connection and the acting [`context::Operator`].
//! - Errors carry a stable business code, see [`errors::ServiceError::code`].

pub mod errors;
pub mod auth;
pub mod context;
pub mod pagination;
pub mod query;
pub mod internal_id;
pub mod crypto;
pub mod operation_log_service;
pub mod user_service;
pub mod payer_service;
pub mod account;
pub mod customer_service;
pub mod email_service;
pub mod basic_data_service;
pub mod billing;
pub mod invoice;
pub mod analysis;
pub mod payment_service;
pub mod knowledge_service;
pub mod schedule_service;
pub mod maintenance;
#[cfg(test)]
pub mod test_support;
