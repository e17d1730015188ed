//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login and bearer tokens for back-office operators.

pub mod domain;
pub mod errors;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;
pub mod repo;

pub use service::{AuthConfig, AuthService};
pub use token::{Claims, TokenService};
