/// Database connection and pool configuration tests
pub mod db_tests;

/// Entity round trips against a live database
pub mod crud_tests;
