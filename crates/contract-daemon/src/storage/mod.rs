//! Contract store backends
//!
//! The in-memory store lives in `contract-control`; this module adds the
//! PostgreSQL-backed store used in production.

mod postgres;

pub use postgres::PostgresContractStore;
