//! Contract Daemon library
//!
//! This module provides the components of the contract service daemon:
//! - REST API handlers for the contract operations
//! - Contract store backends
//! - Outbound clients for the CSP provisioner and the workflow engine
//! - Server lifecycle management

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod server;
pub mod storage;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::Server;
pub use storage::PostgresContractStore;
