//! API layer for contract-daemon

pub mod rest;

pub use rest::create_router;
