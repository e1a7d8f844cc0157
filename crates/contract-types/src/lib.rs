//! Contract Types - Core types for the contract control plane
//!
//! A contract binds a paying customer to a cloud-service-provider (CSP)
//! account, a set of platform services, and a resource quota.
//!
//! ## Key Concepts
//!
//! - **Contract**: the durable record, keyed by [`ContractId`]
//! - **ContractQuota**: compute, memory and storage-tier limits
//! - **CspId**: the CSP account bound to a contract, set once
//! - **Code**: result codes carried by every response

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod code;
pub mod contract;
pub mod ids;
pub mod quota;

pub use code::Code;
pub use contract::Contract;
pub use ids::{ContractId, CspId, InvalidContractId};
pub use quota::ContractQuota;
