//! # Contract Control
//!
//! Orchestration of contract creation over three collaborators, plus
//! validated pass-through updates and reads.
//!
//! ## Overview
//!
//! [`ContractOrchestrator`] is the single entry point. It holds injected
//! handles to:
//!
//! - a [`ContractStore`] that owns contract records
//! - a [`CspProvisioner`] that creates the CSP account backing a contract
//! - a [`WorkflowEngine`] that runs the asynchronous provisioning workflow
//!
//! Creation is best-effort and non-transactional: each step gates the next,
//! nothing is retried, and nothing is rolled back. A workflow that is already
//! running for the contract is reported as
//! [`CreateOutcome::AlreadyProvisioning`] instead of being submitted twice.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use contract_control::{
//!     ContractOrchestratorBuilder, InMemoryContractStore, InMemoryCspProvisioner,
//!     InMemoryWorkflowEngine, NewContract,
//! };
//! use contract_types::ContractQuota;
//!
//! # async fn example() {
//! let orchestrator = ContractOrchestratorBuilder::new()
//!     .with_store(Arc::new(InMemoryContractStore::new()))
//!     .with_csp_provisioner(Arc::new(InMemoryCspProvisioner::accepting()))
//!     .with_workflow_engine(Arc::new(InMemoryWorkflowEngine::new()))
//!     .build()
//!     .expect("all collaborators supplied");
//!
//! let request = NewContract::new("acme", "aws")
//!     .with_services(["build", "deploy"])
//!     .with_quota(ContractQuota::compute(4, 16));
//! let outcome = orchestrator.create_contract(request).await.unwrap();
//!
//! println!("Created contract: {}", outcome.contract_id());
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod builder;
pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod provisioner;
pub mod store;
pub mod workflow;

// Re-exports
pub use builder::{BuildError, ContractOrchestratorBuilder};
pub use error::{ContractError, ProvisionerError, Result, StoreError, WorkflowError};
pub use orchestrator::{
    ContractOrchestrator, ProvisioningSettings, DEFAULT_WORKFLOW_NAMESPACE,
    DEFAULT_WORKFLOW_TEMPLATE,
};
pub use outcome::{CreateOutcome, CspCredentials, NewContract, Updated};
pub use provisioner::{CspAccountReply, CspProvisioner, InMemoryCspProvisioner};
pub use store::{ContractStore, InMemoryContractStore, StoreResult};
pub use workflow::{
    InMemoryWorkflowEngine, WorkflowEngine, WorkflowParameters, WorkflowRun, CONTRACT_ID_PARAM,
};
