//! Error types for contract orchestration
//!
//! Each collaborator has its own error enum. [`ContractError`] classifies
//! collaborator failures by the step they happened in and carries the result
//! code reported to callers.

use contract_types::{Code, ContractId, CspId, InvalidContractId};
use thiserror::Error;

/// Contract store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No record for the given ID
    #[error("could not find contract for contract id {0}")]
    NotFound(ContractId),

    /// CSP account already bound
    #[error("contract {contract_id} is already bound to CSP account {csp_id}")]
    CspAlreadyBound {
        contract_id: ContractId,
        csp_id: CspId,
    },

    /// Record rejected or unreadable
    #[error("invalid contract data: {0}")]
    InvalidData(String),

    /// Backend unreachable
    #[error("store connection error: {0}")]
    Connection(String),

    /// Backend query failed
    #[error("store query error: {0}")]
    Query(String),
}

/// CSP provisioner client errors
#[derive(Debug, Clone, Error)]
pub enum ProvisionerError {
    /// Request never produced a reply
    #[error("CSP provisioner unreachable: {0}")]
    Transport(String),

    /// Reply could not be interpreted
    #[error("invalid reply from CSP provisioner: {0}")]
    InvalidResponse(String),
}

/// Workflow engine client errors
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    #[error("workflow engine unreachable: {0}")]
    Transport(String),

    #[error("workflow engine returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid reply from workflow engine: {0}")]
    InvalidResponse(String),
}

/// Orchestrator error, classified by failing step
#[derive(Debug, Error)]
pub enum ContractError {
    /// Malformed contract ID, no collaborator was contacted
    #[error(transparent)]
    InvalidContractId(#[from] InvalidContractId),

    /// Creating the record failed
    #[error("{0}")]
    CreateFailed(StoreError),

    /// Reading the record failed
    #[error("{0}")]
    LookupFailed(StoreError),

    /// Updating quota or services failed
    #[error("{0}")]
    UpdateFailed(StoreError),

    /// The CSP provisioner answered with a non-success code
    #[error("{message}")]
    CspRejected { code: Code, message: String },

    /// The CSP provisioner could not be called or answered garbage
    #[error("{0}")]
    CspProvisioning(ProvisionerError),

    /// Recording the CSP account on the contract failed
    #[error("failed to bind CSP account: {0}")]
    CspBindFailed(StoreError),

    /// The running-workflow check failed
    #[error("failed to query running workflows: {0}")]
    WorkflowQuery(WorkflowError),

    /// Submitting the provisioning workflow failed
    #[error("failed to call workflow engine: {0}")]
    WorkflowSubmit(WorkflowError),
}

/// Result type for orchestrator operations
pub type Result<T> = std::result::Result<T, ContractError>;

impl ContractError {
    /// Result code reported to the caller
    pub fn code(&self) -> Code {
        match self {
            ContractError::InvalidContractId(_) => Code::InvalidArgument,
            ContractError::CreateFailed(_) => Code::NotFound,
            ContractError::LookupFailed(StoreError::NotFound(_)) => Code::NotFound,
            ContractError::LookupFailed(_) => Code::Internal,
            ContractError::UpdateFailed(_) => Code::Internal,
            ContractError::CspRejected { code, .. } => *code,
            ContractError::CspProvisioning(_) => Code::Internal,
            ContractError::CspBindFailed(_) => Code::Internal,
            ContractError::WorkflowQuery(_) => Code::Internal,
            ContractError::WorkflowSubmit(_) => Code::Internal,
        }
    }

    /// Whether a contract record may exist despite this failure
    pub fn left_partial_state(&self) -> bool {
        matches!(
            self,
            ContractError::CspRejected { .. }
                | ContractError::CspProvisioning(_)
                | ContractError::CspBindFailed(_)
                | ContractError::WorkflowQuery(_)
                | ContractError::WorkflowSubmit(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_by_step() {
        let id = ContractId::generate();

        assert_eq!(
            ContractError::CreateFailed(StoreError::Query("boom".into())).code(),
            Code::NotFound
        );
        assert_eq!(
            ContractError::LookupFailed(StoreError::NotFound(id)).code(),
            Code::NotFound
        );
        assert_eq!(
            ContractError::LookupFailed(StoreError::Connection("down".into())).code(),
            Code::Internal
        );
        assert_eq!(
            ContractError::UpdateFailed(StoreError::NotFound(id)).code(),
            Code::Internal
        );
    }

    #[test]
    fn test_store_message_is_verbatim() {
        let err = ContractError::CreateFailed(StoreError::Query("duplicate key".into()));
        assert_eq!(err.to_string(), "store query error: duplicate key");
    }

    #[test]
    fn test_csp_code_passes_through() {
        let err = ContractError::CspRejected {
            code: Code::PermissionDenied,
            message: "bad credentials".into(),
        };
        assert_eq!(err.code(), Code::PermissionDenied);
        assert_eq!(err.to_string(), "bad credentials");
        assert!(err.left_partial_state());
    }

    #[test]
    fn test_workflow_submit_message_is_wrapped() {
        let err = ContractError::WorkflowSubmit(WorkflowError::Transport("refused".into()));
        assert_eq!(err.code(), Code::Internal);
        assert_eq!(
            err.to_string(),
            "failed to call workflow engine: workflow engine unreachable: refused"
        );
    }

    #[test]
    fn test_invalid_id_message() {
        let err: ContractError = ContractId::parse("nope").unwrap_err().into();
        assert_eq!(err.code(), Code::InvalidArgument);
        assert_eq!(err.to_string(), "invalid contract ID nope");
        assert!(!err.left_partial_state());
    }
}
