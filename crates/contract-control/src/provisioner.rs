//! CSP provisioner seam
//!
//! The provisioner creates a CSP account for a contract. A reply always
//! carries a result code; any code other than `OK` is a rejection that the
//! orchestrator forwards to its caller unchanged.

use crate::error::ProvisionerError;
use crate::outcome::CspCredentials;
use async_trait::async_trait;
use contract_types::{Code, ContractId, CspId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Reply from the CSP provisioner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CspAccountReply {
    pub code: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CspId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CspAccountReply {
    pub fn created(id: CspId) -> Self {
        Self {
            code: Code::Ok,
            id: Some(id),
            message: None,
        }
    }

    pub fn rejected(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            id: None,
            message: Some(message.into()),
        }
    }
}

/// Client for the CSP provisioning service
#[async_trait]
pub trait CspProvisioner: Send + Sync {
    /// Create a CSP account bound to `contract_id`
    async fn create_account(
        &self,
        contract_id: &ContractId,
        csp_name: &str,
        csp_auth: &CspCredentials,
    ) -> Result<CspAccountReply, ProvisionerError>;
}

enum Behavior {
    Accept,
    Reject { code: Code, message: String },
    Unreachable,
}

/// In-process CSP provisioner for development and testing
///
/// Issues sequential account IDs and records every request it receives.
pub struct InMemoryCspProvisioner {
    behavior: Behavior,
    calls: AtomicUsize,
    requests: Mutex<Vec<(ContractId, String)>>,
}

impl InMemoryCspProvisioner {
    /// Provisioner that accepts every request
    pub fn accepting() -> Self {
        Self::with_behavior(Behavior::Accept)
    }

    /// Provisioner that answers every request with `code`
    pub fn rejecting(code: Code, message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Reject {
            code,
            message: message.into(),
        })
    }

    /// Provisioner whose transport always fails
    pub fn unreachable() -> Self {
        Self::with_behavior(Behavior::Unreachable)
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of `create_account` calls received
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(contract_id, csp_name)` of every request, in arrival order
    pub fn requests(&self) -> Vec<(ContractId, String)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for InMemoryCspProvisioner {
    fn default() -> Self {
        Self::accepting()
    }
}

#[async_trait]
impl CspProvisioner for InMemoryCspProvisioner {
    async fn create_account(
        &self,
        contract_id: &ContractId,
        csp_name: &str,
        _csp_auth: &CspCredentials,
    ) -> Result<CspAccountReply, ProvisionerError> {
        let seq = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((*contract_id, csp_name.to_string()));

        match &self.behavior {
            Behavior::Accept => Ok(CspAccountReply::created(CspId::new(format!(
                "{}-{:06}",
                csp_name, seq
            )))),
            Behavior::Reject { code, message } => Ok(CspAccountReply::rejected(*code, message.clone())),
            Behavior::Unreachable => Err(ProvisionerError::Transport(
                "connection refused".to_string(),
            )),
        }
    }
}
