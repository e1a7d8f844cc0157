//! Request and outcome types for the orchestrator

use crate::workflow::WorkflowRun;
use contract_types::{ContractId, ContractQuota, CspId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials handed to the CSP provisioner; never logged
#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct CspCredentials(String);

impl CspCredentials {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CspCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CspCredentials(***)")
    }
}

/// Input to contract creation
#[derive(Debug, Clone)]
pub struct NewContract {
    pub contractor_name: String,
    pub available_services: Vec<String>,
    pub quota: ContractQuota,
    pub csp_name: String,
    pub csp_auth: CspCredentials,
}

impl NewContract {
    pub fn new(contractor_name: impl Into<String>, csp_name: impl Into<String>) -> Self {
        Self {
            contractor_name: contractor_name.into(),
            available_services: Vec::new(),
            quota: ContractQuota::default(),
            csp_name: csp_name.into(),
            csp_auth: CspCredentials::default(),
        }
    }

    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_services = services.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_quota(mut self, quota: ContractQuota) -> Self {
        self.quota = quota;
        self
    }

    pub fn with_csp_auth(mut self, auth: CspCredentials) -> Self {
        self.csp_auth = auth;
        self
    }
}

/// Successful result of contract creation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CreateOutcome {
    /// Record stored, CSP account bound, provisioning workflow submitted
    Created {
        contract_id: ContractId,
        csp_id: CspId,
        workflow: WorkflowRun,
    },

    /// A provisioning workflow for this contract was already running, so
    /// nothing new was submitted
    AlreadyProvisioning {
        contract_id: ContractId,
        csp_id: CspId,
    },
}

impl CreateOutcome {
    pub fn contract_id(&self) -> ContractId {
        match self {
            CreateOutcome::Created { contract_id, .. }
            | CreateOutcome::AlreadyProvisioning { contract_id, .. } => *contract_id,
        }
    }

    pub fn csp_id(&self) -> &CspId {
        match self {
            CreateOutcome::Created { csp_id, .. }
            | CreateOutcome::AlreadyProvisioning { csp_id, .. } => csp_id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created { .. })
    }

    /// Advisory text for callers, present only for no-op outcomes
    pub fn warning(&self) -> Option<String> {
        match self {
            CreateOutcome::Created { .. } => None,
            CreateOutcome::AlreadyProvisioning { contract_id, .. } => Some(format!(
                "Already running workflow. contractId : {}",
                contract_id
            )),
        }
    }
}

/// Field value before and after a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Updated<T> {
    pub previous: T,
    pub current: T,
}

impl<T> Updated<T> {
    pub fn new(previous: T, current: T) -> Self {
        Self { previous, current }
    }
}
