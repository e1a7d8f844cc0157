//! Contract orchestrator
//!
//! Creation runs store → CSP provisioner → CSP binding → running-workflow
//! check → workflow submission, strictly in that order. The first failing step
//! ends the request. Nothing already done is undone: a contract record or CSP
//! account can outlive a failed request and is left for external
//! reconciliation.
//!
//! Updates and reads validate the contract ID before touching the store.

use crate::error::{ContractError, ProvisionerError, Result};
use crate::outcome::{CreateOutcome, NewContract, Updated};
use crate::provisioner::CspProvisioner;
use crate::store::ContractStore;
use crate::workflow::{WorkflowEngine, WorkflowParameters};
use contract_types::{Contract, ContractId, ContractQuota};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Default namespace provisioning workflows run in
pub const DEFAULT_WORKFLOW_NAMESPACE: &str = "argo";

/// Default provisioning workflow template
pub const DEFAULT_WORKFLOW_TEMPLATE: &str = "tks-create-contract-repo";

/// Where and what to submit for provisioning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningSettings {
    /// Namespace for both the running check and the submission
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Workflow template name
    #[serde(default = "default_template")]
    pub template: String,
}

impl Default for ProvisioningSettings {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            template: default_template(),
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_WORKFLOW_NAMESPACE.to_string()
}

fn default_template() -> String {
    DEFAULT_WORKFLOW_TEMPLATE.to_string()
}

/// Coordinates the contract store, CSP provisioner and workflow engine
///
/// Holds no per-request state; share it behind an `Arc` across handlers.
pub struct ContractOrchestrator {
    store: Arc<dyn ContractStore>,
    csp: Arc<dyn CspProvisioner>,
    workflow: Arc<dyn WorkflowEngine>,
    settings: ProvisioningSettings,
}

impl ContractOrchestrator {
    pub fn new(
        store: Arc<dyn ContractStore>,
        csp: Arc<dyn CspProvisioner>,
        workflow: Arc<dyn WorkflowEngine>,
        settings: ProvisioningSettings,
    ) -> Self {
        Self {
            store,
            csp,
            workflow,
            settings,
        }
    }

    pub fn settings(&self) -> &ProvisioningSettings {
        &self.settings
    }

    // ========== Creation ==========

    /// Create a contract and kick off its provisioning
    #[instrument(
        skip(self, request),
        fields(contractor = %request.contractor_name, csp = %request.csp_name)
    )]
    pub async fn create_contract(&self, request: NewContract) -> Result<CreateOutcome> {
        info!("Request 'CreateContract'");

        let contract_id = self
            .store
            .create(
                &request.contractor_name,
                request.available_services,
                request.quota,
            )
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to create contract record");
                ContractError::CreateFailed(e)
            })?;

        info!(contract_id = %contract_id, "Contract record created");

        let reply = self
            .csp
            .create_account(&contract_id, &request.csp_name, &request.csp_auth)
            .await
            .map_err(|e| {
                error!(contract_id = %contract_id, error = %e, "CSP provisioner call failed");
                ContractError::CspProvisioning(e)
            })?;

        if !reply.code.is_ok() {
            let message = reply
                .message
                .unwrap_or_else(|| format!("CSP provisioner returned {}", reply.code));
            error!(contract_id = %contract_id, code = %reply.code, %message, "CSP account rejected");
            return Err(ContractError::CspRejected {
                code: reply.code,
                message,
            });
        }

        let csp_id = reply.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            ContractError::CspProvisioning(ProvisionerError::InvalidResponse(
                "success reply without an account id".to_string(),
            ))
        })?;

        info!(contract_id = %contract_id, csp_id = %csp_id, "CSP account created");

        self.store
            .bind_csp(&contract_id, &csp_id)
            .await
            .map_err(|e| {
                error!(contract_id = %contract_id, error = %e, "Failed to bind CSP account");
                ContractError::CspBindFailed(e)
            })?;

        let namespace = &self.settings.namespace;
        let already_running = self
            .workflow
            .has_running_workflow(namespace, &contract_id)
            .await
            .map_err(|e| {
                error!(contract_id = %contract_id, error = %e, "Running-workflow check failed");
                ContractError::WorkflowQuery(e)
            })?;

        if already_running {
            warn!(contract_id = %contract_id, %namespace, "Already running workflow");
            return Ok(CreateOutcome::AlreadyProvisioning {
                contract_id,
                csp_id,
            });
        }

        let template = &self.settings.template;
        let workflow = self
            .workflow
            .submit_workflow_template(
                template,
                namespace,
                &WorkflowParameters::for_contract(&contract_id),
            )
            .await
            .map_err(|e| {
                error!(contract_id = %contract_id, %template, error = %e, "Failed to submit workflow template");
                ContractError::WorkflowSubmit(e)
            })?;

        debug!(workflow = %workflow.name, "Submitted workflow template");
        info!(contract_id = %contract_id, csp_id = %csp_id, "Contract created");

        Ok(CreateOutcome::Created {
            contract_id,
            csp_id,
            workflow,
        })
    }

    // ========== Updates ==========

    /// Replace a contract's quota
    #[instrument(skip_all, fields(contract_id = %raw_id))]
    pub async fn update_quota(
        &self,
        raw_id: &str,
        quota: ContractQuota,
    ) -> Result<Updated<ContractQuota>> {
        info!("Request 'UpdateQuota'");
        let id = ContractId::parse(raw_id)?;

        self.store
            .update_quota(&id, quota)
            .await
            .map_err(ContractError::UpdateFailed)
    }

    /// Replace a contract's service list
    ///
    /// Repeated names are dropped (first occurrence wins), so the returned
    /// `current` equals the input only when the input has no duplicates.
    #[instrument(skip_all, fields(contract_id = %raw_id))]
    pub async fn update_services(
        &self,
        raw_id: &str,
        available_services: Vec<String>,
    ) -> Result<Updated<Vec<String>>> {
        info!("Request 'UpdateServices'");
        let id = ContractId::parse(raw_id)?;

        self.store
            .update_services(&id, available_services)
            .await
            .map_err(ContractError::UpdateFailed)
    }

    // ========== Reads ==========

    /// Fetch a full contract record
    #[instrument(skip_all, fields(contract_id = %raw_id))]
    pub async fn get_contract(&self, raw_id: &str) -> Result<Contract> {
        info!("Request 'GetContract'");
        let id = ContractId::parse(raw_id)?;
        self.lookup(&id).await
    }

    /// Fetch a contract's quota
    #[instrument(skip_all, fields(contract_id = %raw_id))]
    pub async fn get_quota(&self, raw_id: &str) -> Result<ContractQuota> {
        info!("Request 'GetQuota'");
        let id = ContractId::parse(raw_id)?;
        Ok(self.lookup(&id).await?.quota)
    }

    /// Fetch a contract's service list
    #[instrument(skip_all, fields(contract_id = %raw_id))]
    pub async fn get_available_services(&self, raw_id: &str) -> Result<Vec<String>> {
        info!("Request 'GetAvailableServices'");
        let id = ContractId::parse(raw_id)?;
        Ok(self.lookup(&id).await?.available_services)
    }

    async fn lookup(&self, id: &ContractId) -> Result<Contract> {
        self.store
            .get(id)
            .await
            .map_err(ContractError::LookupFailed)
    }
}
