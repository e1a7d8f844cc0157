//! Builder for ContractOrchestrator
//!
//! Every collaborator must be supplied explicitly; there are no process-wide
//! client handles.

use crate::orchestrator::{ContractOrchestrator, ProvisioningSettings};
use crate::provisioner::CspProvisioner;
use crate::store::ContractStore;
use crate::workflow::WorkflowEngine;
use std::sync::Arc;
use thiserror::Error;

/// Missing collaborator at build time
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0} is required")]
pub struct BuildError(&'static str);

/// Builder for constructing a ContractOrchestrator with all dependencies
#[derive(Default)]
pub struct ContractOrchestratorBuilder {
    store: Option<Arc<dyn ContractStore>>,
    csp: Option<Arc<dyn CspProvisioner>>,
    workflow: Option<Arc<dyn WorkflowEngine>>,
    settings: Option<ProvisioningSettings>,
}

impl ContractOrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the contract store
    pub fn with_store(mut self, store: Arc<dyn ContractStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the CSP provisioner client
    pub fn with_csp_provisioner(mut self, csp: Arc<dyn CspProvisioner>) -> Self {
        self.csp = Some(csp);
        self
    }

    /// Set the workflow engine client
    pub fn with_workflow_engine(mut self, workflow: Arc<dyn WorkflowEngine>) -> Self {
        self.workflow = Some(workflow);
        self
    }

    /// Override namespace and template (defaults otherwise)
    pub fn with_settings(mut self, settings: ProvisioningSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn build(self) -> Result<ContractOrchestrator, BuildError> {
        Ok(ContractOrchestrator::new(
            self.store.ok_or(BuildError("contract store"))?,
            self.csp.ok_or(BuildError("CSP provisioner"))?,
            self.workflow.ok_or(BuildError("workflow engine"))?,
            self.settings.unwrap_or_default(),
        ))
    }
}
