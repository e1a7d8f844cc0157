//! Workflow engine seam
//!
//! Provisioning runs out of process as a named workflow template. The
//! orchestrator only needs two things from the engine: whether a workflow for
//! a contract is already running, and a way to submit a new one.

use crate::error::WorkflowError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contract_types::ContractId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Parameter key carrying the contract ID into provisioning workflows
pub const CONTRACT_ID_PARAM: &str = "contract_id";

/// Ordered key/value parameters for a workflow submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowParameters(Vec<(String, String)>);

impl WorkflowParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters for a contract provisioning run
    pub fn for_contract(contract_id: &ContractId) -> Self {
        Self::new().with(CONTRACT_ID_PARAM, contract_id.to_string())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `key=value` strings, the form workflow engines take on submission
    pub fn to_assignments(&self) -> Vec<String> {
        self.iter().map(|(k, v)| format!("{}={}", k, v)).collect()
    }
}

/// Handle for a submitted workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub name: String,
    pub namespace: String,
    pub template: String,
    pub submitted_at: DateTime<Utc>,
}

/// Client for the workflow engine
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    /// Whether a provisioning workflow for `contract_id` is running in `namespace`
    async fn has_running_workflow(
        &self,
        namespace: &str,
        contract_id: &ContractId,
    ) -> Result<bool, WorkflowError>;

    /// Start `template` in `namespace` with `parameters`
    async fn submit_workflow_template(
        &self,
        template: &str,
        namespace: &str,
        parameters: &WorkflowParameters,
    ) -> Result<WorkflowRun, WorkflowError>;
}

/// In-process workflow engine for development and testing
///
/// Submitted workflows stay "running" until [`complete`](Self::complete) is
/// called for their contract.
#[derive(Default)]
pub struct InMemoryWorkflowEngine {
    running: Mutex<HashSet<(String, ContractId)>>,
    submitted: Mutex<Vec<(String, String, WorkflowParameters)>>,
    checks: AtomicUsize,
    submissions: AtomicUsize,
    fail_checks: bool,
    fail_submissions: bool,
}

impl InMemoryWorkflowEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose running-workflow query always fails
    pub fn with_failing_checks() -> Self {
        Self {
            fail_checks: true,
            ..Default::default()
        }
    }

    /// Engine that refuses every submission
    pub fn with_failing_submissions() -> Self {
        Self {
            fail_submissions: true,
            ..Default::default()
        }
    }

    /// Mark a workflow for `contract_id` as running
    pub fn seed_running(&self, namespace: &str, contract_id: ContractId) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((namespace.to_string(), contract_id));
    }

    /// Mark the workflow for `contract_id` as finished
    pub fn complete(&self, namespace: &str, contract_id: &ContractId) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(namespace.to_string(), *contract_id));
    }

    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// `(template, namespace, parameters)` of every accepted submission
    pub fn submitted(&self) -> Vec<(String, String, WorkflowParameters)> {
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl WorkflowEngine for InMemoryWorkflowEngine {
    async fn has_running_workflow(
        &self,
        namespace: &str,
        contract_id: &ContractId,
    ) -> Result<bool, WorkflowError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        if self.fail_checks {
            return Err(WorkflowError::Transport("simulated error".to_string()));
        }

        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(running.contains(&(namespace.to_string(), *contract_id)))
    }

    async fn submit_workflow_template(
        &self,
        template: &str,
        namespace: &str,
        parameters: &WorkflowParameters,
    ) -> Result<WorkflowRun, WorkflowError> {
        let seq = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_submissions {
            return Err(WorkflowError::Api {
                status: 500,
                message: "simulated error".to_string(),
            });
        }

        let contract_id = parameters
            .get(CONTRACT_ID_PARAM)
            .and_then(|raw| ContractId::parse(raw).ok());
        if let Some(contract_id) = contract_id {
            self.running
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert((namespace.to_string(), contract_id));
        }
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((template.to_string(), namespace.to_string(), parameters.clone()));

        Ok(WorkflowRun {
            name: format!("{}-{:05}", template, seq),
            namespace: namespace.to_string(),
            template: template.to_string(),
            submitted_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_parameters() {
        let id = ContractId::generate();
        let params = WorkflowParameters::for_contract(&id);
        assert_eq!(params.get(CONTRACT_ID_PARAM), Some(id.to_string().as_str()));
        assert_eq!(params.to_assignments(), vec![format!("contract_id={}", id)]);
    }

    #[tokio::test]
    async fn test_submission_marks_running() {
        let engine = InMemoryWorkflowEngine::new();
        let id = ContractId::generate();

        assert!(!engine.has_running_workflow("argo", &id).await.unwrap());
        engine
            .submit_workflow_template("tpl", "argo", &WorkflowParameters::for_contract(&id))
            .await
            .unwrap();
        assert!(engine.has_running_workflow("argo", &id).await.unwrap());
        assert!(!engine.has_running_workflow("other", &id).await.unwrap());

        engine.complete("argo", &id);
        assert!(!engine.has_running_workflow("argo", &id).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_get_distinct_names() {
        let engine = std::sync::Arc::new(InMemoryWorkflowEngine::new());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    let id = ContractId::generate();
                    engine
                        .submit_workflow_template(
                            "tpl",
                            "argo",
                            &WorkflowParameters::for_contract(&id),
                        )
                        .await
                        .unwrap()
                        .name
                })
            })
            .collect();

        let mut names = HashSet::new();
        for handle in handles {
            names.insert(handle.await.unwrap());
        }
        assert_eq!(names.len(), 32);
        assert_eq!(engine.submission_count(), 32);
    }

    #[tokio::test]
    async fn test_poisoned_lock_still_records_submissions() {
        let engine = std::sync::Arc::new(InMemoryWorkflowEngine::new());
        let holder = engine.clone();
        std::thread::spawn(move || {
            let _guard = holder.submitted.lock().unwrap();
            panic!("poison the submission log");
        })
        .join()
        .unwrap_err();

        let id = ContractId::generate();
        engine
            .submit_workflow_template("tpl", "argo", &WorkflowParameters::for_contract(&id))
            .await
            .unwrap();

        assert_eq!(engine.submitted().len(), 1);
        assert!(engine.has_running_workflow("argo", &id).await.unwrap());
    }
}
