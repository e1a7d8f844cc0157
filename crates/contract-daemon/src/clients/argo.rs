//! Argo Workflows client
//!
//! Talks to the Argo server REST API. A contract counts as "running" when a
//! workflow in the `Running` phase carries its ID in the `contract_id`
//! argument.

use super::http_client;
use async_trait::async_trait;
use chrono::Utc;
use contract_control::{
    WorkflowEngine, WorkflowError, WorkflowParameters, WorkflowRun, CONTRACT_ID_PARAM,
};
use contract_types::ContractId;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

const PHASE_LABEL: &str = "workflows.argoproj.io/phase";

#[derive(Debug, Default, Deserialize)]
struct WorkflowList {
    #[serde(default)]
    items: Option<Vec<Workflow>>,
}

#[derive(Debug, Default, Deserialize)]
struct Workflow {
    #[serde(default)]
    metadata: WorkflowMetadata,
    #[serde(default)]
    spec: WorkflowSpec,
}

#[derive(Debug, Default, Deserialize)]
struct WorkflowMetadata {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkflowSpec {
    #[serde(default)]
    arguments: Arguments,
}

#[derive(Debug, Default, Deserialize)]
struct Arguments {
    #[serde(default)]
    parameters: Vec<Parameter>,
}

#[derive(Debug, Deserialize)]
struct Parameter {
    name: String,
    #[serde(default)]
    value: Option<String>,
}

impl Workflow {
    fn parameter(&self, name: &str) -> Option<&str> {
        self.spec
            .arguments
            .parameters
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_deref())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    namespace: &'a str,
    resource_kind: &'static str,
    resource_name: &'a str,
    submit_options: SubmitOptions,
}

#[derive(Debug, Serialize)]
struct SubmitOptions {
    parameters: Vec<String>,
}

/// Workflow engine backed by an Argo server
pub struct ArgoWorkflowEngine {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ArgoWorkflowEngine {
    pub fn new(
        endpoint: &str,
        timeout_secs: u64,
        token: Option<String>,
    ) -> Result<Self, WorkflowError> {
        let client =
            http_client(timeout_secs).map_err(|e| WorkflowError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, WorkflowError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| WorkflowError::Transport(e.to_string()))?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, WorkflowError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WorkflowError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| WorkflowError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl WorkflowEngine for ArgoWorkflowEngine {
    async fn has_running_workflow(
        &self,
        namespace: &str,
        contract_id: &ContractId,
    ) -> Result<bool, WorkflowError> {
        let url = format!("{}/api/v1/workflows/{}", self.base_url, namespace);
        let selector = format!("{}=Running", PHASE_LABEL);
        let request = self
            .client
            .get(&url)
            .query(&[("listOptions.labelSelector", selector.as_str())]);

        let list: WorkflowList = self.send(request).await?;
        let wanted = contract_id.to_string();
        let running = list
            .items
            .unwrap_or_default()
            .iter()
            .any(|wf| wf.parameter(CONTRACT_ID_PARAM) == Some(wanted.as_str()));

        debug!(namespace, contract_id = %contract_id, running, "Checked running workflows");
        Ok(running)
    }

    async fn submit_workflow_template(
        &self,
        template: &str,
        namespace: &str,
        parameters: &WorkflowParameters,
    ) -> Result<WorkflowRun, WorkflowError> {
        let url = format!("{}/api/v1/workflows/{}/submit", self.base_url, namespace);
        let body = SubmitRequest {
            namespace,
            resource_kind: "WorkflowTemplate",
            resource_name: template,
            submit_options: SubmitOptions {
                parameters: parameters.to_assignments(),
            },
        };

        let workflow: Workflow = self.send(self.client.post(&url).json(&body)).await?;
        if workflow.metadata.name.is_empty() {
            return Err(WorkflowError::InvalidResponse(
                "submitted workflow has no name".to_string(),
            ));
        }

        Ok(WorkflowRun {
            name: workflow.metadata.name,
            namespace: workflow
                .metadata
                .namespace
                .unwrap_or_else(|| namespace.to_string()),
            template: template.to_string(),
            submitted_at: Utc::now(),
        })
    }
}
