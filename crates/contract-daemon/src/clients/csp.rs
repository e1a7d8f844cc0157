//! HTTP client for the CSP info service

use super::http_client;
use async_trait::async_trait;
use contract_control::{CspAccountReply, CspCredentials, CspProvisioner, ProvisionerError};
use contract_types::ContractId;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCspInfoRequest<'a> {
    contract_id: String,
    csp_name: &'a str,
    auth: &'a str,
}

/// CSP provisioner backed by the CSP info service REST API
pub struct HttpCspProvisioner {
    client: Client,
    base_url: String,
}

impl HttpCspProvisioner {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, ProvisionerError> {
        let client =
            http_client(timeout_secs).map_err(|e| ProvisionerError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CspProvisioner for HttpCspProvisioner {
    async fn create_account(
        &self,
        contract_id: &ContractId,
        csp_name: &str,
        csp_auth: &CspCredentials,
    ) -> Result<CspAccountReply, ProvisionerError> {
        let url = format!("{}/api/v1/csp-infos", self.base_url);
        let body = CreateCspInfoRequest {
            contract_id: contract_id.to_string(),
            csp_name,
            auth: csp_auth.expose(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProvisionerError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProvisionerError::Transport(e.to_string()))?;
        debug!(%status, contract_id = %contract_id, "CSP info service replied");

        // Rejections arrive with a non-2xx status but still carry a coded body
        serde_json::from_slice::<CspAccountReply>(&bytes).map_err(|e| {
            if status.is_success() {
                ProvisionerError::InvalidResponse(e.to_string())
            } else {
                ProvisionerError::InvalidResponse(format!("HTTP {}", status))
            }
        })
    }
}
