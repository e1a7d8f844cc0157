//! Contract handlers
//!
//! Every response carries a result `code` and, when there is something to
//! report, an `error.msg`. A creation that finds its provisioning workflow
//! already running answers `OK` with an explanatory `error.msg`, so callers
//! must check the message even on success.

use crate::api::rest::state::AppState;
use crate::error::{ApiResult, ErrorBody};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use contract_control::{ContractError, CreateOutcome, CspCredentials, NewContract};
use contract_types::{Code, Contract, ContractId, ContractQuota, CspId};
use serde::{Deserialize, Serialize};

/// A malformed path id outranks a malformed body
fn validate_id(raw: &str) -> Result<(), ContractError> {
    ContractId::parse(raw)?;
    Ok(())
}

/// Create contract request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractRequest {
    pub contractor_name: String,
    #[serde(default)]
    pub available_services: Vec<String>,
    #[serde(default)]
    pub quota: ContractQuota,
    pub csp_name: String,
    #[serde(default)]
    pub csp_auth: CspCredentials,
}

impl From<CreateContractRequest> for NewContract {
    fn from(request: CreateContractRequest) -> Self {
        NewContract {
            contractor_name: request.contractor_name,
            available_services: request.available_services,
            quota: request.quota,
            csp_name: request.csp_name,
            csp_auth: request.csp_auth,
        }
    }
}

/// Create contract response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractResponse {
    pub code: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub contract_id: ContractId,
    pub csp_id: CspId,
}

impl From<CreateOutcome> for CreateContractResponse {
    fn from(outcome: CreateOutcome) -> Self {
        Self {
            code: Code::Ok,
            error: outcome.warning().map(ErrorBody::new),
            contract_id: outcome.contract_id(),
            csp_id: outcome.csp_id().clone(),
        }
    }
}

/// Create a contract and start its provisioning
pub async fn create_contract(
    State(state): State<AppState>,
    payload: Result<Json<CreateContractRequest>, JsonRejection>,
) -> ApiResult<Json<CreateContractResponse>> {
    let Json(request) = payload?;
    let outcome = state.orchestrator.create_contract(request.into()).await?;
    Ok(Json(outcome.into()))
}

/// Update quota request
#[derive(Debug, Deserialize)]
pub struct UpdateQuotaRequest {
    pub quota: ContractQuota,
}

/// Update quota response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuotaResponse {
    pub code: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub prev_quota: ContractQuota,
    pub current_quota: ContractQuota,
}

/// Replace a contract's quota
pub async fn update_quota(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateQuotaRequest>, JsonRejection>,
) -> ApiResult<Json<UpdateQuotaResponse>> {
    validate_id(&id)?;
    let Json(request) = payload?;
    let updated = state.orchestrator.update_quota(&id, request.quota).await?;

    Ok(Json(UpdateQuotaResponse {
        code: Code::Ok,
        error: None,
        prev_quota: updated.previous,
        current_quota: updated.current,
    }))
}

/// Update services request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServicesRequest {
    pub available_services: Vec<String>,
}

/// Update services response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServicesResponse {
    pub code: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub prev_services: Vec<String>,
    pub current_services: Vec<String>,
}

/// Replace a contract's service list
pub async fn update_services(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateServicesRequest>, JsonRejection>,
) -> ApiResult<Json<UpdateServicesResponse>> {
    validate_id(&id)?;
    let Json(request) = payload?;
    let updated = state
        .orchestrator
        .update_services(&id, request.available_services)
        .await?;

    Ok(Json(UpdateServicesResponse {
        code: Code::Ok,
        error: None,
        prev_services: updated.previous,
        current_services: updated.current,
    }))
}

/// Get contract response
#[derive(Debug, Serialize, Deserialize)]
pub struct GetContractResponse {
    pub code: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub contract: Contract,
}

/// Get a contract
pub async fn get_contract(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<GetContractResponse>> {
    let contract = state.orchestrator.get_contract(&id).await?;

    Ok(Json(GetContractResponse {
        code: Code::Ok,
        error: None,
        contract,
    }))
}

/// Get quota response
#[derive(Debug, Serialize, Deserialize)]
pub struct GetQuotaResponse {
    pub code: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub quota: ContractQuota,
}

/// Get a contract's quota
pub async fn get_quota(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<GetQuotaResponse>> {
    let quota = state.orchestrator.get_quota(&id).await?;

    Ok(Json(GetQuotaResponse {
        code: Code::Ok,
        error: None,
        quota,
    }))
}

/// Get available services response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAvailableServicesResponse {
    pub code: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub available_services: Vec<String>,
}

/// Get a contract's service list
pub async fn get_available_services(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<GetAvailableServicesResponse>> {
    let available_services = state.orchestrator.get_available_services(&id).await?;

    Ok(Json(GetAvailableServicesResponse {
        code: Code::Ok,
        error: None,
        available_services,
    }))
}
