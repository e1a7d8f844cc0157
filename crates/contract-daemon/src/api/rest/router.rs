//! API Router configuration

use super::handlers;
use super::state::AppState;
use crate::config::ServerConfig;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/contracts", post(handlers::create_contract))
        .route("/contracts/:id", get(handlers::get_contract))
        .route(
            "/contracts/:id/quota",
            get(handlers::get_quota).put(handlers::update_quota),
        )
        .route(
            "/contracts/:id/services",
            get(handlers::get_available_services).put(handlers::update_services),
        );

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(DefaultBodyLimit::max(server.max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if server.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use contract_control::{
        ContractOrchestratorBuilder, CspProvisioner, InMemoryContractStore,
        InMemoryCspProvisioner, InMemoryWorkflowEngine, WorkflowEngine, WorkflowError,
        WorkflowParameters, WorkflowRun,
    };
    use contract_types::{Code, ContractId};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Reports every contract as already provisioning
    struct BusyEngine;

    #[async_trait]
    impl WorkflowEngine for BusyEngine {
        async fn has_running_workflow(
            &self,
            _namespace: &str,
            _contract_id: &ContractId,
        ) -> Result<bool, WorkflowError> {
            Ok(true)
        }

        async fn submit_workflow_template(
            &self,
            _template: &str,
            _namespace: &str,
            _parameters: &WorkflowParameters,
        ) -> Result<WorkflowRun, WorkflowError> {
            panic!("a running workflow must not be resubmitted");
        }
    }

    fn router_with(csp: Arc<dyn CspProvisioner>, workflow: Arc<dyn WorkflowEngine>) -> Router {
        let orchestrator = ContractOrchestratorBuilder::new()
            .with_store(Arc::new(InMemoryContractStore::new()))
            .with_csp_provisioner(csp)
            .with_workflow_engine(workflow)
            .build()
            .unwrap();
        create_router(
            AppState::new(Arc::new(orchestrator)),
            &ServerConfig::default(),
        )
    }

    fn test_router() -> Router {
        router_with(
            Arc::new(InMemoryCspProvisioner::accepting()),
            Arc::new(InMemoryWorkflowEngine::new()),
        )
    }

    async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn acme() -> Value {
        json!({
            "contractorName": "acme",
            "availableServices": ["build", "deploy"],
            "quota": { "cpu": 4, "memory": 16 },
            "cspName": "aws",
            "cspAuth": "key:secret"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&test_router(), "GET", "/api/v1/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["workflow_namespace"], "argo");
    }

    #[tokio::test]
    async fn test_create_then_update_quota() {
        let router = test_router();

        let (status, created) = call(&router, "POST", "/api/v1/contracts", Some(acme())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["code"], "OK");
        assert!(created.get("error").is_none());
        let id = created["contractId"].as_str().unwrap().to_string();
        assert!(!created["cspId"].as_str().unwrap().is_empty());

        let (status, updated) = call(
            &router,
            "PUT",
            &format!("/api/v1/contracts/{}/quota", id),
            Some(json!({ "quota": { "cpu": 8, "memory": 16 } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["prevQuota"]["cpu"], 4);
        assert_eq!(updated["currentQuota"]["cpu"], 8);

        let (_, quota) = call(&router, "GET", &format!("/api/v1/contracts/{}/quota", id), None).await;
        assert_eq!(quota["quota"]["cpu"], 8);
    }

    #[tokio::test]
    async fn test_get_contract_and_services() {
        let router = test_router();
        let (_, created) = call(&router, "POST", "/api/v1/contracts", Some(acme())).await;
        let id = created["contractId"].as_str().unwrap().to_string();

        let (status, body) = call(&router, "GET", &format!("/api/v1/contracts/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["contract"]["contractorName"], "acme");
        assert_eq!(body["contract"]["contractID"], id.as_str());
        assert_eq!(body["contract"]["cspId"], created["cspId"]);

        let (status, updated) = call(
            &router,
            "PUT",
            &format!("/api/v1/contracts/{}/services", id),
            Some(json!({ "availableServices": ["monitor", "monitor", "build"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["prevServices"], json!(["build", "deploy"]));
        assert_eq!(updated["currentServices"], json!(["monitor", "build"]));

        let (_, services) = call(
            &router,
            "GET",
            &format!("/api/v1/contracts/{}/services", id),
            None,
        )
        .await;
        assert_eq!(services["availableServices"], json!(["monitor", "build"]));
    }

    #[tokio::test]
    async fn test_malformed_id_is_invalid_argument() {
        let (status, body) = call(&test_router(), "GET", "/api/v1/contracts/not-a-uuid", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");
        assert_eq!(body["error"]["msg"], "invalid contract ID not-a-uuid");
    }

    #[tokio::test]
    async fn test_undecodable_create_body_is_invalid_argument() {
        let (status, body) = call(
            &test_router(),
            "POST",
            "/api/v1/contracts",
            Some(json!({ "availableServices": ["build"] })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");
        assert!(body["error"]["msg"]
            .as_str()
            .unwrap()
            .contains("contractorName"));
    }

    #[tokio::test]
    async fn test_malformed_update_id_outranks_bad_body() {
        let router = test_router();

        for uri in [
            "/api/v1/contracts/not-a-uuid/quota",
            "/api/v1/contracts/not-a-uuid/services",
        ] {
            let (status, body) = call(&router, "PUT", uri, Some(json!({}))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["code"], "INVALID_ARGUMENT");
            assert_eq!(body["error"]["msg"], "invalid contract ID not-a-uuid");
        }
    }

    #[tokio::test]
    async fn test_undecodable_update_body_is_invalid_argument() {
        let router = test_router();
        let (_, created) = call(&router, "POST", "/api/v1/contracts", Some(acme())).await;
        let id = created["contractId"].as_str().unwrap().to_string();

        let (status, body) = call(
            &router,
            "PUT",
            &format!("/api/v1/contracts/{}/services", id),
            Some(json!({ "availableServices": "build" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");
        assert!(body["error"]["msg"]
            .as_str()
            .unwrap()
            .starts_with("invalid request body"));
    }

    #[tokio::test]
    async fn test_unknown_contract_is_not_found() {
        let router = test_router();
        let id = ContractId::generate();

        for uri in [
            format!("/api/v1/contracts/{}", id),
            format!("/api/v1/contracts/{}/quota", id),
            format!("/api/v1/contracts/{}/services", id),
        ] {
            let (status, body) = call(&router, "GET", &uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
            assert_eq!(body["code"], "NOT_FOUND");
        }
    }

    #[tokio::test]
    async fn test_update_of_unknown_contract_is_internal() {
        let (status, body) = call(
            &test_router(),
            "PUT",
            &format!("/api/v1/contracts/{}/quota", ContractId::generate()),
            Some(json!({ "quota": { "cpu": 1 } })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL");
    }

    #[tokio::test]
    async fn test_running_workflow_answers_ok_with_warning() {
        let router = router_with(
            Arc::new(InMemoryCspProvisioner::accepting()),
            Arc::new(BusyEngine),
        );

        let (status, body) = call(&router, "POST", "/api/v1/contracts", Some(acme())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "OK");
        let id = body["contractId"].as_str().unwrap();
        assert_eq!(
            body["error"]["msg"],
            format!("Already running workflow. contractId : {}", id)
        );
    }

    #[tokio::test]
    async fn test_csp_rejection_is_forwarded() {
        let router = router_with(
            Arc::new(InMemoryCspProvisioner::rejecting(
                Code::PermissionDenied,
                "invalid credentials",
            )),
            Arc::new(InMemoryWorkflowEngine::new()),
        );

        let (status, body) = call(&router, "POST", "/api/v1/contracts", Some(acme())).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "PERMISSION_DENIED");
        assert_eq!(body["error"]["msg"], "invalid credentials");
    }

    #[tokio::test]
    async fn test_workflow_submission_failure_is_internal() {
        let router = router_with(
            Arc::new(InMemoryCspProvisioner::accepting()),
            Arc::new(InMemoryWorkflowEngine::with_failing_submissions()),
        );

        let (status, body) = call(&router, "POST", "/api/v1/contracts", Some(acme())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL");
        assert!(body["error"]["msg"]
            .as_str()
            .unwrap()
            .starts_with("failed to call workflow engine"));
    }
}
