//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::clients::{ArgoWorkflowEngine, HttpCspProvisioner};
use crate::config::{CspConfig, DaemonConfig, StorageConfig, WorkflowBackend};
use crate::error::{DaemonError, DaemonResult};
use crate::storage::PostgresContractStore;
use contract_control::{
    ContractOrchestrator, ContractOrchestratorBuilder, ContractStore, CspProvisioner,
    InMemoryContractStore, InMemoryCspProvisioner, InMemoryWorkflowEngine, WorkflowEngine,
};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Contract daemon server
pub struct Server {
    config: DaemonConfig,
    orchestrator: Arc<ContractOrchestrator>,
}

impl Server {
    /// Create a new server, connecting the configured collaborators
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let store = build_store(&config.storage).await?;
        let csp = build_csp_provisioner(&config.csp)?;
        let workflow = build_workflow_engine(&config.workflow.backend)?;

        let orchestrator = ContractOrchestratorBuilder::new()
            .with_store(store)
            .with_csp_provisioner(csp)
            .with_workflow_engine(workflow)
            .with_settings(config.workflow.provisioning.clone())
            .build()?;

        Ok(Self {
            config,
            orchestrator: Arc::new(orchestrator),
        })
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        let state = AppState::new(self.orchestrator.clone());
        let app = create_router(state, &self.config.server);

        let listener = TcpListener::bind(addr).await?;

        let settings = self.orchestrator.settings();
        tracing::info!("Contract daemon listening on {}", addr);
        tracing::info!(
            namespace = %settings.namespace,
            template = %settings.template,
            "Provisioning workflow"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Contract daemon shutting down");

        Ok(())
    }
}

async fn build_store(config: &StorageConfig) -> DaemonResult<Arc<dyn ContractStore>> {
    match config {
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory contract store; contracts are lost on restart");
            Ok(Arc::new(InMemoryContractStore::new()))
        }
        StorageConfig::Postgres {
            url,
            max_connections,
            connect_timeout_secs,
        } => {
            let store =
                PostgresContractStore::new(url, *max_connections, *connect_timeout_secs).await?;
            tracing::info!("Connected to PostgreSQL contract store");
            Ok(Arc::new(store))
        }
    }
}

fn build_csp_provisioner(config: &CspConfig) -> DaemonResult<Arc<dyn CspProvisioner>> {
    match config {
        CspConfig::Memory => {
            tracing::warn!("Using in-process CSP provisioner");
            Ok(Arc::new(InMemoryCspProvisioner::accepting()))
        }
        CspConfig::Http {
            endpoint,
            timeout_secs,
        } => {
            let client = HttpCspProvisioner::new(endpoint, *timeout_secs)
                .map_err(|e| DaemonError::Client(e.to_string()))?;
            tracing::info!(endpoint = %endpoint, "Using CSP info service");
            Ok(Arc::new(client))
        }
    }
}

fn build_workflow_engine(config: &WorkflowBackend) -> DaemonResult<Arc<dyn WorkflowEngine>> {
    match config {
        WorkflowBackend::Memory => {
            tracing::warn!("Using in-process workflow engine; nothing is provisioned");
            Ok(Arc::new(InMemoryWorkflowEngine::new()))
        }
        WorkflowBackend::Argo {
            endpoint,
            timeout_secs,
            token,
        } => {
            let client = ArgoWorkflowEngine::new(endpoint, *timeout_secs, token.clone())
                .map_err(|e| DaemonError::Client(e.to_string()))?;
            tracing::info!(endpoint = %endpoint, "Using Argo workflow server");
            Ok(Arc::new(client))
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
