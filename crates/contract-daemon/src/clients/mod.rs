//! Outbound clients for the CSP info service and the Argo workflow server

mod argo;
mod csp;

pub use argo::ArgoWorkflowEngine;
pub use csp::HttpCspProvisioner;

use reqwest::Client;
use std::time::Duration;

fn http_client(timeout_secs: u64) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

#[cfg(test)]
pub(crate) mod fake {
    use axum::Router;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral local port and return its base URL
    pub async fn serve(router: Router) -> String {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Base URL of a local port that was bound and released
    pub async fn closed_port() -> String {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }
}
