//! Contract store seam
//!
//! The store owns every durable contract field and is solely responsible for
//! serializing concurrent mutations of the same contract. Mutations return the
//! value before and after the change.

use crate::error::StoreError;
use crate::outcome::Updated;
use async_trait::async_trait;
use contract_types::{contract::normalize_services, Contract, ContractId, ContractQuota, CspId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable keyed store of contract records
#[async_trait]
pub trait ContractStore: Send + Sync {
    /// Persist a new contract and return its freshly assigned ID
    async fn create(
        &self,
        contractor_name: &str,
        available_services: Vec<String>,
        quota: ContractQuota,
    ) -> StoreResult<ContractId>;

    /// Point lookup
    async fn get(&self, id: &ContractId) -> StoreResult<Contract>;

    /// Replace the quota, returning previous and current values
    async fn update_quota(
        &self,
        id: &ContractId,
        quota: ContractQuota,
    ) -> StoreResult<Updated<ContractQuota>>;

    /// Replace the service list, returning previous and current values
    ///
    /// The list is stored as an ordered set: repeated names are dropped,
    /// keeping the first occurrence, so `current` differs from the input
    /// when the input has duplicates.
    async fn update_services(
        &self,
        id: &ContractId,
        available_services: Vec<String>,
    ) -> StoreResult<Updated<Vec<String>>>;

    /// Record the CSP account for a contract; fails if one is already bound
    async fn bind_csp(&self, id: &ContractId, csp_id: &CspId) -> StoreResult<()>;
}

/// In-memory contract store for development and testing
#[derive(Debug, Clone, Default)]
pub struct InMemoryContractStore {
    contracts: Arc<RwLock<HashMap<ContractId, Contract>>>,
}

impl InMemoryContractStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored contracts
    pub async fn len(&self) -> usize {
        self.contracts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contracts.read().await.is_empty()
    }

    /// Whether a record exists for `id`
    pub async fn contains(&self, id: &ContractId) -> bool {
        self.contracts.read().await.contains_key(id)
    }
}

#[async_trait]
impl ContractStore for InMemoryContractStore {
    async fn create(
        &self,
        contractor_name: &str,
        available_services: Vec<String>,
        quota: ContractQuota,
    ) -> StoreResult<ContractId> {
        let mut contracts = self.contracts.write().await;

        let mut id = ContractId::generate();
        while contracts.contains_key(&id) {
            id = ContractId::generate();
        }

        contracts.insert(
            id,
            Contract::new(id, contractor_name, available_services, quota),
        );
        debug!(contract_id = %id, "Stored contract");

        Ok(id)
    }

    async fn get(&self, id: &ContractId) -> StoreResult<Contract> {
        let contracts = self.contracts.read().await;
        contracts.get(id).cloned().ok_or(StoreError::NotFound(*id))
    }

    async fn update_quota(
        &self,
        id: &ContractId,
        quota: ContractQuota,
    ) -> StoreResult<Updated<ContractQuota>> {
        let mut contracts = self.contracts.write().await;
        let contract = contracts.get_mut(id).ok_or(StoreError::NotFound(*id))?;

        let previous = std::mem::replace(&mut contract.quota, quota);
        contract.touch();

        Ok(Updated::new(previous, contract.quota))
    }

    async fn update_services(
        &self,
        id: &ContractId,
        available_services: Vec<String>,
    ) -> StoreResult<Updated<Vec<String>>> {
        let mut contracts = self.contracts.write().await;
        let contract = contracts.get_mut(id).ok_or(StoreError::NotFound(*id))?;

        let previous = std::mem::replace(
            &mut contract.available_services,
            normalize_services(available_services),
        );
        contract.touch();

        Ok(Updated::new(previous, contract.available_services.clone()))
    }

    async fn bind_csp(&self, id: &ContractId, csp_id: &CspId) -> StoreResult<()> {
        let mut contracts = self.contracts.write().await;
        let contract = contracts.get_mut(id).ok_or(StoreError::NotFound(*id))?;

        if let Some(existing) = &contract.csp_id {
            return Err(StoreError::CspAlreadyBound {
                contract_id: *id,
                csp_id: existing.clone(),
            });
        }

        contract.csp_id = Some(csp_id.clone());
        contract.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn services(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_assigns_fresh_ids() {
        let store = InMemoryContractStore::new();
        let a = store.create("acme", vec![], ContractQuota::default()).await.unwrap();
        let b = store.create("acme", vec![], ContractQuota::default()).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = InMemoryContractStore::new();
        let id = ContractId::generate();
        assert!(matches!(store.get(&id).await, Err(StoreError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_update_quota_returns_previous_and_current() {
        let store = InMemoryContractStore::new();
        let id = store
            .create("acme", services(&["build"]), ContractQuota::compute(4, 16))
            .await
            .unwrap();

        let updated = store.update_quota(&id, ContractQuota::compute(8, 16)).await.unwrap();
        assert_eq!(updated.previous.cpu, 4);
        assert_eq!(updated.current.cpu, 8);
        assert_eq!(store.get(&id).await.unwrap().quota.cpu, 8);
    }

    #[tokio::test]
    async fn test_update_services_returns_previous_and_current() {
        let store = InMemoryContractStore::new();
        let id = store
            .create("acme", services(&["build", "deploy"]), ContractQuota::default())
            .await
            .unwrap();

        let updated = store.update_services(&id, services(&["lma"])).await.unwrap();
        assert_eq!(updated.previous, services(&["build", "deploy"]));
        assert_eq!(updated.current, services(&["lma"]));
    }

    #[tokio::test]
    async fn test_update_services_drops_repeated_names() {
        let store = InMemoryContractStore::new();
        let id = store.create("acme", vec![], ContractQuota::default()).await.unwrap();

        let updated = store
            .update_services(&id, services(&["lma", "build", "lma"]))
            .await
            .unwrap();
        assert_eq!(updated.current, services(&["lma", "build"]));
        assert_eq!(store.get(&id).await.unwrap().available_services, updated.current);
    }

    #[tokio::test]
    async fn test_bind_csp_only_once() {
        let store = InMemoryContractStore::new();
        let id = store.create("acme", vec![], ContractQuota::default()).await.unwrap();

        store.bind_csp(&id, &CspId::new("csp-1")).await.unwrap();
        let err = store.bind_csp(&id, &CspId::new("csp-2")).await.unwrap_err();

        assert!(matches!(err, StoreError::CspAlreadyBound { ref csp_id, .. } if csp_id.as_str() == "csp-1"));
        assert_eq!(store.get(&id).await.unwrap().csp_id, Some(CspId::new("csp-1")));
    }

    #[tokio::test]
    async fn test_concurrent_quota_updates_serialize() {
        let store = InMemoryContractStore::new();
        let id = store.create("acme", vec![], ContractQuota::compute(0, 0)).await.unwrap();

        let mut handles = Vec::new();
        for cpu in 1..=16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.update_quota(&id, ContractQuota::compute(cpu, 0)).await.unwrap()
            }));
        }

        let mut previous: Vec<i64> = Vec::new();
        for handle in handles {
            previous.push(handle.await.unwrap().previous.cpu);
        }

        // Each write observed a distinct predecessor
        previous.sort_unstable();
        previous.dedup();
        assert_eq!(previous.len(), 16);
    }
}
