//! PostgreSQL contract store
//!
//! Quota and service updates run in a transaction holding a row lock, so
//! concurrent updates of one contract are serialized and each sees the value
//! the previous one wrote.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contract_control::{ContractStore, StoreError, StoreResult, Updated};
use contract_types::{contract::normalize_services, Contract, ContractId, ContractQuota, CspId};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

/// PostgreSQL-backed contract store
#[derive(Debug, Clone)]
pub struct PostgresContractStore {
    pool: PgPool,
}

impl PostgresContractStore {
    /// Connect to PostgreSQL and initialize schema
    pub async fn new(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS contracts (
                id UUID PRIMARY KEY,
                contractor_name TEXT NOT NULL,
                available_services JSONB NOT NULL,
                csp_id TEXT,
                quota JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                last_updated_at TIMESTAMPTZ NOT NULL
            );
            "#,
            r#"CREATE INDEX IF NOT EXISTS contracts_contractor_name ON contracts(contractor_name);"#,
        ];

        for stmt in statements {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(query_error)?;
        }

        Ok(())
    }

    fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, StoreError> {
        serde_json::to_value(value)
            .map_err(|e| StoreError::InvalidData(format!("json serialize error: {}", e)))
    }

    fn from_json<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, StoreError> {
        serde_json::from_value(value)
            .map_err(|e| StoreError::InvalidData(format!("json deserialize error: {}", e)))
    }

    fn contract_from_row(row: PgRow) -> Result<Contract, StoreError> {
        let id: Uuid = row.try_get("id").map_err(query_error)?;
        let services: Value = row.try_get("available_services").map_err(query_error)?;
        let quota: Value = row.try_get("quota").map_err(query_error)?;
        let csp_id: Option<String> = row.try_get("csp_id").map_err(query_error)?;
        let last_updated: DateTime<Utc> = row.try_get("last_updated_at").map_err(query_error)?;

        Ok(Contract {
            contractor_name: row.try_get("contractor_name").map_err(query_error)?,
            id: ContractId::from_uuid(id),
            available_services: Self::from_json(services)?,
            csp_id: csp_id.map(CspId::new),
            last_updated,
            quota: Self::from_json(quota)?,
        })
    }
}

fn query_error(e: sqlx::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

#[async_trait]
impl ContractStore for PostgresContractStore {
    async fn create(
        &self,
        contractor_name: &str,
        available_services: Vec<String>,
        quota: ContractQuota,
    ) -> StoreResult<ContractId> {
        let id = ContractId::generate();
        let services = Self::to_json(&normalize_services(available_services))?;
        let quota = Self::to_json(&quota)?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO contracts
                (id, contractor_name, available_services, csp_id, quota, created_at, last_updated_at)
            VALUES ($1, $2, $3, NULL, $4, $5, $5)
            "#,
        )
        .bind(id.as_uuid())
        .bind(contractor_name)
        .bind(services)
        .bind(quota)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(id)
    }

    async fn get(&self, id: &ContractId) -> StoreResult<Contract> {
        let row = sqlx::query(
            r#"
            SELECT id, contractor_name, available_services, csp_id, quota, last_updated_at
            FROM contracts WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        match row {
            Some(row) => Self::contract_from_row(row),
            None => Err(StoreError::NotFound(*id)),
        }
    }

    async fn update_quota(
        &self,
        id: &ContractId,
        quota: ContractQuota,
    ) -> StoreResult<Updated<ContractQuota>> {
        let mut tx = self.pool.begin().await.map_err(query_error)?;

        let row = sqlx::query("SELECT quota FROM contracts WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?
            .ok_or(StoreError::NotFound(*id))?;
        let previous: ContractQuota =
            Self::from_json(row.try_get("quota").map_err(query_error)?)?;

        sqlx::query("UPDATE contracts SET quota = $2, last_updated_at = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(Self::to_json(&quota)?)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        Ok(Updated::new(previous, quota))
    }

    async fn update_services(
        &self,
        id: &ContractId,
        available_services: Vec<String>,
    ) -> StoreResult<Updated<Vec<String>>> {
        let current = normalize_services(available_services);
        let mut tx = self.pool.begin().await.map_err(query_error)?;

        let row = sqlx::query("SELECT available_services FROM contracts WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?
            .ok_or(StoreError::NotFound(*id))?;
        let previous: Vec<String> =
            Self::from_json(row.try_get("available_services").map_err(query_error)?)?;

        sqlx::query(
            "UPDATE contracts SET available_services = $2, last_updated_at = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(Self::to_json(&current)?)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        Ok(Updated::new(previous, current))
    }

    async fn bind_csp(&self, id: &ContractId, csp_id: &CspId) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE contracts SET csp_id = $2, last_updated_at = $3
            WHERE id = $1 AND csp_id IS NULL
            "#,
        )
        .bind(id.as_uuid())
        .bind(csp_id.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Either the contract is missing or it is already bound
        let existing = self.get(id).await?;
        Err(bind_conflict(id, existing.csp_id))
    }
}

/// Why a conditional bind touched no row, given the contract's current binding
fn bind_conflict(id: &ContractId, bound: Option<CspId>) -> StoreError {
    match bound {
        Some(csp_id) => StoreError::CspAlreadyBound {
            contract_id: *id,
            csp_id,
        },
        None => StoreError::Query(format!(
            "CSP bind for contract {} updated no row although it is unbound",
            id
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_conflict_reports_existing_account() {
        let id = ContractId::generate();

        let err = bind_conflict(&id, Some(CspId::new("aws-000001")));

        assert!(matches!(
            err,
            StoreError::CspAlreadyBound { contract_id, ref csp_id }
                if contract_id == id && csp_id.as_str() == "aws-000001"
        ));
    }

    #[test]
    fn test_unbound_row_is_query_error() {
        let id = ContractId::generate();

        let err = bind_conflict(&id, None);

        assert!(matches!(err, StoreError::Query(ref msg) if msg.contains(&id.to_string())));
    }
}
