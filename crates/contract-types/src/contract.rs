//! Contract record
//!
//! A Contract is created once, gets its CSP account bound once, and then has
//! its quota and service list updated any number of times. It is never deleted.

use crate::{ContractId, ContractQuota, CspId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    /// Owner label, set at creation
    pub contractor_name: String,

    /// Store-assigned identifier
    #[serde(rename = "contractID")]
    pub id: ContractId,

    /// Services this contract may use, in request order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_services: Vec<String>,

    /// Bound CSP account, absent until provisioning succeeds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csp_id: Option<CspId>,

    /// Time of the last mutation, Unix seconds on the wire
    #[serde(rename = "lastUpdatedTs", with = "chrono::serde::ts_seconds")]
    pub last_updated: DateTime<Utc>,

    /// Resource quota
    pub quota: ContractQuota,
}

impl Contract {
    /// Build a fresh record with no CSP account bound
    pub fn new(
        id: ContractId,
        contractor_name: impl Into<String>,
        available_services: Vec<String>,
        quota: ContractQuota,
    ) -> Self {
        Self {
            contractor_name: contractor_name.into(),
            id,
            available_services: normalize_services(available_services),
            csp_id: None,
            last_updated: Utc::now(),
            quota,
        }
    }

    pub fn has_csp(&self) -> bool {
        self.csp_id.is_some()
    }

    /// Mark the record as mutated now
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

/// Drop repeated service names, keeping first-seen order
pub fn normalize_services(services: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(services.len());
    services
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
