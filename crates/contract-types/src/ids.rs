//! Strongly-typed identifiers for contract entities
//!
//! Contract IDs are UUIDs; their external string form is the hyphenated UUID
//! with no prefix, since it is handed verbatim to the CSP provisioner and the
//! workflow engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Raised when an external contract ID string is not a UUID
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid contract ID {raw}")]
pub struct InvalidContractId {
    pub raw: String,
}

/// Unique identifier for a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(Uuid);

impl ContractId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse the external string form
    pub fn parse(raw: &str) -> Result<Self, InvalidContractId> {
        Uuid::parse_str(raw).map(Self).map_err(|_| InvalidContractId {
            raw: raw.to_string(),
        })
    }
}

impl FromStr for ContractId {
    type Err = InvalidContractId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a CSP account, issued by the CSP provisioner
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CspId(String);

impl CspId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CspId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_id_generation() {
        let id1 = ContractId::generate();
        let id2 = ContractId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_contract_id_display_is_bare_uuid() {
        let id = ContractId::generate();
        let display = id.to_string();
        assert_eq!(display, id.as_uuid().to_string());
        assert_eq!(ContractId::parse(&display).unwrap(), id);
    }

    #[test]
    fn test_contract_id_rejects_malformed() {
        for raw in ["", "not-a-uuid", "1234", "0000-0000"] {
            let err = ContractId::parse(raw).unwrap_err();
            assert_eq!(err.to_string(), format!("invalid contract ID {}", raw));
        }
    }

    #[test]
    fn test_contract_id_serializes_as_string() {
        let id = ContractId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
