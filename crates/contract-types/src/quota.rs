//! Resource quota attached to a contract

use serde::{Deserialize, Serialize};

/// Resource limits for a contract
///
/// Missing fields deserialize as zero, so partial quotas such as
/// `{"cpu": 4, "memory": 16}` are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContractQuota {
    /// Compute units
    pub cpu: i64,

    /// Memory
    pub memory: i64,

    /// Standard block storage
    pub block: i64,

    /// SSD block storage
    pub block_ssd: i64,

    /// Standard filesystem storage
    pub fs: i64,

    /// SSD filesystem storage
    pub fs_ssd: i64,
}

impl ContractQuota {
    /// Quota with compute and memory only
    pub fn compute(cpu: i64, memory: i64) -> Self {
        Self {
            cpu,
            memory,
            ..Default::default()
        }
    }

    pub fn with_block(mut self, block: i64, block_ssd: i64) -> Self {
        self.block = block;
        self.block_ssd = block_ssd;
        self
    }

    pub fn with_fs(mut self, fs: i64, fs_ssd: i64) -> Self {
        self.fs = fs;
        self.fs_ssd = fs_ssd;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_quota_deserializes() {
        let quota: ContractQuota = serde_json::from_str(r#"{"cpu": 4, "memory": 16}"#).unwrap();
        assert_eq!(quota, ContractQuota::compute(4, 16));
        assert_eq!(quota.block_ssd, 0);
    }

    #[test]
    fn test_quota_wire_names() {
        let quota = ContractQuota::compute(1, 2).with_block(3, 4).with_fs(5, 6);
        let value = serde_json::to_value(quota).unwrap();
        assert_eq!(value["blockSsd"], 4);
        assert_eq!(value["fsSsd"], 6);
    }
}
