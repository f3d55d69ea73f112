//! Scan configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Per-batch byte limit applied when a scan is not parallelized and the
    /// specification carries no explicit limit.
    pub default_batch_bytes_limit: u64,

    /// Working-memory limit handed to the row-fetch engine.
    pub work_mem_bytes: usize,

    /// Testing knob: always size batches as production would, ignoring
    /// row-limit hints when choosing batch capacity.
    pub force_production_batch_sizes: bool,

    /// Emit a trace event per KV pair read (expensive; diagnostics only).
    pub trace_kv: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            default_batch_bytes_limit: 10 * 1024 * 1024, // 10 MiB
            work_mem_bytes: 64 * 1024 * 1024,
            force_production_batch_sizes: false,
            trace_kv: false,
        }
    }
}

impl ScanConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trips_through_json() {
        let cfg = ScanConfig {
            default_batch_bytes_limit: 512,
            work_mem_bytes: 4096,
            force_production_batch_sizes: true,
            trace_kv: false,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back = ScanConfig::from_json_str(&json).unwrap();
        assert_eq!(back.default_batch_bytes_limit, 512);
        assert_eq!(back.work_mem_bytes, 4096);
        assert!(back.force_production_batch_sizes);
    }

    #[test]
    fn test_config_rejects_malformed_json() {
        assert!(ScanConfig::from_json_str("{not json").is_err());
    }
}
