//! Flow context: the services the surrounding framework injects into every
//! operator of a flow.

use std::sync::Arc;

use colscan_core::config::ScanConfig;
use colscan_core::id::NodeId;
use colscan_kv::{MemKv, RangeCache, Txn};

#[derive(Clone)]
pub struct FlowContext {
    /// Root or leaf transaction this flow runs under.
    pub txn: Arc<Txn>,
    /// This node's identity. `None` on flows with no node identity (e.g.
    /// multi-tenant pods); `Some` with a zero id is a planner bug and is
    /// rejected at operator construction.
    pub node_id: Option<NodeId>,
    /// True when the whole plan runs on the gateway; local flows skip
    /// misplanned-range reporting.
    pub local: bool,
    pub range_cache: Arc<RangeCache>,
    /// Handle to the KV store the reference fetch engine scans.
    pub store: Arc<MemKv>,
    pub config: ScanConfig,
}

impl FlowContext {
    /// A single-node local flow over `store` with a root transaction.
    pub fn local(store: Arc<MemKv>) -> Self {
        Self {
            txn: Arc::new(Txn::root()),
            node_id: None,
            local: true,
            range_cache: Arc::new(RangeCache::new()),
            store,
            config: ScanConfig::default(),
        }
    }

    /// A distributed flow executing on `node_id`.
    pub fn distributed(
        store: Arc<MemKv>,
        txn: Arc<Txn>,
        node_id: NodeId,
        range_cache: Arc<RangeCache>,
    ) -> Self {
        Self {
            txn,
            node_id: Some(node_id),
            local: false,
            range_cache,
            store,
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }
}
