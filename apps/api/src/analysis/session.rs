//! Caller-owned session state.
//!
//! The server keeps no per-user state: clients send their `SessionState` with
//! each analysis request and receive the updated value in the response.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::analysis::catalog::CatalogEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub last_operation: Option<String>,
    #[serde(default)]
    pub unlocked_follow_ups: BTreeSet<String>,
}

impl SessionState {
    /// Follow-up operations are only permitted once unlocked.
    pub fn permits(&self, entry: &CatalogEntry) -> bool {
        !entry.follow_up || self.unlocked_follow_ups.contains(entry.operation)
    }

    /// Records a successful run of `entry`.
    pub fn record(&mut self, entry: &CatalogEntry) {
        self.last_operation = Some(entry.operation.to_string());
        self.unlocked_follow_ups
            .extend(entry.unlocks.iter().map(|op| op.to_string()));
    }
}
