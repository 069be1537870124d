//! The `free`/`pro` plan flag.
//!
//! The plan is a single slot in client-local storage. It is a UI preference,
//! not an entitlement: reads that fail or find anything other than the exact
//! bytes `pro` fall back to [`Plan::Free`], and writes that fail are logged
//! and dropped. Concurrent writers race with last-write-wins.

use std::fmt;
use std::sync::Arc;

use keynest_storage::StorageBackend;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PlanError;

/// Storage key holding the current plan.
pub const PLAN_KEY: &str = "keynest/plan";

/// Subscription plan.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
}

impl Plan {
    /// The exact string persisted for this plan.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }

    /// Interpret a stored value. Only the exact bytes `pro` mean [`Plan::Pro`].
    #[must_use]
    pub fn from_stored(value: Option<&[u8]>) -> Self {
        match value {
            Some(b"pro") => Self::Pro,
            _ => Self::Free,
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Free => Self::Pro,
            Self::Pro => Self::Free,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads and writes the plan flag through a storage backend.
#[derive(Clone)]
pub struct PlanGate {
    storage: Arc<dyn StorageBackend>,
}

impl fmt::Debug for PlanGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanGate").finish_non_exhaustive()
    }
}

impl PlanGate {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Current plan. Never fails; storage errors read as [`Plan::Free`].
    pub async fn get_plan(&self) -> Plan {
        match self.storage.get(PLAN_KEY).await {
            Ok(value) => Plan::from_stored(value.as_deref()),
            Err(e) => {
                warn!(error = %e, "plan read failed, assuming free");
                Plan::Free
            }
        }
    }

    /// Overwrite the stored plan. A storage failure is logged and ignored.
    pub async fn set_plan(&self, plan: Plan) {
        match self.storage.put(PLAN_KEY, plan.as_str().as_bytes()).await {
            Ok(()) => info!(%plan, "plan updated"),
            Err(e) => warn!(error = %e, %plan, "plan write failed, keeping previous value"),
        }
    }

    pub async fn is_pro(&self) -> bool {
        self.get_plan().await == Plan::Pro
    }

    /// Flip the plan, persist it, and return the new value.
    pub async fn toggle_plan(&self) -> Plan {
        let next = self.get_plan().await.toggled();
        self.set_plan(next).await;
        next
    }

    /// Gate a Pro-only feature.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::ProRequired`] when the current plan is Free.
    pub async fn require_pro(&self, feature: &str) -> Result<(), PlanError> {
        if self.is_pro().await {
            return Ok(());
        }
        Err(PlanError::ProRequired {
            feature: feature.to_owned(),
        })
    }
}
