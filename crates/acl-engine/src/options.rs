//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Options controlling how the engine talks to its store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclOptions {
    /// Answer `allowed_permissions` with one ancestor walk plus a single
    /// batched union when the store supports it (default: true).
    ///
    /// Stores without the capability always use the per-resource strategy.
    pub batched_unions: bool,
}

impl Default for AclOptions {
    fn default() -> Self {
        Self {
            batched_unions: true,
        }
    }
}

impl AclOptions {
    /// Load options from environment variables.
    ///
    /// Environment variables:
    /// - `ACL_BATCHED_UNIONS`: use the batched strategy (default: true)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            batched_unions: std::env::var("ACL_BATCHED_UNIONS")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.batched_unions),
        }
    }

    /// Options that always use the per-resource strategy.
    pub fn per_resource() -> Self {
        Self {
            batched_unions: false,
        }
    }
}
