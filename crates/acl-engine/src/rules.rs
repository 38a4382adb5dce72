//! Compact grant rules.
//!
//! A shorthand for granting several resource/permission combinations to a
//! group of roles at once, convenient for seeding an ACL from configuration:
//!
//! ```json
//! [
//!   {
//!     "roles": ["guest", "member"],
//!     "allows": [
//!       { "resources": "blogs", "permissions": "get" },
//!       { "resources": ["forums", "news"], "permissions": ["get", "put", "delete"] }
//!     ]
//!   }
//! ]
//! ```
//!
//! Each entry is applied with the same semantics as [`Acl::allow`](crate::Acl::allow).

use crate::error::AclResult;
use crate::values::{ensure_not_reserved, IntoValues};
use acl_store::ValueSet;
use serde::{Deserialize, Deserializer, Serialize};

/// Resources and the permissions granted on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGrant {
    /// Resources the permissions apply to.
    #[serde(deserialize_with = "one_or_many")]
    pub resources: ValueSet,
    /// Permissions granted on every resource.
    #[serde(deserialize_with = "one_or_many")]
    pub permissions: ValueSet,
}

/// A group of roles and the grants they receive.
///
/// # Example
///
/// ```
/// use acl_engine::AllowRule;
///
/// let rule = AllowRule::new(["guest", "member"])
///     .grant("blogs", "get")
///     .grant(["forums", "news"], ["get", "put", "delete"]);
///
/// assert_eq!(rule.allows.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowRule {
    /// Roles receiving every grant of the rule.
    #[serde(deserialize_with = "one_or_many")]
    pub roles: ValueSet,
    /// Grants applied to each role.
    pub allows: Vec<ResourceGrant>,
}

impl AllowRule {
    /// Create a rule for `roles` without grants.
    pub fn new(roles: impl IntoValues) -> Self {
        Self {
            roles: roles.into_values(),
            allows: Vec::new(),
        }
    }

    /// Add a grant of `permissions` on `resources`.
    pub fn grant(mut self, resources: impl IntoValues, permissions: impl IntoValues) -> Self {
        self.allows.push(ResourceGrant {
            resources: resources.into_values(),
            permissions: permissions.into_values(),
        });
        self
    }

    /// Reject reserved identifiers anywhere in the rule.
    pub fn validate(&self) -> AclResult<()> {
        ensure_not_reserved("role", &self.roles)?;
        for grant in &self.allows {
            ensure_not_reserved("resource", &grant.resources)?;
            ensure_not_reserved("permission", &grant.permissions)?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<ValueSet, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => ValueSet::from([value]),
        OneOrMany::Many(values) => values.into_iter().collect(),
    })
}
