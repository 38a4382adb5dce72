//! # Buckets
//!
//! A bucket is a named partition of the store holding independent
//! `key → set of values` mappings. The engine only ever talks about the
//! closed set of buckets below; backends decide how to name them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry key inside [`Bucket::Meta`] listing every known role.
pub const META_ROLES_KEY: &str = "roles";

/// Registry key inside [`Bucket::Meta`] listing every known user.
pub const META_USERS_KEY: &str = "users";

/// A logical bucket of the access-control data model.
///
/// | Bucket | Key | Values |
/// |---|---|---|
/// | `Meta` | `"roles"` / `"users"` | registered role names / user ids |
/// | `Parents` | role | parent roles |
/// | `Resources` | role | resources the role has any grant on |
/// | `Roles` | role | user ids holding the role |
/// | `Users` | user id | roles held by the user |
/// | `Allows(resource)` | role | permissions granted on `resource` |
///
/// # Example
///
/// ```
/// use acl_store::{Bucket, BucketNames};
///
/// let names = BucketNames::default();
/// assert_eq!(Bucket::Parents.name(&names), "parents");
/// assert_eq!(Bucket::allows("blogs").name(&names), "allows_blogs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Global registries of roles and users.
    Meta,
    /// Role hierarchy edges (child → parents).
    Parents,
    /// Per-role index of resources with a direct grant.
    Resources,
    /// Role → member users.
    Roles,
    /// User → held roles.
    Users,
    /// Per-resource grants, keyed by role.
    Allows(String),
}

impl Bucket {
    /// Bucket holding the grants on `resource`.
    pub fn allows(resource: impl Into<String>) -> Self {
        Bucket::Allows(resource.into())
    }

    /// Resolve the storage name of this bucket under the given naming scheme.
    pub fn name(&self, names: &BucketNames) -> String {
        match self {
            Bucket::Meta => names.meta.clone(),
            Bucket::Parents => names.parents.clone(),
            Bucket::Resources => names.resources.clone(),
            Bucket::Roles => names.roles.clone(),
            Bucket::Users => names.users.clone(),
            Bucket::Allows(resource) => format!("{}{}", names.allows_prefix, resource),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name(&BucketNames::default()))
    }
}

/// Storage names for each bucket.
///
/// Backends that persist buckets under string names (e.g. Redis) use this to
/// keep several deployments apart or to match an existing data layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketNames {
    /// Name of the registry bucket.
    pub meta: String,
    /// Name of the role hierarchy bucket.
    pub parents: String,
    /// Name of the role → resources index bucket.
    pub resources: String,
    /// Name of the role → users bucket.
    pub roles: String,
    /// Name of the user → roles bucket.
    pub users: String,
    /// Prefix prepended to the resource name for grant buckets.
    pub allows_prefix: String,
}

impl Default for BucketNames {
    fn default() -> Self {
        Self {
            meta: "meta".to_string(),
            parents: "parents".to_string(),
            resources: "resources".to_string(),
            roles: "roles".to_string(),
            users: "users".to_string(),
            allows_prefix: "allows_".to_string(),
        }
    }
}

impl BucketNames {
    /// Load bucket names from environment variables.
    ///
    /// Environment variables:
    /// - `ACL_BUCKET_META` (default: meta)
    /// - `ACL_BUCKET_PARENTS` (default: parents)
    /// - `ACL_BUCKET_RESOURCES` (default: resources)
    /// - `ACL_BUCKET_ROLES` (default: roles)
    /// - `ACL_BUCKET_USERS` (default: users)
    /// - `ACL_BUCKET_ALLOWS_PREFIX` (default: allows_)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            meta: std::env::var("ACL_BUCKET_META").unwrap_or(default.meta),
            parents: std::env::var("ACL_BUCKET_PARENTS").unwrap_or(default.parents),
            resources: std::env::var("ACL_BUCKET_RESOURCES").unwrap_or(default.resources),
            roles: std::env::var("ACL_BUCKET_ROLES").unwrap_or(default.roles),
            users: std::env::var("ACL_BUCKET_USERS").unwrap_or(default.users),
            allows_prefix: std::env::var("ACL_BUCKET_ALLOWS_PREFIX")
                .unwrap_or(default.allows_prefix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let names = BucketNames::default();
        assert_eq!(Bucket::Meta.name(&names), "meta");
        assert_eq!(Bucket::Resources.name(&names), "resources");
        assert_eq!(Bucket::Roles.name(&names), "roles");
        assert_eq!(Bucket::Users.name(&names), "users");
        assert_eq!(Bucket::allows("forums").name(&names), "allows_forums");
    }

    #[test]
    fn test_custom_names() {
        let names = BucketNames {
            parents: "hierarchy".to_string(),
            allows_prefix: "grants:".to_string(),
            ..BucketNames::default()
        };
        assert_eq!(Bucket::Parents.name(&names), "hierarchy");
        assert_eq!(Bucket::allows("blogs").name(&names), "grants:blogs");
    }

    #[test]
    fn test_allows_buckets_are_distinct_per_resource() {
        assert_ne!(Bucket::allows("a"), Bucket::allows("b"));
        assert_eq!(Bucket::allows("a"), Bucket::Allows("a".to_string()));
    }
}
