//! # Access control façade
//!
//! [`Acl`] owns a handle to a [`BucketStore`] and exposes the read side of
//! the engine: membership lookups, the allowed/denied check and the
//! permission and resource listings. The write side lives in
//! [`crate::mutation`].

use crate::checker::PermissionCheck;
use crate::error::AclResult;
use crate::hierarchy;
use crate::options::AclOptions;
use crate::values::IntoValues;
use acl_store::{Bucket, BucketStore, MultiUnion, ValueSet, META_ROLES_KEY, META_USERS_KEY};
use std::collections::HashMap;
use std::sync::Arc;

/// Role-based access control over a bucket store.
///
/// Cloning is cheap and clones share the same store.
///
/// # Example
///
/// ```rust,no_run
/// use acl_engine::Acl;
/// use acl_store::MemoryStore;
/// use std::sync::Arc;
///
/// async fn example() -> acl_engine::AclResult<()> {
///     let acl = Acl::new(Arc::new(MemoryStore::new()));
///
///     acl.allow("admin", ["blogs", "forums"], "*").await?;
///     acl.add_user_roles("joed", "admin").await?;
///
///     assert!(acl.is_allowed("joed", "blogs", "delete").await?);
///     assert!(!acl.is_allowed("joed", "unknown", "delete").await?);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Acl {
    pub(crate) store: Arc<dyn BucketStore>,
    options: AclOptions,
}

impl std::fmt::Debug for Acl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Acl")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Acl {
    /// Create an engine over `store` with default options.
    pub fn new(store: Arc<dyn BucketStore>) -> Self {
        Self::with_options(store, AclOptions::default())
    }

    /// Create an engine over `store` with explicit options.
    pub fn with_options(store: Arc<dyn BucketStore>, options: AclOptions) -> Self {
        Self { store, options }
    }

    /// Engine options.
    pub fn options(&self) -> &AclOptions {
        &self.options
    }

    /// Underlying store.
    pub fn store(&self) -> &dyn BucketStore {
        self.store.as_ref()
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Roles directly assigned to `user`. No hierarchy traversal.
    pub async fn user_roles(&self, user: impl ToString) -> AclResult<ValueSet> {
        Ok(self.store.get(&Bucket::Users, &user.to_string()).await?)
    }

    /// Users directly assigned to `role`.
    pub async fn role_users(&self, role: &str) -> AclResult<ValueSet> {
        Ok(self.store.get(&Bucket::Roles, role).await?)
    }

    /// Check if `user` is directly assigned to `role`.
    pub async fn has_role(&self, user: impl ToString, role: &str) -> AclResult<bool> {
        Ok(self.user_roles(user).await?.contains(role))
    }

    /// Direct parents of `role`.
    pub async fn role_parents(&self, role: &str) -> AclResult<ValueSet> {
        Ok(self.store.get(&Bucket::Parents, role).await?)
    }

    /// Every role registered by a mutation.
    pub async fn known_roles(&self) -> AclResult<ValueSet> {
        Ok(self.store.get(&Bucket::Meta, META_ROLES_KEY).await?)
    }

    /// Every user registered by [`add_user_roles`](Acl::add_user_roles).
    pub async fn known_users(&self) -> AclResult<ValueSet> {
        Ok(self.store.get(&Bucket::Meta, META_USERS_KEY).await?)
    }

    // ------------------------------------------------------------------
    // Checks
    // ------------------------------------------------------------------

    /// Check if `user` holds every permission in `permissions` on `resource`,
    /// directly or through inherited roles.
    ///
    /// A user without roles is denied without further store calls.
    ///
    /// # Arguments
    ///
    /// * `user` - User id; numeric ids are accepted
    /// * `resource` - Resource name
    /// * `permissions` - One permission or a collection; all must be held
    ///
    /// # Returns
    ///
    /// `true` when every permission is granted, or a store error
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # async fn example(acl: acl_engine::Acl) -> acl_engine::AclResult<()> {
    /// if acl.is_allowed(42, "blogs", ["edit", "view"]).await? {
    ///     // render the editor
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn is_allowed(
        &self,
        user: impl ToString,
        resource: &str,
        permissions: impl IntoValues,
    ) -> AclResult<bool> {
        let user = user.to_string();
        let roles = self.user_roles(&user).await?;

        if roles.is_empty() {
            tracing::debug!(user = %user, resource, "User has no roles, denying");
            return Ok(false);
        }

        let allowed = self.check(roles, resource, permissions.into_values()).await?;
        tracing::debug!(user = %user, resource, allowed, "Checked user permissions");
        Ok(allowed)
    }

    /// Check if `roles`, together with their ancestors, hold every permission
    /// in `permissions` on `resource`.
    pub async fn are_any_roles_allowed(
        &self,
        roles: impl IntoValues,
        resource: &str,
        permissions: impl IntoValues,
    ) -> AclResult<bool> {
        let roles = roles.into_values();
        if roles.is_empty() {
            return Ok(false);
        }

        self.check(roles, resource, permissions.into_values()).await
    }

    async fn check(&self, roles: ValueSet, resource: &str, permissions: ValueSet) -> AclResult<bool> {
        Ok(PermissionCheck::new(self.store.as_ref(), resource)
            .run(roles, permissions)
            .await?)
    }

    // ------------------------------------------------------------------
    // Listings
    // ------------------------------------------------------------------

    /// Permissions `user` holds on each of `resources`, inherited roles
    /// included.
    ///
    /// Every requested resource is present in the result, mapped to an empty
    /// set when nothing is granted. When the store supports batched unions
    /// and [`AclOptions::batched_unions`] is set, the ancestor closure is
    /// computed once and all grant buckets are read in one call; otherwise
    /// every resource is aggregated separately. Both give the same result.
    ///
    /// # Arguments
    ///
    /// * `user` - User id
    /// * `resources` - One resource or a collection
    ///
    /// # Returns
    ///
    /// Map of each requested resource to the permissions held on it
    pub async fn allowed_permissions(
        &self,
        user: impl ToString,
        resources: impl IntoValues,
    ) -> AclResult<HashMap<String, ValueSet>> {
        let resources = resources.into_values();
        let roles = self.user_roles(user).await?;

        if roles.is_empty() {
            return Ok(resources
                .into_iter()
                .map(|resource| (resource, ValueSet::new()))
                .collect());
        }

        match self.store.multi_union() {
            Some(capability) if self.options.batched_unions => {
                self.batched_allowed_permissions(capability, &roles, resources)
                    .await
            }
            _ => self.per_resource_allowed_permissions(&roles, resources).await,
        }
    }

    async fn per_resource_allowed_permissions(
        &self,
        roles: &ValueSet,
        resources: ValueSet,
    ) -> AclResult<HashMap<String, ValueSet>> {
        let mut result = HashMap::with_capacity(resources.len());
        for resource in resources {
            let permissions = hierarchy::permissions_of(self.store.as_ref(), roles, &resource).await?;
            result.insert(resource, permissions);
        }
        Ok(result)
    }

    async fn batched_allowed_permissions(
        &self,
        capability: &dyn MultiUnion,
        roles: &ValueSet,
        resources: ValueSet,
    ) -> AclResult<HashMap<String, ValueSet>> {
        let all_roles = hierarchy::ancestors_of(self.store.as_ref(), roles).await?;
        batched_grants(capability, &all_roles, resources).await
    }

    /// Every resource reachable by `roles` through the hierarchy, mapped to
    /// the permissions held on it.
    ///
    /// The hierarchy is walked once; grants are then read against the whole
    /// ancestor closure.
    pub async fn what_resources(
        &self,
        roles: impl IntoValues,
    ) -> AclResult<HashMap<String, ValueSet>> {
        let roles = roles.into_values();
        if roles.is_empty() {
            return Ok(HashMap::new());
        }

        // One walk; every grant lookup below reuses the closure.
        let store = self.store.as_ref();
        let all_roles = hierarchy::ancestors_of(store, &roles).await?;
        let resources = store.union(&Bucket::Resources, &all_roles).await?;

        match store.multi_union() {
            Some(capability) if self.options.batched_unions => {
                batched_grants(capability, &all_roles, resources).await
            }
            _ => {
                let mut result = HashMap::with_capacity(resources.len());
                for resource in resources {
                    let permissions = store.union(&Bucket::allows(resource.as_str()), &all_roles).await?;
                    result.insert(resource, permissions);
                }
                Ok(result)
            }
        }
    }

    /// Resources on which `roles` hold at least one of `permissions`.
    ///
    /// Matching is a plain intersection of requested and granted permission
    /// names.
    pub async fn what_resources_allowing(
        &self,
        roles: impl IntoValues,
        permissions: impl IntoValues,
    ) -> AclResult<ValueSet> {
        let wanted = permissions.into_values();
        let granted = self.what_resources(roles).await?;

        Ok(granted
            .into_iter()
            .filter(|(_, held)| !held.is_disjoint(&wanted))
            .map(|(resource, _)| resource)
            .collect())
    }
}

/// Grants of `all_roles` on each of `resources`, read in one batched call.
async fn batched_grants(
    capability: &dyn MultiUnion,
    all_roles: &ValueSet,
    resources: ValueSet,
) -> AclResult<HashMap<String, ValueSet>> {
    let buckets: Vec<Bucket> = resources.iter().map(Bucket::allows).collect();
    let mut unions = capability.unions(&buckets, all_roles).await?;

    Ok(resources
        .into_iter()
        .map(|resource| {
            let permissions = unions
                .remove(&Bucket::allows(resource.as_str()))
                .unwrap_or_default();
            (resource, permissions)
        })
        .collect())
}
