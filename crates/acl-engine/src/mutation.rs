//! # Mutations
//!
//! Grants, revocations and structural edits of the role graph. Every
//! operation validates its identifiers, then queues its writes on one batch
//! and executes it. Two operations need more than one round trip and are
//! therefore not atomic:
//!
//! - `remove_allow` subtracts permissions in one batch and repairs the
//!   `resources` index in a second one. A concurrent `allow` on the same
//!   role and resource between the two can leave the index missing a
//!   resource that is granted again, or keep a stale entry.
//! - `remove_role` reads the role's resource index before its delete batch.
//!   A resource granted to the role in between keeps an orphaned grant.
//!
//! Both windows are accepted; the engine never reconciles afterwards.

use crate::acl::Acl;
use crate::error::AclResult;
use crate::rules::AllowRule;
use crate::values::{ensure_not_reserved, single, IntoValues};
use acl_store::{Bucket, ValueSet, META_ROLES_KEY, META_USERS_KEY};

impl Acl {
    // ------------------------------------------------------------------
    // User membership
    // ------------------------------------------------------------------

    /// Assign `roles` to `user` and register the user.
    ///
    /// Idempotent.
    ///
    /// # Arguments
    ///
    /// * `user` - User id; numeric ids are stored as their decimal string
    /// * `roles` - One role or a collection
    pub async fn add_user_roles(&self, user: impl ToString, roles: impl IntoValues) -> AclResult<()> {
        let user = user.to_string();
        let roles = roles.into_values();
        ensure_not_reserved("user", &single(user.as_str()))?;
        ensure_not_reserved("role", &roles)?;

        tracing::debug!(user = %user, roles = ?roles, "Adding user roles");

        let store = self.store.as_ref();
        let mut batch = store.begin();
        store.add(&mut batch, Bucket::Meta, META_USERS_KEY, single(user.as_str()));
        store.add(&mut batch, Bucket::Users, &user, roles.clone());
        for role in &roles {
            store.add(&mut batch, Bucket::Roles, role, single(user.as_str()));
        }
        store.end(batch).await?;

        Ok(())
    }

    /// Unassign `roles` from `user`. The user stays registered.
    ///
    /// Idempotent.
    pub async fn remove_user_roles(
        &self,
        user: impl ToString,
        roles: impl IntoValues,
    ) -> AclResult<()> {
        let user = user.to_string();
        let roles = roles.into_values();
        ensure_not_reserved("user", &single(user.as_str()))?;
        ensure_not_reserved("role", &roles)?;

        tracing::debug!(user = %user, roles = ?roles, "Removing user roles");

        let store = self.store.as_ref();
        let mut batch = store.begin();
        store.remove(&mut batch, Bucket::Users, &user, roles.clone());
        for role in &roles {
            store.remove(&mut batch, Bucket::Roles, role, single(user.as_str()));
        }
        store.end(batch).await?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Role hierarchy
    // ------------------------------------------------------------------

    /// Make `role` inherit from `parents`.
    ///
    /// The role and its parents are registered first. Acyclicity is not
    /// checked; traversals stop at roles they have already visited.
    pub async fn add_role_parents(&self, role: &str, parents: impl IntoValues) -> AclResult<()> {
        let parents = parents.into_values();
        ensure_not_reserved("role", &single(role))?;
        ensure_not_reserved("parent role", &parents)?;

        tracing::debug!(role, parents = ?parents, "Adding role parents");

        let mut registered = parents.clone();
        registered.insert(role.to_string());

        let store = self.store.as_ref();
        let mut batch = store.begin();
        store.add(&mut batch, Bucket::Meta, META_ROLES_KEY, registered);
        store.add(&mut batch, Bucket::Parents, role, parents);
        store.end(batch).await?;

        Ok(())
    }

    /// Remove `parents` from `role`.
    pub async fn remove_role_parents(&self, role: &str, parents: impl IntoValues) -> AclResult<()> {
        let parents = parents.into_values();
        ensure_not_reserved("role", &single(role))?;
        ensure_not_reserved("parent role", &parents)?;

        tracing::debug!(role, parents = ?parents, "Removing role parents");

        let store = self.store.as_ref();
        let mut batch = store.begin();
        store.remove(&mut batch, Bucket::Parents, role, parents);
        store.end(batch).await?;

        Ok(())
    }

    /// Remove every parent of `role`.
    ///
    /// Idempotent: a second call finds nothing to delete.
    pub async fn remove_all_role_parents(&self, role: &str) -> AclResult<()> {
        ensure_not_reserved("role", &single(role))?;
        tracing::debug!(role, "Removing all role parents");

        let store = self.store.as_ref();
        let mut batch = store.begin();
        store.del(&mut batch, Bucket::Parents, single(role));
        store.end(batch).await?;

        Ok(())
    }

    /// Remove `role`: its grants on every indexed resource, its resource
    /// index, its parents, its member list and its registration.
    ///
    /// Users keep the role in their own role sets.
    pub async fn remove_role(&self, role: &str) -> AclResult<()> {
        ensure_not_reserved("role", &single(role))?;
        let store = self.store.as_ref();

        // Read outside the batch; grants added after this point are missed.
        let resources = store.get(&Bucket::Resources, role).await?;

        tracing::debug!(role, resources = resources.len(), "Removing role");

        let mut batch = store.begin();
        for resource in &resources {
            store.del(&mut batch, Bucket::allows(resource.as_str()), single(role));
        }
        store.del(&mut batch, Bucket::Resources, single(role));
        store.del(&mut batch, Bucket::Parents, single(role));
        store.del(&mut batch, Bucket::Roles, single(role));
        store.remove(&mut batch, Bucket::Meta, META_ROLES_KEY, single(role));
        store.end(batch).await?;

        Ok(())
    }

    /// Remove every grant on `resource` and drop it from every role's
    /// resource index. Sweeps all registered roles.
    pub async fn remove_resource(&self, resource: &str) -> AclResult<()> {
        ensure_not_reserved("resource", &single(resource))?;
        let store = self.store.as_ref();
        let roles = store.get(&Bucket::Meta, META_ROLES_KEY).await?;

        tracing::debug!(resource, roles = roles.len(), "Removing resource");

        if roles.is_empty() {
            return Ok(());
        }

        let mut batch = store.begin();
        store.del(&mut batch, Bucket::allows(resource), roles.clone());
        for role in &roles {
            store.remove(&mut batch, Bucket::Resources, role, single(resource));
        }
        store.end(batch).await?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Grants
    // ------------------------------------------------------------------

    /// Grant `permissions` on every resource in `resources` to every role in
    /// `roles`.
    ///
    /// Additive: permissions already granted are kept and granting them again
    /// changes nothing. The wildcard `*` grants every permission. An empty
    /// `permissions` list writes nothing.
    ///
    /// # Arguments
    ///
    /// * `roles` - Roles receiving the grant
    /// * `resources` - Resources the permissions apply to
    /// * `permissions` - Permission names, or `*`
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # async fn example(acl: acl_engine::Acl) -> acl_engine::AclResult<()> {
    /// acl.allow(["editor", "admin"], "blogs", ["edit", "view"]).await?;
    /// acl.allow("admin", ["blogs", "forums"], "*").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn allow(
        &self,
        roles: impl IntoValues,
        resources: impl IntoValues,
        permissions: impl IntoValues,
    ) -> AclResult<()> {
        let roles = roles.into_values();
        let resources = resources.into_values();
        let permissions = permissions.into_values();
        ensure_not_reserved("role", &roles)?;
        ensure_not_reserved("resource", &resources)?;
        ensure_not_reserved("permission", &permissions)?;

        self.grant(roles, resources, permissions).await
    }

    /// Apply a list of compact grant rules, one `allow` per rule entry.
    ///
    /// Every rule is validated before the first write.
    pub async fn allow_rules(&self, rules: &[AllowRule]) -> AclResult<()> {
        for rule in rules {
            rule.validate()?;
        }

        for rule in rules {
            for grant in &rule.allows {
                self.grant(
                    rule.roles.clone(),
                    grant.resources.clone(),
                    grant.permissions.clone(),
                )
                .await?;
            }
        }

        Ok(())
    }

    async fn grant(
        &self,
        roles: ValueSet,
        resources: ValueSet,
        permissions: ValueSet,
    ) -> AclResult<()> {
        // Indexing a resource without a grant would desync `resources`.
        if permissions.is_empty() {
            tracing::debug!(roles = ?roles, resources = ?resources, "Empty grant, nothing to write");
            return Ok(());
        }

        tracing::debug!(
            roles = ?roles,
            resources = ?resources,
            permissions = ?permissions,
            "Granting permissions"
        );

        let store = self.store.as_ref();
        let mut batch = store.begin();
        store.add(&mut batch, Bucket::Meta, META_ROLES_KEY, roles.clone());
        for role in &roles {
            for resource in &resources {
                store.add(
                    &mut batch,
                    Bucket::allows(resource.as_str()),
                    role,
                    permissions.clone(),
                );
            }
            store.add(&mut batch, Bucket::Resources, role, resources.clone());
        }
        store.end(batch).await?;

        Ok(())
    }

    /// Revoke `permissions` on `resources` from `role`.
    ///
    /// Resources left without any permission for the role are then dropped
    /// from its resource index in a second batch.
    ///
    /// # Returns
    ///
    /// A store error from either batch. When the second one fails the
    /// permissions are already revoked and the index keeps stale entries.
    pub async fn remove_allow(
        &self,
        role: &str,
        resources: impl IntoValues,
        permissions: impl IntoValues,
    ) -> AclResult<()> {
        let resources = resources.into_values();
        let permissions = permissions.into_values();
        ensure_not_reserved("role", &single(role))?;
        ensure_not_reserved("resource", &resources)?;
        ensure_not_reserved("permission", &permissions)?;

        self.revoke(role, resources, Some(permissions)).await
    }

    /// Revoke every permission on `resources` from `role`.
    pub async fn remove_all_allows(&self, role: &str, resources: impl IntoValues) -> AclResult<()> {
        let resources = resources.into_values();
        ensure_not_reserved("role", &single(role))?;
        ensure_not_reserved("resource", &resources)?;

        self.revoke(role, resources, None).await
    }

    async fn revoke(
        &self,
        role: &str,
        resources: ValueSet,
        permissions: Option<ValueSet>,
    ) -> AclResult<()> {
        tracing::debug!(
            role,
            resources = ?resources,
            permissions = ?permissions,
            "Revoking permissions"
        );

        let store = self.store.as_ref();
        let mut batch = store.begin();

        let Some(permissions) = permissions else {
            for resource in &resources {
                store.del(&mut batch, Bucket::allows(resource.as_str()), single(role));
            }
            store.remove(&mut batch, Bucket::Resources, role, resources);
            store.end(batch).await?;
            return Ok(());
        };

        for resource in &resources {
            store.remove(
                &mut batch,
                Bucket::allows(resource.as_str()),
                role,
                permissions.clone(),
            );
        }
        store.end(batch).await?;

        // Second pass: not atomic with the subtraction above.
        let mut emptied = ValueSet::new();
        for resource in resources {
            let remaining = store.get(&Bucket::allows(resource.as_str()), role).await?;
            if remaining.is_empty() {
                emptied.insert(resource);
            }
        }

        if !emptied.is_empty() {
            tracing::debug!(role, emptied = ?emptied, "Dropping emptied resources from index");

            let mut batch = store.begin();
            store.remove(&mut batch, Bucket::Resources, role, emptied);
            store.end(batch).await?;
        }

        Ok(())
    }
}
