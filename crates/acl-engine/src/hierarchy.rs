//! # Role hierarchy traversal
//!
//! Permissions flow from parent roles to their children. The functions here
//! walk the `parents` bucket one generation at a time:
//!
//! ```text
//! generation 0:  {editor}
//! generation 1:  union(parents, {editor})       = {member}
//! generation 2:  union(parents, {member})       = {guest}
//! generation 3:  union(parents, {guest})        = {}        -> stop
//! ```
//!
//! Every walk keeps a visited set and drops roles it has already seen from
//! the next generation. On an acyclic graph this only collapses diamonds; on
//! a cyclic graph it makes the walk terminate with the closure computed so
//! far instead of recursing forever.

use acl_store::{Bucket, BucketStore, StoreResult, ValueSet};

/// Next generation of a walk: the parents of `current` minus everything
/// already visited.
async fn next_generation(
    store: &dyn BucketStore,
    current: &ValueSet,
    visited: &ValueSet,
) -> StoreResult<ValueSet> {
    let parents = store.union(&Bucket::Parents, current).await?;
    let fresh: ValueSet = parents.difference(visited).cloned().collect();

    if fresh.len() < parents.len() {
        tracing::trace!(
            revisited = parents.len() - fresh.len(),
            "Skipping already visited roles in hierarchy walk"
        );
    }

    Ok(fresh)
}

/// `roles` together with every role reachable through parent edges.
///
/// A role reachable over several paths appears once.
pub async fn ancestors_of(store: &dyn BucketStore, roles: &ValueSet) -> StoreResult<ValueSet> {
    let mut closure = roles.clone();
    let mut current = roles.clone();

    while !current.is_empty() {
        current = next_generation(store, &current, &closure).await?;
        closure.extend(current.iter().cloned());
    }

    Ok(closure)
}

/// Union of the permissions granted on `resource` to `roles` and to all of
/// their ancestors.
///
/// The wildcard `*` is returned like any other permission; interpreting it
/// is up to the caller.
pub async fn permissions_of(
    store: &dyn BucketStore,
    roles: &ValueSet,
    resource: &str,
) -> StoreResult<ValueSet> {
    let bucket = Bucket::allows(resource);
    let mut permissions = ValueSet::new();
    let mut visited = ValueSet::new();
    let mut current = roles.clone();

    while !current.is_empty() {
        permissions.extend(store.union(&bucket, &current).await?);
        visited.extend(current.iter().cloned());
        current = next_generation(store, &current, &visited).await?;
    }

    Ok(permissions)
}

/// Every resource on which `roles` or any of their ancestors hold a grant.
pub async fn resources_of(store: &dyn BucketStore, roles: &ValueSet) -> StoreResult<ValueSet> {
    if roles.is_empty() {
        return Ok(ValueSet::new());
    }

    let all_roles = ancestors_of(store, roles).await?;
    store.union(&Bucket::Resources, &all_roles).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use acl_store::MemoryStore;

    fn set(values: &[&str]) -> ValueSet {
        values.iter().map(|v| v.to_string()).collect()
    }

    async fn store_with(parents: &[(&str, &[&str])], grants: &[(&str, &str, &[&str])]) -> MemoryStore {
        let store = MemoryStore::new();
        let mut batch = store.begin();
        for (role, role_parents) in parents {
            store.add(&mut batch, Bucket::Parents, role, set(role_parents));
        }
        for (resource, role, permissions) in grants {
            store.add(&mut batch, Bucket::allows(*resource), role, set(permissions));
            store.add(&mut batch, Bucket::Resources, role, set(&[*resource]));
        }
        store.end(batch).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_ancestors_chain() {
        let store = store_with(&[("editor", &["member"]), ("member", &["guest"])], &[]).await;

        let ancestors = ancestors_of(&store, &set(&["editor"])).await.unwrap();
        assert_eq!(ancestors, set(&["editor", "member", "guest"]));
    }

    #[tokio::test]
    async fn test_ancestors_diamond_counted_once() {
        let store = store_with(
            &[("child", &["left", "right"]), ("left", &["root"]), ("right", &["root"])],
            &[],
        )
        .await;

        let ancestors = ancestors_of(&store, &set(&["child"])).await.unwrap();
        assert_eq!(ancestors, set(&["child", "left", "right", "root"]));
    }

    #[tokio::test]
    async fn test_ancestors_of_empty_set() {
        let store = MemoryStore::new();
        assert!(ancestors_of(&store, &ValueSet::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ancestors_terminate_on_cycle() {
        let store = store_with(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])], &[]).await;

        let ancestors = ancestors_of(&store, &set(&["a"])).await.unwrap();
        assert_eq!(ancestors, set(&["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_permissions_inherited_across_generations() {
        let store = store_with(
            &[("editor", &["member"]), ("member", &["guest"])],
            &[
                ("blogs", "guest", &["view"]),
                ("blogs", "member", &["comment"]),
                ("blogs", "editor", &["edit"]),
                ("forums", "guest", &["view"]),
            ],
        )
        .await;

        let blogs = permissions_of(&store, &set(&["editor"]), "blogs").await.unwrap();
        assert_eq!(blogs, set(&["view", "comment", "edit"]));

        let member = permissions_of(&store, &set(&["member"]), "blogs").await.unwrap();
        assert_eq!(member, set(&["view", "comment"]));

        let none = permissions_of(&store, &set(&["editor"]), "wiki").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_permissions_keep_wildcard_literal() {
        let store = store_with(&[], &[("blogs", "admin", &["*"])]).await;

        let perms = permissions_of(&store, &set(&["admin"]), "blogs").await.unwrap();
        assert_eq!(perms, set(&["*"]));
    }

    #[tokio::test]
    async fn test_permissions_of_no_roles() {
        let store = store_with(&[], &[("blogs", "admin", &["*"])]).await;
        assert!(permissions_of(&store, &ValueSet::new(), "blogs").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permissions_terminate_on_cycle() {
        let store = store_with(
            &[("a", &["b"]), ("b", &["a"])],
            &[("blogs", "a", &["view"]), ("blogs", "b", &["edit"])],
        )
        .await;

        let perms = permissions_of(&store, &set(&["a"]), "blogs").await.unwrap();
        assert_eq!(perms, set(&["view", "edit"]));
    }

    #[tokio::test]
    async fn test_resources_of_includes_inherited() {
        let store = store_with(
            &[("editor", &["guest"])],
            &[("blogs", "guest", &["view"]), ("drafts", "editor", &["edit"])],
        )
        .await;

        let resources = resources_of(&store, &set(&["editor"])).await.unwrap();
        assert_eq!(resources, set(&["blogs", "drafts"]));

        let guest = resources_of(&store, &set(&["guest"])).await.unwrap();
        assert_eq!(guest, set(&["blogs"]));
    }
}
