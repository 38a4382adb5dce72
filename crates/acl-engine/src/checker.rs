//! Short-circuiting permission check.
//!
//! Answers "do these roles hold all of these permissions on a resource?"
//! by climbing the hierarchy one generation at a time and stopping as soon
//! as the answer is known, instead of materializing the full inherited
//! permission set.

use crate::values::WILDCARD;
use acl_store::{Bucket, BucketStore, StoreResult, ValueSet};

/// State of a permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckState {
    /// Still climbing: `roles` is the generation to inspect next and
    /// `remaining` the permissions nobody has granted yet.
    Checking {
        /// Current generation of roles
        roles: ValueSet,
        /// Permissions still to be found
        remaining: ValueSet,
    },
    /// Every requested permission is granted.
    Allowed,
    /// The hierarchy ran out before every permission was found.
    Denied,
}

impl CheckState {
    /// Initial state for a check.
    pub fn start(roles: ValueSet, permissions: ValueSet) -> Self {
        CheckState::Checking {
            roles,
            remaining: permissions,
        }
    }

    /// Check if this state is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CheckState::Checking { .. })
    }
}

/// Drives a [`CheckState`] against a store for one resource.
pub struct PermissionCheck<'a> {
    store: &'a dyn BucketStore,
    bucket: Bucket,
    visited: ValueSet,
}

impl<'a> PermissionCheck<'a> {
    /// Create a check of grants on `resource`.
    pub fn new(store: &'a dyn BucketStore, resource: &str) -> Self {
        Self {
            store,
            bucket: Bucket::allows(resource),
            visited: ValueSet::new(),
        }
    }

    /// Perform one transition.
    ///
    /// 1. fetch the permissions granted to the current generation
    /// 2. a wildcard grant allows everything
    /// 3. subtract the granted permissions from the remaining ones
    /// 4. nothing remaining: allowed
    /// 5. otherwise move to the unvisited parents, denied if there are none
    pub async fn step(&mut self, state: CheckState) -> StoreResult<CheckState> {
        let (roles, remaining) = match state {
            CheckState::Checking { roles, remaining } => (roles, remaining),
            terminal => return Ok(terminal),
        };

        let granted = self.store.union(&self.bucket, &roles).await?;
        if granted.contains(WILDCARD) {
            return Ok(CheckState::Allowed);
        }

        let remaining: ValueSet = remaining.difference(&granted).cloned().collect();
        if remaining.is_empty() {
            return Ok(CheckState::Allowed);
        }

        let parents = self.store.union(&Bucket::Parents, &roles).await?;
        self.visited.extend(roles);
        let next: ValueSet = parents.difference(&self.visited).cloned().collect();

        if next.is_empty() {
            return Ok(CheckState::Denied);
        }

        Ok(CheckState::Checking {
            roles: next,
            remaining,
        })
    }

    /// Run transitions until a terminal state is reached.
    pub async fn run(mut self, roles: ValueSet, permissions: ValueSet) -> StoreResult<bool> {
        let mut state = CheckState::start(roles, permissions);
        while !state.is_terminal() {
            state = self.step(state).await?;
        }
        Ok(state == CheckState::Allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acl_store::MemoryStore;

    fn set(values: &[&str]) -> ValueSet {
        values.iter().map(|v| v.to_string()).collect()
    }

    async fn fixture() -> MemoryStore {
        let store = MemoryStore::new();
        let mut batch = store.begin();
        store.add(&mut batch, Bucket::Parents, "editor", set(&["member"]));
        store.add(&mut batch, Bucket::Parents, "member", set(&["guest"]));
        store.add(&mut batch, Bucket::allows("blogs"), "guest", set(&["view"]));
        store.add(&mut batch, Bucket::allows("blogs"), "member", set(&["comment"]));
        store.add(&mut batch, Bucket::allows("blogs"), "editor", set(&["edit"]));
        store.add(&mut batch, Bucket::allows("blogs"), "root", set(&["*"]));
        store.end(batch).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_permissions_split_across_generations() {
        let store = fixture().await;

        let allowed = PermissionCheck::new(&store, "blogs")
            .run(set(&["editor"]), set(&["edit", "comment", "view"]))
            .await
            .unwrap();
        assert!(allowed);
    }

    #[tokio::test]
    async fn test_missing_permission_denied() {
        let store = fixture().await;

        let allowed = PermissionCheck::new(&store, "blogs")
            .run(set(&["member"]), set(&["view", "edit"]))
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_wildcard_stops_immediately() {
        let store = fixture().await;
        let mut check = PermissionCheck::new(&store, "blogs");

        let state = CheckState::start(set(&["root"]), set(&["anything", "else"]));
        let next = check.step(state).await.unwrap();
        assert_eq!(next, CheckState::Allowed);
    }

    #[tokio::test]
    async fn test_step_advances_one_generation() {
        let store = fixture().await;
        let mut check = PermissionCheck::new(&store, "blogs");

        let state = CheckState::start(set(&["editor"]), set(&["edit", "view"]));
        let next = check.step(state).await.unwrap();
        assert_eq!(
            next,
            CheckState::Checking {
                roles: set(&["member"]),
                remaining: set(&["view"]),
            }
        );
    }

    #[tokio::test]
    async fn test_terminal_states_are_stable() {
        let store = fixture().await;
        let mut check = PermissionCheck::new(&store, "blogs");

        assert_eq!(check.step(CheckState::Denied).await.unwrap(), CheckState::Denied);
        assert_eq!(check.step(CheckState::Allowed).await.unwrap(), CheckState::Allowed);
    }

    #[tokio::test]
    async fn test_unknown_resource_denied() {
        let store = fixture().await;

        let allowed = PermissionCheck::new(&store, "wiki")
            .run(set(&["editor"]), set(&["view"]))
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_cycle_denies_instead_of_looping() {
        let store = MemoryStore::new();
        let mut batch = store.begin();
        store.add(&mut batch, Bucket::Parents, "a", set(&["b"]));
        store.add(&mut batch, Bucket::Parents, "b", set(&["a"]));
        store.add(&mut batch, Bucket::allows("blogs"), "b", set(&["view"]));
        store.end(batch).await.unwrap();

        let denied = PermissionCheck::new(&store, "blogs")
            .run(set(&["a"]), set(&["delete"]))
            .await
            .unwrap();
        assert!(!denied);

        let allowed = PermissionCheck::new(&store, "blogs")
            .run(set(&["a"]), set(&["view"]))
            .await
            .unwrap();
        assert!(allowed);
    }
}
