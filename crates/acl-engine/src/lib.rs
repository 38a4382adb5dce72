//! # ACL Engine
//!
//! Role-based access control with inherited roles, kept in a pluggable
//! bucket store (see the `acl-store` crate).
//!
//! ## Overview
//!
//! The engine answers three kinds of questions:
//! - **Checks**: is user U allowed permissions P on resource R?
//! - **Permissions**: what can user U do on resources R1..Rn?
//! - **Resources**: what resources can roles R touch, and with what?
//!
//! ## Model
//!
//! ```text
//! user ──has──▶ role ──inherits──▶ parent role ──inherits──▶ ...
//!                 │                     │
//!                 └──granted on──▶ resource: {permissions | *}
//! ```
//!
//! - Users, roles, resources and permissions are plain strings
//! - A role inherits every grant of its parents, transitively
//! - The permission `*` grants every permission on a resource
//! - Nothing needs to be created up front; an entity exists as soon as a
//!   grant, membership or parent edge mentions it
//!
//! ## Usage
//!
//! ```rust,no_run
//! use acl_engine::Acl;
//! use acl_store::MemoryStore;
//! use std::sync::Arc;
//!
//! async fn example() -> acl_engine::AclResult<()> {
//!     let acl = Acl::new(Arc::new(MemoryStore::new()));
//!
//!     // Shape the role graph
//!     acl.allow("guest", "blogs", "view").await?;
//!     acl.allow("member", "blogs", ["edit", "comment"]).await?;
//!     acl.add_role_parents("member", "guest").await?;
//!     acl.add_user_roles("joed", "member").await?;
//!
//!     // Ask questions
//!     assert!(acl.is_allowed("joed", "blogs", ["view", "edit"]).await?);
//!     let perms = acl.allowed_permissions("joed", ["blogs", "forums"]).await?;
//!     assert_eq!(perms["blogs"].len(), 3);
//!     assert!(perms["forums"].is_empty());
//!     Ok(())
//! }
//! ```
//!
//! ## Consistency
//!
//! The engine offers no isolation between calls and no atomicity across
//! the round trips of a single call. See [`mutation`] for the two
//! operations with known race windows.

pub mod acl;
pub mod checker;
pub mod error;
pub mod hierarchy;
pub mod mutation;
pub mod options;
pub mod rules;
pub mod values;

// Re-export main types for convenience
pub use acl::Acl;
pub use checker::{CheckState, PermissionCheck};
pub use error::{AclError, AclResult};
pub use options::AclOptions;
pub use rules::{AllowRule, ResourceGrant};
pub use values::{IntoValues, RESERVED_NAMES, WILDCARD};
