//! Description identities for host-framework reporting.
//!
//! A [`Description`] is the identity object the host framework correlates
//! start/finish/failure notifications by. Every freshly built description gets
//! a distinct id; clones share it. Equality and hashing are id equality only,
//! so a memoized description compares equal to its own clones and to nothing
//! else, even when two descriptions carry the same display name.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A node in the host framework's description tree.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Description {
    id: u64,
    display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    leaf: bool,
    children: Vec<Description>,
}

impl Description {
    /// Create a leaf description for a single spec.
    pub fn spec(display_name: impl Into<String>) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            display_name: display_name.into(),
            host: None,
            leaf: true,
            children: Vec::new(),
        }
    }

    /// Create a leaf description that records the owning host suite, the way
    /// host frameworks qualify test identities with their declaring class.
    pub fn spec_for_host(host: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            display_name: display_name.into(),
            host: Some(host.into()),
            leaf: true,
            children: Vec::new(),
        }
    }

    /// Create a suite description with ordered children.
    pub fn suite(display_name: impl Into<String>, children: Vec<Description>) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            display_name: display_name.into(),
            host: None,
            leaf: false,
            children,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The host suite this identity was computed for, if it is a leaf.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn children(&self) -> &[Description] {
        &self.children
    }

    /// Whether this identity describes a single spec. A childless suite is
    /// not a leaf; it just has nothing under it.
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// The identity id. Stable across clones of the same description.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for Description {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Description {}

impl std::hash::Hash for Description {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity() {
        let desc = Description::spec("adds");
        let clone = desc.clone();
        assert_eq!(desc, clone);
        assert_eq!(desc.id(), clone.id());
    }

    #[test]
    fn same_name_different_identity() {
        let a = Description::spec("adds");
        let b = Description::spec("adds");
        assert_ne!(a, b);
    }

    #[test]
    fn childless_suite_is_not_a_leaf() {
        let suite = Description::suite("Empty", vec![]);
        assert!(!suite.is_leaf());
        assert!(Description::spec("adds").is_leaf());
    }

    #[test]
    fn suite_keeps_child_order() {
        let suite = Description::suite(
            "Math",
            vec![Description::spec("adds"), Description::spec("subtracts")],
        );
        assert_eq!(suite.display_name(), "Math");
        assert!(!suite.is_leaf());
        let names: Vec<_> = suite.children().iter().map(|c| c.display_name()).collect();
        assert_eq!(names, vec!["adds", "subtracts"]);
    }
}
