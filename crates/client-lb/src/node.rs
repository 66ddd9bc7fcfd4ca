//! The `Node` type identifying a backend.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// A backend endpoint.
///
/// The only thing the balancer requires of a `Node` is a stable string
/// representation that is unique within a membership snapshot: equality,
/// hashing into the membership map, and strategy indexing are all defined
/// in terms of [`Node::key`].
pub trait Node: fmt::Debug + Send + Sync + 'static {
    /// A stable key identifying this node, unique within a snapshot.
    fn key(&self) -> String;
}

/// Convenience alias for the trait-object form nodes are stored and passed
/// around as once they enter a [`crate::group::Group`] or
/// [`crate::strategy::Strategy`].
pub type SharedNode = Arc<dyn Node>;

impl Node for IpAddr {
    fn key(&self) -> String {
        self.to_string()
    }
}

impl Node for SocketAddr {
    fn key(&self) -> String {
        self.to_string()
    }
}

/// A `Node` backed by an arbitrary string, for callers whose backend
/// identity is already just an address or opaque id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringNode(pub String);

impl StringNode {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for StringNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Node for StringNode {
    fn key(&self) -> String {
        self.0.clone()
    }
}
