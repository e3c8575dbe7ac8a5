use bincode::{Decode, Encode};

use crate::core::id::Id;

/// A peer descriptor: a ring identifier plus the address its RPC listener is
/// reachable at.
///
/// Two descriptors are equal when their identifiers are equal; the address is
/// transport metadata and takes no part in ring logic.
///
/// On the wire an absent peer is a descriptor with an empty `ip` (the reply to
/// `get_predecessor` may be absent). Inside the crate absence is always
/// `Option<NodeRef>`; [`NodeRef::into_option`] and [`NodeRef::from_option`]
/// translate at the codec boundary.
#[derive(Debug, Default, Clone, Encode, Decode)]
pub struct NodeRef {
    pub id: Id,
    pub ip: String,
    pub port: u16,
}

impl NodeRef {
    pub fn new(id: Id, ip: impl Into<String>, port: u16) -> Self {
        Self {
            id,
            ip: ip.into(),
            port,
        }
    }

    /// The address string of the peer's listener, suitable for connecting.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    /// Decodes the wire representation into an optional descriptor.
    pub fn into_option(self) -> Option<NodeRef> {
        if self.ip.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    /// Encodes an optional descriptor into the wire representation.
    pub fn from_option(node: Option<NodeRef>) -> NodeRef {
        node.unwrap_or_default()
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NodeRef {}
