//! Protocol message types.

use bincode::{Decode, Encode};

use crate::core::{id::Id, node::NodeRef};

pub type Nonce = u128;

/// Chord RPC message variants.
///
/// Every request carries a random nonce that its response echoes, so a caller
/// can match the reply to the call it made over the connection.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Message {
    /// GET_INFO asks a peer for its own descriptor; doubles as a liveness
    /// probe. INFO is the correct response.
    GetInfo(GetInfo),
    /// INFO is the correct response to GET_INFO, it must carry the same NONCE.
    Info(Info),

    /// GET_PREDECESSOR asks a peer for its current predecessor, which may be
    /// absent. PREDECESSOR is the correct response.
    GetPredecessor(GetPredecessor),
    /// PREDECESSOR is the correct response to GET_PREDECESSOR; an absent
    /// predecessor is encoded as a descriptor with an empty ip.
    Predecessor(Predecessor),

    /// GET_SUCCESSOR asks a peer for its current successor, used to walk the
    /// ring when rebuilding a successor list. SUCCESSOR is the correct
    /// response.
    GetSuccessor(GetSuccessor),
    /// SUCCESSOR is the correct response to GET_SUCCESSOR.
    Successor(Successor),

    /// FIND_SUCCESSOR asks a peer to resolve the node responsible for an
    /// identifier; the receiver may forward the lookup across the ring.
    /// FOUND_SUCCESSOR is the correct response.
    FindSuccessor(FindSuccessor),
    /// FOUND_SUCCESSOR is the correct response to FIND_SUCCESSOR.
    FoundSuccessor(FoundSuccessor),

    /// NOTIFY advertises the sender as a predecessor candidate to the
    /// receiver. ACK is the correct response.
    Notify(Notify),
    /// CREATE tells the receiver to bootstrap a singleton ring. ACK is the
    /// correct response.
    Create(Create),
    /// JOIN tells the receiver to join an existing ring through the carried
    /// bootstrap node. ACK is the correct response.
    Join(Join),
    /// ACK is the correct response to NOTIFY, CREATE and JOIN.
    Ack(Ack),
}

impl Message {
    pub fn variant_as_str(&self) -> &'static str {
        match self {
            Message::GetInfo(_) => "get_info",
            Message::Info(_) => "info",
            Message::GetPredecessor(_) => "get_predecessor",
            Message::Predecessor(_) => "predecessor",
            Message::GetSuccessor(_) => "get_successor",
            Message::Successor(_) => "successor",
            Message::FindSuccessor(_) => "find_successor",
            Message::FoundSuccessor(_) => "found_successor",
            Message::Notify(_) => "notify",
            Message::Create(_) => "create",
            Message::Join(_) => "join",
            Message::Ack(_) => "ack",
        }
    }

    pub fn nonce(&self) -> Nonce {
        match self {
            Message::GetInfo(get_info) => get_info.nonce,
            Message::Info(info) => info.nonce,
            Message::GetPredecessor(get_predecessor) => get_predecessor.nonce,
            Message::Predecessor(predecessor) => predecessor.nonce,
            Message::GetSuccessor(get_successor) => get_successor.nonce,
            Message::Successor(successor) => successor.nonce,
            Message::FindSuccessor(find_successor) => find_successor.nonce,
            Message::FoundSuccessor(found_successor) => found_successor.nonce,
            Message::Notify(notify) => notify.nonce,
            Message::Create(create) => create.nonce,
            Message::Join(join) => join.nonce,
            Message::Ack(ack) => ack.nonce,
        }
    }

    pub fn is_response(&self) -> bool {
        matches!(
            self,
            Message::Info(_)
                | Message::Predecessor(_)
                | Message::Successor(_)
                | Message::FoundSuccessor(_)
                | Message::Ack(_)
        )
    }
}

/// The data making up a GET_INFO message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode)]
pub struct GetInfo {
    pub nonce: Nonce,
}

/// The data making up an INFO message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Info {
    pub nonce: Nonce,
    pub node: NodeRef,
}

/// The data making up a GET_PREDECESSOR message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode)]
pub struct GetPredecessor {
    pub nonce: Nonce,
}

/// The data making up a PREDECESSOR message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Predecessor {
    pub nonce: Nonce,
    /// The wire form of the receiver's predecessor; empty ip when absent.
    pub node: NodeRef,
}

/// The data making up a GET_SUCCESSOR message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode)]
pub struct GetSuccessor {
    pub nonce: Nonce,
}

/// The data making up a SUCCESSOR message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Successor {
    pub nonce: Nonce,
    pub node: NodeRef,
}

/// The data making up a FIND_SUCCESSOR message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode)]
pub struct FindSuccessor {
    pub nonce: Nonce,
    pub id: Id,
}

/// The data making up a FOUND_SUCCESSOR message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode)]
pub struct FoundSuccessor {
    pub nonce: Nonce,
    pub node: NodeRef,
}

/// The data making up a NOTIFY message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Notify {
    pub nonce: Nonce,
    pub node: NodeRef,
}

/// The data making up a CREATE message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Create {
    pub nonce: Nonce,
}

/// The data making up a JOIN message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Join {
    pub nonce: Nonce,
    /// The bootstrap node to join through.
    pub node: NodeRef,
}

/// The data making up an ACK message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Ack {
    pub nonce: Nonce,
}
