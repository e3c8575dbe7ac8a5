//! One-shot RPC client.
//!
//! Every call opens its own connection, sends a single request and waits for
//! the matching reply; the connection is dropped on every exit path. All
//! calls are bounded by the caller's timeout.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use rand::{thread_rng, Rng};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::{
    codec::MessageCodec,
    core::{
        id::Id,
        message::{
            Create, FindSuccessor, GetInfo, GetPredecessor, GetSuccessor, Join, Message, Notify,
        },
        node::NodeRef,
    },
    error::{Error, Result},
};

/// Sends `request` to `target` and returns the reply carrying the same nonce.
pub async fn call(target: &NodeRef, request: Message, timeout: Duration) -> Result<Message> {
    let addr = target.addr();

    let exchange = async {
        let stream = TcpStream::connect(addr.as_str())
            .await
            .map_err(|source| Error::Connect {
                addr: addr.clone(),
                source,
            })?;
        let mut framed = Framed::new(stream, MessageCodec::new());

        let nonce = request.nonce();
        framed.send(request).await?;

        loop {
            match framed.next().await {
                Some(Ok(reply)) if reply.nonce() == nonce => return Ok(reply),
                // A frame that isn't ours; keep waiting for the real reply.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => return Err(Error::ConnectionClosed),
            }
        }
    };

    match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout),
    }
}

/// Fetches the peer's own descriptor; doubles as a liveness probe.
pub async fn get_info(target: &NodeRef, timeout: Duration) -> Result<NodeRef> {
    let request = Message::GetInfo(GetInfo { nonce: nonce() });

    match call(target, request, timeout).await? {
        Message::Info(info) => Ok(info.node),
        other => Err(Error::UnexpectedReply(other.variant_as_str())),
    }
}

/// Fetches the peer's current predecessor, which may be absent.
pub async fn get_predecessor(target: &NodeRef, timeout: Duration) -> Result<Option<NodeRef>> {
    let request = Message::GetPredecessor(GetPredecessor { nonce: nonce() });

    match call(target, request, timeout).await? {
        Message::Predecessor(predecessor) => Ok(predecessor.node.into_option()),
        other => Err(Error::UnexpectedReply(other.variant_as_str())),
    }
}

/// Fetches the peer's current successor.
pub async fn get_successor(target: &NodeRef, timeout: Duration) -> Result<NodeRef> {
    let request = Message::GetSuccessor(GetSuccessor { nonce: nonce() });

    match call(target, request, timeout).await? {
        Message::Successor(successor) => Ok(successor.node),
        other => Err(Error::UnexpectedReply(other.variant_as_str())),
    }
}

/// Asks the peer to resolve the node responsible for `id`.
pub async fn find_successor(target: &NodeRef, id: Id, timeout: Duration) -> Result<NodeRef> {
    let request = Message::FindSuccessor(FindSuccessor { nonce: nonce(), id });

    match call(target, request, timeout).await? {
        Message::FoundSuccessor(found) => Ok(found.node),
        other => Err(Error::UnexpectedReply(other.variant_as_str())),
    }
}

/// Advertises `node` as a predecessor candidate to the peer.
pub async fn notify(target: &NodeRef, node: NodeRef, timeout: Duration) -> Result<()> {
    let request = Message::Notify(Notify {
        nonce: nonce(),
        node,
    });

    match call(target, request, timeout).await? {
        Message::Ack(_) => Ok(()),
        other => Err(Error::UnexpectedReply(other.variant_as_str())),
    }
}

/// Tells the peer to bootstrap a singleton ring.
pub async fn create(target: &NodeRef, timeout: Duration) -> Result<()> {
    let request = Message::Create(Create { nonce: nonce() });

    match call(target, request, timeout).await? {
        Message::Ack(_) => Ok(()),
        other => Err(Error::UnexpectedReply(other.variant_as_str())),
    }
}

/// Tells the peer to join an existing ring through `bootstrap`.
///
/// The peer performs its whole join procedure before acknowledging, so the
/// timeout should leave room for several of its own RPCs.
pub async fn join(target: &NodeRef, bootstrap: NodeRef, timeout: Duration) -> Result<()> {
    let request = Message::Join(Join {
        nonce: nonce(),
        node: bootstrap,
    });

    match call(target, request, timeout).await? {
        Message::Ack(_) => Ok(()),
        other => Err(Error::UnexpectedReply(other.variant_as_str())),
    }
}

fn nonce() -> u128 {
    thread_rng().gen()
}
