//! A Chord node over TCP: the RPC surface and the ring maintenance that
//! keeps its routing state honest.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::{
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::{
    codec::MessageCodec,
    core::{
        id::Id,
        message::{Ack, FoundSuccessor, Info, Message, Predecessor, Successor},
        node::NodeRef,
        routing_table::{LookupStep, RoutingTable, FINGER_COUNT, SUCCESSOR_LIST_SIZE},
        traits::Maintenance,
    },
    error::Result,
    tcp::{client, Config},
};

/// A Chord node.
///
/// Binding a node starts its RPC listener; the node answers the full surface
/// immediately but stays passive (maintenance no-ops) until [`create`](Node::create)
/// or [`join`](Node::join) puts it on a ring. Cloning is cheap and all clones
/// share the same routing state.
#[derive(Clone)]
pub struct Node {
    local: NodeRef,
    config: Config,
    rt: Arc<RwLock<RoutingTable>>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Node {
    /// Binds the RPC listener and starts serving.
    pub async fn bind(id: Id, config: Config) -> Result<Self> {
        let listener = TcpListener::bind(config.listen_addr).await?;
        let addr = listener.local_addr()?;
        let local = NodeRef::new(id, addr.ip().to_string(), addr.port());
        info!(id = %local.id, %addr, "listening");

        let node = Self {
            rt: Arc::new(RwLock::new(RoutingTable::new(local.clone()))),
            local,
            config,
            tasks: Arc::new(Mutex::new(Vec::new())),
        };

        let accept = node.clone();
        let handle = tokio::spawn(async move { accept.serve(listener).await });
        node.tasks.lock().push(handle);

        Ok(node)
    }

    /// This node's own descriptor.
    pub fn local_node(&self) -> &NodeRef {
        &self.local
    }

    /// This node's ring identifier.
    pub fn id(&self) -> Id {
        self.local.id
    }

    /// The address the RPC listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        // The ip string was rendered from the bound listener address.
        SocketAddr::new(self.local.ip.parse().expect("bound address"), self.local.port)
    }

    /// A snapshot of the routing state, for observation and assertions.
    pub fn routing_table(&self) -> RoutingTable {
        self.rt.read().clone()
    }

    /// Spawns the periodic maintenance tasks and ties them to this node's
    /// lifetime.
    pub async fn start_maintenance(&self) {
        let handles = self.start_periodic_tasks().await;
        self.tasks.lock().extend(handles);
    }

    /// Stops the listener and any periodic tasks. In-flight connections are
    /// left to finish on their own.
    pub fn shutdown(&self) {
        for handle in self.tasks.lock().drain(..) {
            handle.abort();
        }
    }

    async fn serve(&self, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let node = self.clone();
                    tokio::spawn(async move { node.handle_conn(stream, peer).await });
                }
                Err(e) => {
                    warn!(id = %self.local.id, error = %e, "accept failed");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }

    async fn handle_conn(&self, stream: TcpStream, peer: SocketAddr) {
        let mut framed = Framed::new(stream, MessageCodec::new());

        while let Some(frame) = framed.next().await {
            let request = match frame {
                Ok(message) => message,
                Err(e) => {
                    debug!(id = %self.local.id, %peer, error = %e, "dropping connection");
                    break;
                }
            };

            if let Some(reply) = self.handle_request(request).await {
                if framed.send(reply).await.is_err() {
                    break;
                }
            }
        }
    }

    /// Dispatches one inbound RPC. Handlers never surface errors; every
    /// syntactically valid request gets a reply.
    async fn handle_request(&self, request: Message) -> Option<Message> {
        match request {
            Message::GetInfo(get_info) => Some(Message::Info(Info {
                nonce: get_info.nonce,
                node: self.local.clone(),
            })),
            Message::GetPredecessor(get_predecessor) => {
                let predecessor = self.rt.read().predecessor().cloned();
                Some(Message::Predecessor(Predecessor {
                    nonce: get_predecessor.nonce,
                    node: NodeRef::from_option(predecessor),
                }))
            }
            Message::GetSuccessor(get_successor) => Some(Message::Successor(Successor {
                nonce: get_successor.nonce,
                node: self.rt.read().successor().clone(),
            })),
            Message::FindSuccessor(find_successor) => {
                let node = self.find_successor(find_successor.id).await;
                Some(Message::FoundSuccessor(FoundSuccessor {
                    nonce: find_successor.nonce,
                    node,
                }))
            }
            Message::Notify(notify) => {
                self.notify(notify.node);
                Some(Message::Ack(Ack {
                    nonce: notify.nonce,
                }))
            }
            Message::Create(create) => {
                self.create();
                Some(Message::Ack(Ack {
                    nonce: create.nonce,
                }))
            }
            Message::Join(join) => {
                self.join(join.node).await;
                Some(Message::Ack(Ack { nonce: join.nonce }))
            }
            // Response variants carry no meaning as requests.
            other => {
                debug!(id = %self.local.id, variant = other.variant_as_str(), "ignoring stray message");
                None
            }
        }
    }

    /// Bootstraps a singleton ring on this node.
    pub fn create(&self) {
        self.rt.write().create();
        info!(id = %self.local.id, "created new ring");
    }

    /// Resolves the node responsible for `id`, forwarding across the ring
    /// when this node's own state can't settle the lookup.
    ///
    /// Never fails: an unreachable forwarding target degrades to the current
    /// successor as a best-effort answer.
    pub async fn find_successor(&self, id: Id) -> NodeRef {
        let step = self.rt.read().find_successor_step(id);

        match step {
            LookupStep::Found(node) => node,
            LookupStep::Forward(next) => {
                match client::find_successor(&next, id, self.config.rpc_timeout).await {
                    Ok(node) => node,
                    Err(e) => {
                        debug!(id = %self.local.id, via = %next.id, error = %e, "forwarded lookup failed");
                        self.rt.read().successor().clone()
                    }
                }
            }
        }
    }

    /// Handles an inbound NOTIFY: accepts the sender as predecessor when it
    /// tightens the arc.
    fn notify(&self, n: NodeRef) {
        let id = n.id;
        if self.rt.write().notify(n) {
            debug!(id = %self.local.id, predecessor = %id, "updated predecessor");
        }
    }

    /// Joins an existing ring through `bootstrap`.
    ///
    /// A failed bootstrap lookup degrades to a solo ring; either way the
    /// node comes out joined and maintenance takes over from there.
    pub async fn join(&self, bootstrap: NodeRef) {
        self.rt.write().begin_join();
        info!(id = %self.local.id, via = %bootstrap.id, "joining ring");

        let timeout = self.config.rpc_timeout;
        match client::find_successor(&bootstrap, self.local.id, timeout).await {
            Ok(successor) => {
                debug!(id = %self.local.id, successor = %successor.id, "found successor");
                self.rt.write().adopt_successor(successor.clone());

                // Bootstrap the remaining fingers through the same node; a
                // failed lookup falls back to the fresh successor.
                for i in 1..FINGER_COUNT {
                    let start = self.local.id.finger_start(i);
                    let finger = match client::find_successor(&bootstrap, start, timeout).await {
                        Ok(node) => node,
                        Err(_) => successor.clone(),
                    };
                    self.rt.write().set_finger(i, finger);
                }

                self.rebuild_successor_list().await;
                self.rt.write().set_joined();
                info!(id = %self.local.id, "joined ring");

                // Best effort; stabilize re-advertises us periodically anyway.
                let _ = client::notify(&successor, self.local.clone(), timeout).await;
            }
            Err(e) => {
                warn!(id = %self.local.id, error = %e, "join failed, falling back to a solo ring");
                let mut rt = self.rt.write();
                rt.reset_solo();
                rt.set_joined();
            }
        }
    }

    /// The reconciliation half of stabilize; any error here means the
    /// successor (old or freshly adopted) is unreachable.
    async fn run_stabilize_round(&self, local: &NodeRef) -> Result<()> {
        let timeout = self.config.rpc_timeout;
        let successor = self.rt.read().successor().clone();

        if let Some(x) = client::get_predecessor(&successor, timeout).await? {
            if self.rt.read().should_adopt(&x) {
                info!(id = %local.id, successor = %x.id, "updated successor");
                self.rt.write().adopt_successor(x);
                self.rebuild_successor_list().await;
            }
        }

        // The successor may just have changed; advertise to the current one.
        let successor = self.rt.read().successor().clone();
        client::notify(&successor, local.clone(), timeout).await
    }

    /// Promotes the first live candidate from the successor list, then from
    /// the finger table; with nothing live left, collapses to a solo ring so
    /// the node stays available for future joins.
    async fn recover_successor(&self, failed: NodeRef) {
        let timeout = self.config.rpc_timeout;

        let candidates = self.rt.read().list_recovery_candidates();
        for candidate in candidates {
            if client::get_info(&candidate, timeout).await.is_ok() {
                info!(id = %self.local.id, successor = %candidate.id, "recovered successor from successor list");
                self.rt.write().adopt_successor(candidate);
                self.rebuild_successor_list().await;
                return;
            }
        }

        let candidates = self.rt.read().finger_recovery_candidates(&failed);
        for candidate in candidates {
            if client::get_info(&candidate, timeout).await.is_ok() {
                info!(id = %self.local.id, successor = %candidate.id, "recovered successor from finger table");
                self.rt.write().adopt_successor(candidate);
                self.rebuild_successor_list().await;
                return;
            }
        }

        warn!(id = %self.local.id, "no viable successor, reverting to a solo ring");
        self.rt.write().reset_solo();
    }

    /// Rebuilds the successor list by walking `get_successor` pointers from
    /// the current successor. The walk stops early when the ring closes back
    /// on the successor or on this node; a transport failure truncates the
    /// list silently.
    async fn rebuild_successor_list(&self) {
        let timeout = self.config.rpc_timeout;
        let (local, successor) = {
            let rt = self.rt.read();
            (rt.local().clone(), rt.successor().clone())
        };

        let mut list = vec![successor.clone()];
        let mut current = successor.clone();
        for _ in 1..SUCCESSOR_LIST_SIZE {
            match client::get_successor(&current, timeout).await {
                Ok(next) => {
                    if next == successor || next == local {
                        break;
                    }
                    list.push(next.clone());
                    current = next;
                }
                Err(_) => break,
            }
        }

        self.rt.write().set_successor_list(list);
    }
}

#[async_trait]
impl Maintenance for Node {
    async fn check_predecessor(&self) {
        let predecessor = {
            let rt = self.rt.read();
            if !rt.is_joined() {
                return;
            }
            match rt.predecessor() {
                Some(p) => p.clone(),
                None => return,
            }
        };

        if client::get_info(&predecessor, self.config.rpc_timeout)
            .await
            .is_err()
        {
            warn!(id = %self.local.id, predecessor = %predecessor.id, "predecessor failed, clearing");
            self.rt.write().clear_predecessor();
        }
    }

    async fn stabilize(&self) {
        let (joined, local) = {
            let rt = self.rt.read();
            (rt.is_joined(), rt.local().clone())
        };
        if !joined {
            return;
        }

        match self.run_stabilize_round(&local).await {
            Ok(()) => {
                // Refresh the list every few rounds even without churn, so
                // it tracks nodes joining behind the successor.
                let refresh = self.rt.write().tick_list_refresh();
                if refresh {
                    self.rebuild_successor_list().await;
                }
            }
            Err(e) => {
                let failed = self.rt.read().successor().clone();
                warn!(id = %local.id, successor = %failed.id, error = %e, "successor failed");
                self.recover_successor(failed).await;
            }
        }
    }

    async fn fix_fingers(&self) {
        let work = {
            let mut rt = self.rt.write();
            if !rt.is_joined() || rt.is_solo() {
                return;
            }
            if !rt.tick_finger_refresh() {
                return;
            }
            let i = rt.next_finger();
            let start = rt.finger_target(i);
            (i, start, rt.finger_dispatch(start))
        };

        let (i, start, dispatch) = work;
        match client::find_successor(&dispatch, start, self.config.rpc_timeout).await {
            Ok(new_finger) => {
                let mut rt = self.rt.write();
                if rt.finger(i) != Some(&new_finger) {
                    debug!(id = %self.local.id, finger = i, node = %new_finger.id, "updated finger");
                    rt.set_finger(i, new_finger);
                }
                rt.advance_finger_cursor();
            }
            Err(_) => {
                // Point the finger at the successor until a later pass can
                // resolve the real owner.
                let mut rt = self.rt.write();
                let successor = rt.successor().clone();
                rt.set_finger(i, successor);
                rt.advance_finger_cursor();
            }
        }
    }
}
