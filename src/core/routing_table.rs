//! Core routing state of a Chord node.
//!
//! Everything in this module is transport-free: the state transitions and
//! lookup decisions live here, the remote calls they imply live in the
//! transport layer. Where a decision needs a remote hop, the method returns
//! the peer to contact instead of contacting it.

use crate::core::{id::Id, node::NodeRef};

/// Number of finger-table entries.
///
/// Truncated well below the 32 bits of the identifier space; lookups stay
/// correct, they just take more hops on large rings.
pub const FINGER_COUNT: usize = 4;

/// Maximum successor-list length.
pub const SUCCESSOR_LIST_SIZE: usize = 5;

// Both maintenance throttles fire once every three ticks.
const REFRESH_PERIOD: u8 = 3;

/// The local outcome of a successor lookup.
///
/// Routing either settles on this node's knowledge or must continue on a
/// closer peer; the remote hop is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStep {
    /// The responsible node is already known.
    Found(NodeRef),
    /// The lookup continues on this peer.
    Forward(NodeRef),
}

/// Routing state of a single Chord node.
///
/// The state a node keeps about the ring: its predecessor, its successor, a
/// short successor list for failover and a finger table of exponentially
/// spaced shortcuts. Between churn events, stabilization drives this state
/// towards the ring invariants: the successor is the next live identifier
/// clockwise, the predecessor the previous one, the head of the successor
/// list and finger zero both mirror the successor.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    // The node's own descriptor, fixed for the lifetime of the process.
    local: NodeRef,
    predecessor: Option<NodeRef>,
    successor: NodeRef,
    successor_list: Vec<NodeRef>,
    fingers: [Option<NodeRef>; FINGER_COUNT],
    // Round-robin cursor for finger refresh.
    next_finger: usize,
    joined: bool,
    list_refresh_ticks: u8,
    finger_refresh_ticks: u8,
}

impl RoutingTable {
    /// Creates the routing state of an unjoined node pointing at itself.
    pub fn new(local: NodeRef) -> Self {
        let mut fingers: [Option<NodeRef>; FINGER_COUNT] = std::array::from_fn(|_| None);
        fingers[0] = Some(local.clone());

        Self {
            successor: local.clone(),
            local,
            predecessor: None,
            successor_list: Vec::new(),
            fingers,
            next_finger: 0,
            joined: false,
            list_refresh_ticks: 0,
            finger_refresh_ticks: 0,
        }
    }

    pub fn local(&self) -> &NodeRef {
        &self.local
    }

    pub fn predecessor(&self) -> Option<&NodeRef> {
        self.predecessor.as_ref()
    }

    pub fn successor(&self) -> &NodeRef {
        &self.successor
    }

    pub fn successor_list(&self) -> &[NodeRef] {
        &self.successor_list
    }

    pub fn finger(&self, i: usize) -> Option<&NodeRef> {
        self.fingers[i].as_ref()
    }

    pub fn next_finger(&self) -> usize {
        self.next_finger
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    /// Returns whether this node is its own successor.
    pub fn is_solo(&self) -> bool {
        self.successor == self.local
    }

    /// Bootstraps a singleton ring: no predecessor, everything else points at
    /// this node.
    pub fn create(&mut self) {
        self.predecessor = None;
        self.reset_solo();
        self.joined = true;
    }

    /// Points the successor, successor list and every finger back at this
    /// node. The joined flag is left alone; a collapsed node keeps serving.
    pub fn reset_solo(&mut self) {
        self.successor = self.local.clone();
        self.successor_list = vec![self.local.clone()];
        for finger in self.fingers.iter_mut() {
            *finger = Some(self.local.clone());
        }
    }

    /// Enters the joining state: predecessor cleared, maintenance suspended
    /// until [`set_joined`](Self::set_joined).
    pub fn begin_join(&mut self) {
        self.predecessor = None;
        self.joined = false;
    }

    pub fn set_joined(&mut self) {
        self.joined = true;
    }

    /// Installs a new successor and mirrors it into finger zero.
    pub fn adopt_successor(&mut self, node: NodeRef) {
        self.fingers[0] = Some(node.clone());
        self.successor = node;
    }

    /// Returns whether `x` (the successor's reported predecessor) should
    /// replace the current successor: it must not be this node, and must
    /// either break a self-loop or fall on the arc between this node and the
    /// current successor.
    pub fn should_adopt(&self, x: &NodeRef) -> bool {
        if x.id == self.local.id {
            return false;
        }
        self.is_solo() || x.id.in_range(self.local.id, self.successor.id)
    }

    /// Accepts `n` as predecessor when none is known or `n` tightens the arc
    /// to this node. Returns whether the predecessor changed.
    pub fn notify(&mut self, n: NodeRef) -> bool {
        let accept = match &self.predecessor {
            None => true,
            Some(p) => n.id.in_range(p.id, self.local.id),
        };

        if accept {
            self.predecessor = Some(n);
        }

        accept
    }

    pub fn clear_predecessor(&mut self) {
        self.predecessor = None;
    }

    /// Replaces the successor list wholesale. The head is expected to be the
    /// successor the rebuild started from.
    pub fn set_successor_list(&mut self, list: Vec<NodeRef>) {
        debug_assert!(!list.is_empty());
        debug_assert!(list.len() <= SUCCESSOR_LIST_SIZE);
        self.successor_list = list;
    }

    pub fn set_finger(&mut self, i: usize, node: NodeRef) {
        self.fingers[i] = Some(node);
    }

    /// The ring identifier finger `i` is responsible for tracking.
    pub fn finger_target(&self, i: usize) -> Id {
        self.local.id.finger_start(i)
    }

    /// The highest finger strictly between this node and `id`, used to route
    /// a lookup as far clockwise as possible without overshooting. Falls back
    /// to this node when no finger qualifies.
    pub fn closest_preceding_node(&self, id: Id) -> NodeRef {
        for finger in self.fingers.iter().rev().flatten() {
            if finger.id != self.local.id && finger.id.in_open_range(self.local.id, id) {
                return finger.clone();
            }
        }

        self.local.clone()
    }

    /// The local portion of `find_successor`.
    ///
    /// Resolves the lookup from this node's own state when possible,
    /// otherwise names the peer to forward it to. The forwarded call may
    /// still fail; the caller answers with the current successor in that
    /// case.
    pub fn find_successor_step(&self, id: Id) -> LookupStep {
        // A solo ring answers everything.
        if self.is_solo() {
            return LookupStep::Found(self.local.clone());
        }

        // This node owns the arc from its predecessor to itself.
        if let Some(p) = &self.predecessor {
            if id.in_range(p.id, self.local.id) {
                return LookupStep::Found(self.local.clone());
            }
        }

        // The successor owns the arc from this node to itself.
        if id.in_range(self.local.id, self.successor.id) {
            return LookupStep::Found(self.successor.clone());
        }

        let n = self.closest_preceding_node(id);
        if n == self.local {
            // No finger gets closer; the successor is the best answer we
            // have without calling ourselves.
            LookupStep::Found(self.successor.clone())
        } else {
            LookupStep::Forward(n)
        }
    }

    /// The node to send a finger-refresh lookup through: the highest finger
    /// on the arc to the target, else the successor.
    pub fn finger_dispatch(&self, start: Id) -> NodeRef {
        for finger in self.fingers.iter().rev().flatten() {
            if finger.id.in_range(self.local.id, start) {
                return finger.clone();
            }
        }

        self.successor.clone()
    }

    /// Successor-list entries eligible to replace a failed successor, in
    /// preference order. The head is the failed successor itself and is
    /// skipped.
    pub fn list_recovery_candidates(&self) -> Vec<NodeRef> {
        self.successor_list.iter().skip(1).cloned().collect()
    }

    /// Finger entries eligible to replace a failed successor: anything known
    /// that is neither this node nor the failed successor.
    pub fn finger_recovery_candidates(&self, failed: &NodeRef) -> Vec<NodeRef> {
        self.fingers
            .iter()
            .flatten()
            .filter(|f| f.id != self.local.id && f.id != failed.id)
            .cloned()
            .collect()
    }

    /// Ticks the successor-list refresh counter; returns `true` once every
    /// three calls.
    pub fn tick_list_refresh(&mut self) -> bool {
        self.list_refresh_ticks += 1;
        if self.list_refresh_ticks >= REFRESH_PERIOD {
            self.list_refresh_ticks = 0;
            return true;
        }

        false
    }

    /// Ticks the finger-refresh throttle; returns `true` once every three
    /// calls. Skipped ticks leave the round-robin cursor where it is.
    pub fn tick_finger_refresh(&mut self) -> bool {
        self.finger_refresh_ticks += 1;
        if self.finger_refresh_ticks >= REFRESH_PERIOD {
            self.finger_refresh_ticks = 0;
            return true;
        }

        false
    }

    /// Advances the round-robin finger cursor after a refresh attempt,
    /// successful or not.
    pub fn advance_finger_cursor(&mut self) {
        self.next_finger = (self.next_finger + 1) % FINGER_COUNT;
    }
}
