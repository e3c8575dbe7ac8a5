//! A distributed hash table node implementing
//! [Chord](https://pdos.csail.mit.edu/papers/chord:sigcomm01/chord_sigcomm.pdf).
//!
//! Each node owns a position on a modular 32-bit identifier ring and answers
//! one question: which node is responsible for a given identifier? The ring
//! repairs itself as peers join, leave and crash, through three periodic
//! procedures: `stabilize` reconciles each node's successor pointer,
//! `fix_fingers` refreshes the lookup shortcuts and `check_predecessor`
//! probes the node behind us.
//!
//! Notable differences with the paper:
//!
//! 1. The finger table holds 4 entries rather than one per identifier bit.
//!    Lookups stay correct; they take more hops on large rings in exchange
//!    for far fewer refresh RPCs.
//! 2. Each node keeps a short successor list (5 entries) and falls back
//!    through it, then through its fingers, when its successor dies; a node
//!    that exhausts both collapses to a solo ring and stays available.
//! 3. Transport failures never surface to RPC callers: lookups degrade to
//!    best-effort answers and maintenance retries on its next tick.
//!
//! The routing logic in [`RoutingTable`] is transport-free; [`tcp::Node`]
//! couples it to a length-delimited bincode protocol over TCP.

pub mod codec;
pub mod error;
pub mod tcp;

mod core;

pub use crate::core::{
    id::Id,
    message,
    node::NodeRef,
    routing_table::{LookupStep, RoutingTable, FINGER_COUNT, SUCCESSOR_LIST_SIZE},
    traits::Maintenance,
};
