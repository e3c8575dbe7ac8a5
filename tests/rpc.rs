//! The inbound RPC surface, exercised over the wire with the one-shot
//! client.

use std::time::Duration;

use chordium::{
    error::Error,
    message::{Ack, Message},
    tcp::client,
    Id, NodeRef,
};

mod common;
#[allow(unused_imports)]
use crate::common::{enable_tracing, start_node};

const RPC_TIMEOUT: Duration = Duration::from_millis(500);

#[tokio::test]
async fn read_surface_on_a_solo_node() {
    let a = start_node(10).await;
    a.create();
    let target = a.local_node().clone();

    let info = client::get_info(&target, RPC_TIMEOUT).await.unwrap();
    assert_eq!(info.id, Id::new(10));
    assert_eq!(info.port, a.local_addr().port());

    // A fresh singleton ring has no predecessor and is its own successor.
    assert!(client::get_predecessor(&target, RPC_TIMEOUT)
        .await
        .unwrap()
        .is_none());
    assert_eq!(
        client::get_successor(&target, RPC_TIMEOUT).await.unwrap().id,
        Id::new(10)
    );
    assert_eq!(
        client::find_successor(&target, Id::new(999), RPC_TIMEOUT)
            .await
            .unwrap()
            .id,
        Id::new(10)
    );

    a.shutdown();
}

#[tokio::test]
async fn notify_installs_a_predecessor() {
    let a = start_node(20).await;
    a.create();
    let target = a.local_node().clone();

    // The handler takes any syntactically valid descriptor at its word; the
    // address is only probed later by the predecessor monitor.
    let candidate = NodeRef::new(Id::new(10), "127.0.0.1", 1);
    client::notify(&target, candidate, RPC_TIMEOUT).await.unwrap();

    assert_eq!(
        client::get_predecessor(&target, RPC_TIMEOUT)
            .await
            .unwrap()
            .map(|p| p.id),
        Some(Id::new(10))
    );

    a.shutdown();
}

#[tokio::test]
async fn create_and_join_via_rpc() {
    let a = start_node(10).await;
    let b = start_node(20).await;

    client::create(a.local_node(), RPC_TIMEOUT).await.unwrap();
    assert!(a.routing_table().is_joined());

    // The join handler runs the whole join before acknowledging, so give it
    // room for its own lookups.
    client::join(
        b.local_node(),
        a.local_node().clone(),
        Duration::from_secs(5),
    )
    .await
    .unwrap();

    let b_rt = b.routing_table();
    assert!(b_rt.is_joined());
    assert_eq!(b_rt.successor().id, Id::new(10));
    // The join's closing notify already advertised b.
    assert_eq!(
        a.routing_table().predecessor().map(|p| p.id),
        Some(Id::new(20))
    );

    a.shutdown();
    b.shutdown();
}

#[tokio::test]
async fn join_through_a_dead_bootstrap_degrades_to_solo() {
    let b = start_node(20).await;

    // Nothing listens on port 1.
    let bootstrap = NodeRef::new(Id::new(10), "127.0.0.1", 1);
    b.join(bootstrap).await;

    let b_rt = b.routing_table();
    assert!(b_rt.is_joined());
    assert_eq!(b_rt.successor(), b_rt.local());
    assert_eq!(b_rt.successor_list(), &[b_rt.local().clone()]);

    b.shutdown();
}

#[tokio::test]
async fn stray_response_gets_no_reply() {
    let a = start_node(10).await;
    a.create();

    // A response variant sent as a request is dropped on the floor; the
    // caller only sees its own timeout.
    let result = client::call(
        a.local_node(),
        Message::Ack(Ack { nonce: 1 }),
        Duration::from_millis(200),
    )
    .await;

    assert!(matches!(result, Err(Error::Timeout)));

    a.shutdown();
}

#[tokio::test]
async fn unreachable_peer_fails_to_connect() {
    let ghost = NodeRef::new(Id::new(99), "127.0.0.1", 1);

    let result = client::get_info(&ghost, RPC_TIMEOUT).await;
    assert!(matches!(
        result,
        Err(Error::Connect { .. }) | Err(Error::Timeout)
    ));
}
