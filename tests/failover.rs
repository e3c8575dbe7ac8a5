//! Failure handling: successor loss, total isolation and the predecessor
//! monitor.

use chordium::{Id, Maintenance, FINGER_COUNT};

mod common;
#[allow(unused_imports)]
use crate::common::{enable_tracing, maintenance_rounds, start_node};

#[tokio::test]
async fn successor_failure_recovers_through_the_list() {
    let a = start_node(10).await;
    a.create();

    let b = start_node(20).await;
    b.join(a.local_node().clone()).await;
    maintenance_rounds(&[a.clone(), b.clone()], 2).await;

    let c = start_node(30).await;
    c.join(a.local_node().clone()).await;
    maintenance_rounds(&[a.clone(), b.clone(), c.clone()], 6).await;

    // The list must reach past the doomed successor for the recovery to
    // have a candidate.
    let a_rt = a.routing_table();
    assert_eq!(a_rt.successor().id, Id::new(20));
    assert_eq!(
        a_rt.successor_list().iter().map(|n| n.id).collect::<Vec<_>>(),
        vec![Id::new(20), Id::new(30)]
    );

    b.shutdown();

    a.stabilize().await;

    let a_rt = a.routing_table();
    assert_eq!(a_rt.successor().id, Id::new(30));
    assert_eq!(a_rt.finger(0).map(|f| f.id), Some(Id::new(30)));
    assert_eq!(a_rt.successor_list()[0].id, Id::new(30));
    assert!(a_rt.is_joined());

    a.shutdown();
    c.shutdown();
}

#[tokio::test]
async fn total_isolation_collapses_to_a_solo_ring() {
    let a = start_node(10).await;
    a.create();

    let b = start_node(20).await;
    b.join(a.local_node().clone()).await;
    maintenance_rounds(&[a.clone(), b.clone()], 6).await;

    // Everything a knows about the ring points at b.
    assert_eq!(a.routing_table().successor().id, Id::new(20));

    b.shutdown();

    a.stabilize().await;

    // The successor list held nothing past b and every finger was either b
    // or a itself, so a reverts to a singleton ring and keeps serving.
    let a_rt = a.routing_table();
    assert!(a_rt.is_joined());
    assert_eq!(a_rt.successor(), a_rt.local());
    assert_eq!(a_rt.successor_list(), &[a_rt.local().clone()]);
    for i in 0..FINGER_COUNT {
        assert_eq!(a_rt.finger(i), Some(a_rt.local()));
    }

    assert_eq!(a.find_successor(Id::new(999)).await.id, Id::new(10));

    a.shutdown();
}

#[tokio::test]
async fn predecessor_monitor_clears_a_dead_predecessor() {
    let a = start_node(10).await;
    a.create();

    let b = start_node(20).await;
    b.join(a.local_node().clone()).await;
    maintenance_rounds(&[a.clone(), b.clone()], 2).await;

    assert_eq!(a.routing_table().predecessor().map(|p| p.id), Some(Id::new(20)));

    b.shutdown();

    a.check_predecessor().await;

    // The predecessor is cleared and nothing else moves; the next notify
    // from a live node repopulates it.
    let a_rt = a.routing_table();
    assert!(a_rt.predecessor().is_none());
    assert_eq!(a_rt.successor().id, Id::new(20));
    assert!(a_rt.is_joined());

    a.shutdown();
}
