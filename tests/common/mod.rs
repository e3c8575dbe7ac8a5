use chordium::{
    tcp::{Config, Node},
    Id, Maintenance,
};
use tracing_subscriber::{fmt, EnvFilter};

#[allow(dead_code)]
pub fn enable_tracing() {
    fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

/// Starts a node with the given ring identifier on a free local port.
pub async fn start_node(id: u32) -> Node {
    Node::bind(Id::new(id), Config::default()).await.unwrap()
}

/// Runs one full maintenance round on every node, in the order the periodic
/// driver registers the procedures: predecessor probe, stabilization, finger
/// refresh. Driving the ticks directly keeps the scenarios deterministic.
#[allow(dead_code)]
pub async fn maintenance_round(nodes: &[Node]) {
    for node in nodes {
        node.check_predecessor().await;
        node.stabilize().await;
        node.fix_fingers().await;
    }
}

/// Runs `n` maintenance rounds across the nodes.
#[allow(dead_code)]
pub async fn maintenance_rounds(nodes: &[Node], n: usize) {
    for _ in 0..n {
        maintenance_round(nodes).await;
    }
}
