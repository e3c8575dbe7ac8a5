use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

/// Configuration for a TCP Chord node.
#[derive(Debug, Clone)]
pub struct Config {
    /// The address the RPC listener binds to; port 0 picks a free port.
    pub listen_addr: SocketAddr,
    /// The upper bound on any single outbound RPC, connection setup included.
    /// A timed-out call is indistinguishable from an unreachable peer.
    pub rpc_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            rpc_timeout: Duration::from_millis(500),
        }
    }
}
