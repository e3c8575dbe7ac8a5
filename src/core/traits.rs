use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

/// A trait driving the periodic ring-maintenance procedures on the
/// implementor.
///
/// The three procedures keep the ring consistent under churn: `stabilize`
/// reconciles the successor pointer with the successor's own view,
/// `fix_fingers` refreshes the finger cache one entry at a time and
/// `check_predecessor` probes the predecessor's liveness. The provided
/// [`start_periodic_tasks`](Maintenance::start_periodic_tasks) method spawns
/// one tokio task per procedure.
#[async_trait]
pub trait Maintenance
where
    Self: Clone + Send + Sync + 'static,
{
    /// The interval between predecessor liveness probes in milliseconds.
    const CHECK_PREDECESSOR_INTERVAL_MS: u64 = 300;
    /// The interval between stabilization rounds in milliseconds.
    const STABILIZE_INTERVAL_MS: u64 = 300;
    /// The interval between finger-refresh ticks in milliseconds.
    const FIX_FINGERS_INTERVAL_MS: u64 = 300;

    /// Probes the predecessor and clears it when it is unreachable.
    async fn check_predecessor(&self);

    /// Reconciles the successor pointer with the successor's own view,
    /// re-advertises this node to it and repairs the pointer when the
    /// successor has failed.
    async fn stabilize(&self);

    /// Refreshes one finger-table entry, round-robin.
    async fn fix_fingers(&self);

    /// Starts the periodic maintenance tasks, returning their handles so the
    /// caller can tie them to the node's lifetime.
    async fn start_periodic_tasks(&self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(3);

        let self_clone = self.clone();
        handles.push(tokio::spawn(async move {
            loop {
                self_clone.check_predecessor().await;
                tokio::time::sleep(Duration::from_millis(Self::CHECK_PREDECESSOR_INTERVAL_MS))
                    .await;
            }
        }));

        let self_clone = self.clone();
        handles.push(tokio::spawn(async move {
            loop {
                self_clone.stabilize().await;
                tokio::time::sleep(Duration::from_millis(Self::STABILIZE_INTERVAL_MS)).await;
            }
        }));

        let self_clone = self.clone();
        handles.push(tokio::spawn(async move {
            loop {
                self_clone.fix_fingers().await;
                tokio::time::sleep(Duration::from_millis(Self::FIX_FINGERS_INTERVAL_MS)).await;
            }
        }));

        handles
    }
}
