//! Dispatches inbound frames from the radio stack to the bound cluster that
//! owns their endpoint and cluster id.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::bound_cluster::{BoundCluster, ClusterError};
use crate::infrastructure::transport::{FrameMeta, Transport};

/// What happened to a routed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A bound cluster consumed the frame.
    Handled,
    /// The frame was answered and the reply transmitted.
    Replied,
    /// No cluster is bound to the frame's endpoint and cluster id.
    Unclaimed,
}

/// Registry of bound clusters keyed by `(endpoint, cluster id)`.
pub struct FrameRouter {
    transport: Arc<dyn Transport>,
    clusters: HashMap<(u8, u16), Arc<BoundCluster>>,
}

impl FrameRouter {
    /// `transport` carries replies to unsolicited commands.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            clusters: HashMap::new(),
        }
    }

    /// Registers `cluster`, replacing any previous binding for the same
    /// endpoint and cluster id.
    pub fn register(&mut self, cluster: Arc<BoundCluster>) -> Option<Arc<BoundCluster>> {
        let key = (cluster.endpoint_id(), cluster.spec().id);
        debug!(endpoint = key.0, cluster = %cluster.spec(), "binding cluster");
        self.clusters.insert(key, cluster)
    }

    pub fn get(&self, endpoint_id: u8, cluster_id: u16) -> Option<&Arc<BoundCluster>> {
        self.clusters.get(&(endpoint_id, cluster_id))
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Hands `bytes` to the owning cluster and transmits its reply, if any.
    pub async fn on_frame(&self, meta: FrameMeta, bytes: &[u8]) -> Result<RouteOutcome, ClusterError> {
        let Some(cluster) = self.get(meta.endpoint_id, meta.cluster_id) else {
            warn!(
                endpoint = meta.endpoint_id,
                cluster_id = meta.cluster_id,
                len = bytes.len(),
                "frame for unbound cluster dropped"
            );
            return Ok(RouteOutcome::Unclaimed);
        };

        match cluster.handle_frame(bytes, &meta)? {
            Some(reply) => {
                self.transport
                    .send_frame(meta.endpoint_id, meta.cluster_id, reply)
                    .await?;
                Ok(RouteOutcome::Replied)
            }
            None => Ok(RouteOutcome::Handled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::transport::TransportError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use zcl_core::cluster::{lumi, time};

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(u8, u16, Vec<u8>)>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send_frame(&self, endpoint_id: u8, cluster_id: u16, frame: Vec<u8>) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push((endpoint_id, cluster_id, frame));
            Ok(())
        }
    }

    fn router() -> (FrameRouter, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let mut router = FrameRouter::new(transport.clone());
        router.register(Arc::new(BoundCluster::new(&time::TIME, 1, transport.clone())));
        router.register(Arc::new(BoundCluster::new(&lumi::LUMI, 1, transport.clone())));
        (router, transport)
    }

    #[test]
    fn test_clusters_are_keyed_by_endpoint_and_cluster_id() {
        let (router, _) = router();
        assert_eq!(router.len(), 2);
        assert!(router.get(1, time::CLUSTER_ID).is_some());
        assert!(router.get(2, time::CLUSTER_ID).is_none());
    }

    #[test]
    fn test_registering_same_binding_replaces_previous() {
        let (mut router, transport) = router();
        let previous = router.register(Arc::new(BoundCluster::new(&time::TIME, 1, transport)));
        assert!(previous.is_some());
        assert_eq!(router.len(), 2);
    }

    #[tokio::test]
    async fn test_frame_for_unbound_cluster_is_unclaimed() {
        let (router, transport) = router();
        let outcome = router
            .on_frame(FrameMeta::new(9, time::CLUSTER_ID), &[0x00, 0x01, 0x00])
            .await;
        assert_eq!(outcome, Ok(RouteOutcome::Unclaimed));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_frame_without_handler_is_handled_silently() {
        // Arrange – a read request, but no inbound handler is bound.
        let (router, transport) = router();

        // Act
        let outcome = router
            .on_frame(FrameMeta::new(1, time::CLUSTER_ID), &[0x00, 0x01, 0x00, 0x00, 0x00])
            .await;

        // Assert
        assert_eq!(outcome, Ok(RouteOutcome::Handled));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_frame_surfaces_protocol_error() {
        let (router, _) = router();
        let outcome = router.on_frame(FrameMeta::new(1, lumi::CLUSTER_ID), &[0x03]).await;
        assert!(matches!(outcome, Err(ClusterError::Protocol(_))));
    }
}
