use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use skipnet_transport::core::callback::TransportCallback;

use crate::message::HandleMsg;
use crate::message::Message;
use crate::message::MessageHandler;
use crate::message::MessagePayload;
use crate::skipgraph::DiscoveryCache;
use crate::skipgraph::NodeInfo;
use crate::skipgraph::SGNode;
use crate::skipgraph::SkipGraph;

type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// [InnerSwarmCallback] is installed on the transport of a swarm.
/// It decodes payloads and dispatches them to the [MessageHandler], and
/// exchanges node info on introductions.
pub struct InnerSwarmCallback {
    message_handler: MessageHandler,
    graph: Arc<SkipGraph>,
    discovery: Arc<DiscoveryCache>,
}

impl InnerSwarmCallback {
    /// Create a new [InnerSwarmCallback] dispatching to `message_handler`.
    pub fn new(
        message_handler: MessageHandler,
        graph: Arc<SkipGraph>,
        discovery: Arc<DiscoveryCache>,
    ) -> Self {
        Self {
            message_handler,
            graph,
            discovery,
        }
    }
}

async fn handle_payload(
    handler: &MessageHandler,
    payload: &MessagePayload,
) -> crate::error::Result<()> {
    match &payload.data {
        Message::Search(ref msg) => handler.handle(payload, msg).await,
        Message::SearchResponse(ref msg) => handler.handle(payload, msg).await,
        Message::NeighbourRequest(ref msg) => handler.handle(payload, msg).await,
        Message::NeighbourResponse(ref msg) => handler.handle(payload, msg).await,
        Message::GetLink(ref msg) => handler.handle(payload, msg).await,
        Message::SetLink(ref msg) => handler.handle(payload, msg).await,
        Message::Buddy(ref msg) => handler.handle(payload, msg).await,
        Message::Delete(ref msg) => handler.handle(payload, msg).await,
        Message::NoNeighbour(ref msg) => handler.handle(payload, msg).await,
        Message::FindNewNeighbour(ref msg) => handler.handle(payload, msg).await,
        Message::FoundNewNeighbour(ref msg) => handler.handle(payload, msg).await,
        Message::ConfirmDelete(ref msg) => handler.handle(payload, msg).await,
        Message::SetNeighbourNil(ref msg) => handler.handle(payload, msg).await,
    }
}

#[async_trait]
impl TransportCallback for InnerSwarmCallback {
    async fn on_message(&self, peer: &str, msg: &Bytes) -> Result<(), CallbackError> {
        let payload = MessagePayload::from_bincode(msg)?;
        tracing::trace!("Received {} from {}", payload.data, peer);

        // handlers wait on responses delivered through this same callback
        let handler = self.message_handler.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_payload(&handler, &payload).await {
                tracing::error!("Failed on handling {}: {}", payload.data, e);
            }
        });
        Ok(())
    }

    async fn introduction_extra_bytes(&self) -> Bytes {
        let me = match self.graph.my_node() {
            Ok(me) => me,
            Err(_) => return Bytes::new(),
        };
        match bincode::serialize(&me.to_wire()) {
            Ok(data) => Bytes::from(data),
            Err(e) => {
                tracing::warn!("Failed to encode node info of {}: {}", me, e);
                Bytes::new()
            }
        }
    }

    async fn on_introduction(&self, peer: &str, extra_bytes: &Bytes) -> Result<(), CallbackError> {
        if extra_bytes.is_empty() {
            tracing::debug!("Peer {} introduced itself without node info", peer);
            return Ok(());
        }
        let info: NodeInfo = bincode::deserialize(extra_bytes)?;
        let node = SGNode::from_wire(&info)?;
        tracing::debug!("Learned node info {} of peer {}", node, peer);
        self.discovery.record_peer_info(peer, node)?;
        Ok(())
    }
}
