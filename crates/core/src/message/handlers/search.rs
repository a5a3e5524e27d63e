use async_trait::async_trait;

use crate::error::Error;
use crate::error::Result;
use crate::message::types::NeighbourRequest;
use crate::message::types::NeighbourResponse;
use crate::message::types::Search;
use crate::message::types::SearchResponse;
use crate::message::HandleMsg;
use crate::message::Message;
use crate::message::MessageHandler;
use crate::message::MessagePayload;
use crate::pending::RequestCategory;
use crate::pending::SearchOutcome;
use crate::skipgraph::NodeInfo;
use crate::skipgraph::SGNode;
use crate::skipgraph::SearchAction;
use crate::skipgraph::Side;

impl MessageHandler {
    /// Search for `key`, starting at the local member from its top level.
    pub async fn search(&self, key: u32) -> Result<SearchOutcome> {
        let me = self.my_node()?;
        let level = self.graph.height()?;
        self.search_via(&me.address, key, level).await
    }

    /// Search for `key` starting at the member reachable at `peer`, from `level` down.
    pub async fn search_via(&self, peer: &str, key: u32, level: usize) -> Result<SearchOutcome> {
        let me = self.my_node()?;
        let req = self.requests.search.register(RequestCategory::Search);
        let msg = Message::Search(Search {
            id: req.id,
            originator: me.to_wire(),
            search_key: key,
            level,
            hops: 0,
        });
        tracing::debug!(
            "Node {} searching for key {} via {}",
            me.short_id(),
            key,
            peer
        );
        if let Err(e) = self.transport.send_message(msg, peer).await {
            req.cancel();
            return Err(e);
        }
        req.wait().await
    }

    /// Ask `node` for its `side` neighbour at `level`.
    pub async fn get_neighbour(
        &self,
        node: &SGNode,
        side: Side,
        level: usize,
    ) -> Result<Option<SGNode>> {
        self.request_node(RequestCategory::Neighbour, node, |id| {
            Message::NeighbourRequest(NeighbourRequest { id, side, level })
        })
        .await
    }
}

#[async_trait]
impl HandleMsg<Search> for MessageHandler {
    async fn handle(&self, _ctx: &MessagePayload, msg: &Search) -> Result<()> {
        if !self.accepts("search")? {
            return Ok(());
        }
        let action = self
            .graph
            .with_table(|t| Ok(t.search_step(msg.search_key, msg.level)))?;

        let result = match action {
            SearchAction::Forward { next, level } => {
                let mut forward = msg.clone();
                forward.level = level;
                forward.hops += 1;
                tracing::debug!(
                    "Node {} forwarding search for {} to {} at level {}",
                    self.graph.short_id(),
                    msg.search_key,
                    next,
                    level
                );
                return self
                    .transport
                    .send_message(Message::Search(forward), &next.address)
                    .await;
            }
            SearchAction::Found(node) => node,
            SearchAction::Local => self.my_node()?,
        };
        let resp = Message::SearchResponse(SearchResponse {
            id: msg.id,
            result: result.to_wire(),
            hops: msg.hops,
        });
        self.transport
            .send_message(resp, &msg.originator.address)
            .await
    }
}

#[async_trait]
impl HandleMsg<SearchResponse> for MessageHandler {
    async fn handle(&self, _ctx: &MessagePayload, msg: &SearchResponse) -> Result<()> {
        let Some(entry) = self.requests.search.take(RequestCategory::Search, msg.id) else {
            tracing::warn!("Search response with unknown id {} dropped", msg.id);
            return Ok(());
        };
        let node = SGNode::from_wire(&msg.result)?;
        self.stats
            .lock()
            .map_err(|_| Error::StatsSyncLockError)?
            .record(msg.hops, entry.elapsed());
        tracing::debug!(
            "Search {} resolved to key {} in {} hops",
            msg.id,
            node.key,
            msg.hops
        );
        entry.resolve(SearchOutcome {
            node,
            hops: msg.hops,
        });
        Ok(())
    }
}

#[async_trait]
impl HandleMsg<NeighbourRequest> for MessageHandler {
    async fn handle(&self, ctx: &MessagePayload, msg: &NeighbourRequest) -> Result<()> {
        if !self.accepts("neighbour")? {
            return Ok(());
        }
        let neighbour = self.graph.get(msg.level, msg.side)?;
        let resp = Message::NeighbourResponse(NeighbourResponse {
            id: msg.id,
            found: neighbour.is_some(),
            neighbour: NodeInfo::from_option(neighbour.as_ref()),
        });
        self.transport.send_message(resp, &ctx.sender).await
    }
}

#[async_trait]
impl HandleMsg<NeighbourResponse> for MessageHandler {
    async fn handle(&self, _ctx: &MessagePayload, msg: &NeighbourResponse) -> Result<()> {
        let neighbour = if msg.found {
            msg.neighbour.to_option()?
        } else {
            None
        };
        self.requests
            .nodes
            .resolve(RequestCategory::Neighbour, msg.id, neighbour);
        Ok(())
    }
}
