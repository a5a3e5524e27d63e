use async_trait::async_trait;

use crate::error::Error;
use crate::error::Result;
use crate::message::types::Buddy;
use crate::message::types::GetLink;
use crate::message::types::SetLink;
use crate::message::HandleMsg;
use crate::message::Message;
use crate::message::MessageHandler;
use crate::message::MessagePayload;
use crate::pending::RequestCategory;
use crate::skipgraph::BuddyAction;
use crate::skipgraph::LinkAction;
use crate::skipgraph::NodeInfo;
use crate::skipgraph::SGNode;
use crate::skipgraph::Side;

impl MessageHandler {
    /// Insert the local member into the graph through `introducer`.
    ///
    /// Levels are linked strictly bottom up. A level is linked on both sides
    /// before the next one starts, and joining stops at the first level where
    /// neither side has a neighbour.
    pub async fn join(&self, introducer: &SGNode) -> Result<()> {
        let me = self.my_node()?;
        let mv_length = me.mv.len();
        tracing::info!(
            "Node {} joining with key {} via {}",
            me.short_id(),
            me.key,
            introducer
        );

        let closest = self
            .search_via(&introducer.address, me.key, mv_length)
            .await?
            .node;
        if closest.key == me.key {
            tracing::warn!(
                "Node {} refuses to join, key {} is taken by {}",
                me.short_id(),
                me.key,
                closest
            );
            return Err(Error::DuplicateKey(me.key));
        }

        if closest.key < me.key {
            if let Some(right) = self.get_neighbour(&closest, Side::Right, 0).await? {
                let linked = self.get_link(&right, Side::Left, 0).await?;
                self.graph.set(0, Side::Right, Some(linked.unwrap_or(right)))?;
            }
            let linked = self.get_link(&closest, Side::Right, 0).await?;
            self.graph.set(0, Side::Left, Some(linked.unwrap_or(closest)))?;
        } else {
            let linked = self.get_link(&closest, Side::Left, 0).await?;
            self.graph.set(0, Side::Right, Some(linked.unwrap_or(closest)))?;
        }

        let mut level = 1;
        while level <= mv_length {
            let bit = me.mv.bit(level - 1);
            let mut linked_any = false;
            for side in [Side::Right, Side::Left] {
                let neighbour = match self.graph.get(level - 1, side)? {
                    Some(below) => {
                        self.buddy_request(&below, level - 1, bit, side.opposite())
                            .await?
                    }
                    None => None,
                };
                linked_any |= neighbour.is_some();
                self.graph.set(level, side, neighbour)?;
            }
            if !linked_any {
                break;
            }
            level += 1;
        }

        let max_level = level.min(mv_length);
        self.graph.with_table(|t| {
            t.set_max_level(max_level);
            Ok(())
        })?;
        tracing::info!(
            "Node {} joined, linked up to level {}",
            me.short_id(),
            max_level
        );
        Ok(())
    }

    /// Ask `node` to take the local member as its `side` neighbour at `level`.
    /// Returns the member that finally linked, which may sit further along the chain.
    pub async fn get_link(
        &self,
        node: &SGNode,
        side: Side,
        level: usize,
    ) -> Result<Option<SGNode>> {
        let originator = self.my_node()?.to_wire();
        self.request_node(RequestCategory::Link, node, |id| {
            Message::GetLink(GetLink {
                id,
                originator,
                side,
                level,
            })
        })
        .await
    }

    /// Walk away from the local member along `level`, starting at `node`, for the
    /// first member whose bit at `level` is `bit`. That member links the local one
    /// at `level + 1`, in its `side` slot.
    pub async fn buddy_request(
        &self,
        node: &SGNode,
        level: usize,
        bit: u8,
        side: Side,
    ) -> Result<Option<SGNode>> {
        let originator = self.my_node()?.to_wire();
        self.request_node(RequestCategory::Buddy, node, |id| {
            Message::Buddy(Buddy {
                id,
                originator,
                level,
                bit,
                side,
            })
        })
        .await
    }

    async fn send_set_link(&self, id: u32, to: &NodeInfo, level: usize) -> Result<()> {
        let me = self.my_node()?;
        let msg = Message::SetLink(SetLink {
            id,
            new_neighbour: me.to_wire(),
            level,
        });
        self.transport.send_message(msg, &to.address).await
    }
}

#[async_trait]
impl HandleMsg<GetLink> for MessageHandler {
    async fn handle(&self, _ctx: &MessagePayload, msg: &GetLink) -> Result<()> {
        if !self.accepts("link")? {
            return Ok(());
        }
        let originator = SGNode::from_wire(&msg.originator)?;
        let action = self
            .graph
            .with_table(|t| t.change_neighbour(&originator, msg.side, msg.level))?;
        match action {
            LinkAction::Forward(next) => {
                tracing::debug!(
                    "Node {} forwarding link of {} to {}",
                    self.graph.short_id(),
                    originator,
                    next
                );
                self.transport
                    .send_message(Message::GetLink(msg.clone()), &next.address)
                    .await
            }
            LinkAction::Link => self.send_set_link(msg.id, &msg.originator, msg.level).await,
        }
    }
}

#[async_trait]
impl HandleMsg<Buddy> for MessageHandler {
    async fn handle(&self, _ctx: &MessagePayload, msg: &Buddy) -> Result<()> {
        if !self.accepts("buddy")? {
            return Ok(());
        }
        let originator = SGNode::from_wire(&msg.originator)?;
        let action = self
            .graph
            .with_table(|t| t.buddy_step(&originator, msg.level, msg.bit, msg.side))?;
        match action {
            BuddyAction::Link(LinkAction::Link) => {
                self.send_set_link(msg.id, &msg.originator, msg.level + 1)
                    .await
            }
            BuddyAction::Link(LinkAction::Forward(next)) => {
                let link = Message::GetLink(GetLink {
                    id: msg.id,
                    originator: msg.originator.clone(),
                    side: msg.side,
                    level: msg.level + 1,
                });
                self.transport.send_message(link, &next.address).await
            }
            BuddyAction::Forward(next) => {
                self.transport
                    .send_message(Message::Buddy(msg.clone()), &next.address)
                    .await
            }
            BuddyAction::Exhausted => {
                let msg = Message::SetLink(SetLink {
                    id: msg.id,
                    new_neighbour: NodeInfo::empty(),
                    level: msg.level + 1,
                });
                self.transport
                    .send_message(msg, &originator.address)
                    .await
            }
        }
    }
}

#[async_trait]
impl HandleMsg<SetLink> for MessageHandler {
    async fn handle(&self, _ctx: &MessagePayload, msg: &SetLink) -> Result<()> {
        let neighbour = msg.new_neighbour.to_option()?;
        // a buddy chain ends with a link request, both answer with SetLink
        let entry = self
            .requests
            .nodes
            .take(RequestCategory::Link, msg.id)
            .or_else(|| self.requests.nodes.take(RequestCategory::Buddy, msg.id));
        match entry {
            Some(entry) => {
                entry.resolve(neighbour);
            }
            None => tracing::warn!("SetLink with unknown id {} dropped", msg.id),
        }
        Ok(())
    }
}
